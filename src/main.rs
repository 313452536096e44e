use clap::{Parser, Subcommand};
use runstate::{data_dir, PidError, PidRegistry};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "runstate")]
#[command(about = "Track whether this application is running using a PID file")]
struct Cli {
    /// Directory holding the PID file (defaults to the executable's directory)
    #[arg(long, global = true, value_name = "DIR")]
    base_dir: Option<PathBuf>,
    /// Keep the PID file in the per-user application data directory
    #[arg(long, global = true, conflicts_with = "base_dir")]
    data_dir: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the executable path, directory, file and application name
    Info {
        #[arg(long)]
        json: bool,
    },
    /// Print the PID file path
    Path,
    /// Create the PID file for this process
    Create,
    /// Print the PID recorded in the PID file
    Read,
    /// Remove the PID file
    Delete,
    /// Check whether an instance is running, cleaning up stale PID files
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Hold the PID file for a while, refusing to start if already running
    Run {
        #[arg(long, default_value_t = 30)]
        seconds: u64,
    },
}

#[derive(Serialize)]
struct StatusReport {
    running: bool,
    pid: Option<i32>,
    pid_file: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let registry = match build_registry(&cli) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error determining PID directory: {}", e);
            process::exit(1);
        }
    };

    match &cli.command {
        Commands::Info { json } => {
            let info = registry.executable().info();
            if *json {
                print_json(&info);
            } else {
                println!("path: {}", info.path.display());
                println!("dir:  {}", info.dir.display());
                println!("file: {}", info.file);
                println!("name: {}", info.name);
            }
        }
        Commands::Path => println!("{}", registry.pid_file_path().display()),
        Commands::Create => match registry.create_pid_file() {
            Ok(pid) => println!("{}", pid),
            Err(e) => fail("Error creating PID file", &e),
        },
        Commands::Read => match registry.read_own_pid_file() {
            Ok(pid) => println!("{}", pid),
            Err(e) => fail("Error reading PID file", &e),
        },
        Commands::Delete => match registry.delete_pid_file() {
            Ok(()) => println!("Removed {}", registry.pid_file_path().display()),
            Err(e) => fail("Error removing PID file", &e),
        },
        Commands::Status { json } => {
            let handle = registry.get_run_status();
            if *json {
                print_json(&StatusReport {
                    running: handle.is_some(),
                    pid: handle.map(|h| h.pid()),
                    pid_file: registry.pid_file_path(),
                });
            } else {
                match handle {
                    Some(handle) => println!("running (pid {})", handle.pid()),
                    None => println!("not running"),
                }
            }
        }
        Commands::Run { seconds } => {
            if let Some(handle) = registry.get_run_status() {
                eprintln!(
                    "Another instance is already running with PID {}",
                    handle.pid()
                );
                process::exit(1);
            }

            let pid = match registry.create_pid_file() {
                Ok(pid) => pid,
                Err(e) => {
                    // A half-written PID file would mislead the next status check
                    if matches!(e, PidError::Write { .. }) {
                        if let Err(cleanup) = registry.delete_pid_file() {
                            warn!(
                                "Failed to remove half-written PID file {}: {}",
                                registry.pid_file_path().display(),
                                cleanup
                            );
                        }
                    }
                    fail("Error creating PID file", &e);
                }
            };

            println!("Running as PID {}", pid);
            thread::sleep(Duration::from_secs(*seconds));

            if let Err(e) = registry.delete_pid_file() {
                fail("Error removing PID file", &e);
            }
            println!("Stopped");
        }
    }
}

/// Builds the registry for this binary, applying the directory flags.
fn build_registry(cli: &Cli) -> std::io::Result<PidRegistry> {
    let registry = PidRegistry::new();

    if let Some(dir) = &cli.base_dir {
        registry.set_base_directory(dir);
    } else if cli.data_dir {
        let dir = data_dir(&registry.executable().application_name())?;
        registry.set_base_directory(dir);
    }

    Ok(registry)
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn fail(context: &str, error: &PidError) -> ! {
    eprintln!("{}: {}", context, error);
    process::exit(1);
}
