//! A Rust library for detecting a running application instance via a PID file.
//!
//! This library locates the running executable from its start arguments and
//! manages a `<app name>.pid` file in a configurable base directory. The
//! liveness check cross-checks the recorded PID against the OS process table,
//! including the executable name, so a PID recycled by an unrelated process is
//! not mistaken for a running instance.
//!
//! ```no_run
//! use runstate::PidRegistry;
//!
//! let registry = PidRegistry::new();
//! if let Some(running) = registry.get_run_status() {
//!     eprintln!("already running as PID {}", running.pid());
//!     return Ok(());
//! }
//! let pid = registry.create_pid_file()?;
//! eprintln!("running as PID {}", pid);
//! registry.delete_pid_file()?;
//! # Ok::<(), runstate::PidError>(())
//! ```

pub mod error;
pub mod executable;
pub mod registry;

pub use error::{PidError, NO_PID};
pub use executable::{
    application_name, executable_dir, executable_file, executable_path, Executable,
    ExecutableInfo,
};
pub use registry::{
    data_dir, pid_file_path_in, read_pid_file, PidRegistry, ProcessHandle, ProcessIdentity,
    ProcessTable, SystemProcessTable,
};
