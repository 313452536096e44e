//! Provides access to the OS process table.

use std::io;
use std::path::Path;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

/// Longest process name the Linux kernel keeps (`TASK_COMM_LEN - 1`).
const COMM_MAX_LEN: usize = 15;

/// Suffix the kernel appends to the exe link once the binary is replaced.
const DELETED_SUFFIX: &str = " (deleted)";

/// The names a live process is known by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    /// Name the process was started under, possibly truncated by the kernel.
    pub name: String,
    /// File name of the resolved executable, if it could be read.
    pub exe_file: Option<String>,
}

impl ProcessIdentity {
    /// Returns `true` if this process runs the executable file `file`.
    ///
    /// Either name may match, case-insensitively. The process name is what
    /// was exec'd (so a symlink's name), the exe file is the resolved target.
    pub fn matches(&self, file: &str) -> bool {
        let file = file.to_lowercase();

        let name = self.name.to_lowercase();
        let name_matches = name == file
            || (name.chars().count() == COMM_MAX_LEN && file.starts_with(&name));

        let exe_matches = self.exe_file.as_deref().is_some_and(|exe| {
            let exe = exe.strip_suffix(DELETED_SUFFIX).unwrap_or(exe);
            exe.to_lowercase() == file
        });

        name_matches || exe_matches
    }
}

/// Answers the two questions the liveness check asks about a PID.
pub trait ProcessTable {
    /// Returns `true` if a process with the given PID currently exists.
    fn exists(&self, pid: i32) -> bool;

    /// Looks up the names of a live process.
    ///
    /// Returns `Ok(None)` when no process with that PID is in the table, and
    /// an error when the table itself could not be queried.
    fn identify(&self, pid: i32) -> io::Result<Option<ProcessIdentity>>;
}

/// The process table of the running system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessTable;

impl ProcessTable for SystemProcessTable {
    fn exists(&self, pid: i32) -> bool {
        // 0 and negative values address process groups, never a single process
        if pid <= 0 {
            return false;
        }
        is_process_running(pid)
    }

    fn identify(&self, pid: i32) -> io::Result<Option<ProcessIdentity>> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "process table is not available on this platform",
            ));
        }

        let Ok(raw) = u32::try_from(pid) else {
            return Ok(None);
        };
        let pid = Pid::from_u32(raw);

        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_exe(UpdateKind::OnlyIfNotSet),
        );

        let Some(process) = system.process(pid) else {
            return Ok(None);
        };

        Ok(Some(ProcessIdentity {
            name: process.name().to_string_lossy().into_owned(),
            exe_file: process
                .exe()
                .and_then(Path::file_name)
                .map(|file| file.to_string_lossy().into_owned()),
        }))
    }
}

/// Checks if a process with the given PID is currently running.
#[cfg(unix)]
fn is_process_running(pid: i32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        // Exists, but owned by someone we may not signal
        Err(_) => true,
    }
}

#[cfg(not(unix))]
fn is_process_running(pid: i32) -> bool {
    let Ok(raw) = u32::try_from(pid) else {
        return false;
    };
    let pid = Pid::from_u32(raw);

    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing(),
    );
    system.process(pid).is_some()
}
