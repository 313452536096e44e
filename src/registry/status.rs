//! Liveness reconciliation for the application's PID file.

use crate::registry::process::ProcessTable;
use crate::registry::PidRegistry;
use serde::Serialize;
use tracing::{debug, warn};

/// A live process that owns the application's PID file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessHandle {
    pid: i32,
}

impl ProcessHandle {
    /// Returns the process id.
    pub fn pid(&self) -> i32 {
        self.pid
    }
}

impl<T: ProcessTable> PidRegistry<T> {
    /// Checks whether an instance of this application is currently running.
    ///
    /// This is not a pure query: when the PID file names a process that is
    /// gone, or a PID that now belongs to a different executable, the PID
    /// file is deleted before `None` is returned.
    ///
    /// 1. No readable PID file: `None`, nothing is touched.
    /// 2. No process with the recorded PID: delete the file, `None`.
    /// 3. The process table cannot be queried: trust step 2, `Some`.
    /// 4. The PID is missing from the table, or neither its process name nor
    ///    its executable file matches ours (case-insensitively): delete the
    ///    file, `None`.
    /// 5. Otherwise `Some` with the recorded PID.
    pub fn get_run_status(&self) -> Option<ProcessHandle> {
        let pid = match self.read_own_pid_file() {
            Ok(pid) => pid,
            Err(e) => {
                debug!("No usable PID file: {}", e);
                return None;
            }
        };

        if !self.process_table().exists(pid) {
            debug!("PID {} is not running, removing stale PID file", pid);
            self.discard_stale_pid_file();
            return None;
        }

        let handle = ProcessHandle { pid };

        let identity = match self.process_table().identify(pid) {
            Ok(identity) => identity,
            Err(e) => {
                debug!("Process table query failed for PID {}: {}", pid, e);
                return Some(handle);
            }
        };

        let own_file = self.executable().file();
        match identity {
            Some(identity) if identity.matches(&own_file) => {
                debug!("PID {} is a running instance of {}", pid, own_file);
                Some(handle)
            }
            Some(identity) => {
                debug!(
                    "PID {} belongs to {} rather than {}, removing stale PID file",
                    pid, identity.name, own_file
                );
                self.discard_stale_pid_file();
                None
            }
            None => {
                debug!("PID {} vanished from the process table", pid);
                self.discard_stale_pid_file();
                None
            }
        }
    }

    fn discard_stale_pid_file(&self) {
        if let Err(e) = self.delete_pid_file() {
            warn!(
                "Failed to remove stale PID file {}: {}",
                self.pid_file_path().display(),
                e
            );
        }
    }
}
