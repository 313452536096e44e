//! PID file registry for detecting a running application instance.
//!
//! A registry owns the base directory in which `<app name>.pid` lives and
//! provides create/read/delete of that file plus a liveness check that
//! reconciles the recorded PID against the OS process table.
//!
//! The base directory is guarded by a reader/writer lock so a registry can be
//! shared across threads. The PID file itself is not locked: concurrent
//! processes racing on the same path are not coordinated.

mod file;
mod path;
mod process;
mod status;

pub use file::{read_pid_file, PID_BUFFER_SIZE};
pub use path::{data_dir, pid_file_path_in};
pub use process::{ProcessIdentity, ProcessTable, SystemProcessTable};
pub use status::ProcessHandle;

use crate::error::PidError;
use crate::executable::Executable;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use tracing::info;

/// Manages the PID file of one application.
#[derive(Debug)]
pub struct PidRegistry<T = SystemProcessTable> {
    base_dir: RwLock<PathBuf>,
    executable: Executable,
    process_table: T,
}

impl PidRegistry<SystemProcessTable> {
    /// Creates a registry for the current executable.
    ///
    /// The base directory defaults to the directory containing the executable.
    pub fn new() -> Self {
        let executable = Executable::current();
        let base_dir = executable.dir();
        Self::with_parts(base_dir, executable, SystemProcessTable)
    }

    /// Creates a registry for the current executable rooted at `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_parts(base_dir, Executable::current(), SystemProcessTable)
    }
}

impl Default for PidRegistry<SystemProcessTable> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ProcessTable> PidRegistry<T> {
    /// Creates a registry from explicit parts.
    pub fn with_parts(
        base_dir: impl Into<PathBuf>,
        executable: Executable,
        process_table: T,
    ) -> Self {
        Self {
            base_dir: RwLock::new(base_dir.into()),
            executable,
            process_table,
        }
    }

    /// Replaces the base directory. The value is not validated.
    pub fn set_base_directory(&self, dir: impl Into<PathBuf>) {
        let mut base_dir = self
            .base_dir
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *base_dir = dir.into();
    }

    /// Returns the current base directory.
    pub fn base_directory(&self) -> PathBuf {
        self.base_dir
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns `<base directory>/<application name>.pid`.
    pub fn pid_file_path(&self) -> PathBuf {
        pid_file_path_in(self.base_directory(), &self.executable.application_name())
    }

    /// Returns the executable this registry identifies.
    pub fn executable(&self) -> &Executable {
        &self.executable
    }

    pub(crate) fn process_table(&self) -> &T {
        &self.process_table
    }

    /// Creates the PID file and writes the current PID into it.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::Io`] if the file cannot be created, or
    /// [`PidError::Write`] (carrying the PID) if writing to it failed.
    pub fn create_pid_file(&self) -> Result<i32, PidError> {
        let path = self.pid_file_path();
        let pid = file::create_pid_file_at(&path)?;
        info!("Created PID file {} for PID {}", path.display(), pid);
        Ok(pid)
    }

    /// Reads the PID recorded in this application's PID file.
    pub fn read_own_pid_file(&self) -> Result<i32, PidError> {
        read_pid_file(&self.pid_file_path())
    }

    /// Removes this application's PID file.
    ///
    /// A missing file is reported as an error, not ignored.
    pub fn delete_pid_file(&self) -> Result<(), PidError> {
        let path = self.pid_file_path();
        file::delete_pid_file_at(&path)?;
        info!("Removed PID file {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NO_PID;
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    /// Process table with canned answers.
    enum Lookup {
        Name(&'static str),
        NameAndExe(&'static str, &'static str),
        Missing,
        Fails,
    }

    struct FakeTable {
        exists: bool,
        lookup: Lookup,
    }

    impl ProcessTable for FakeTable {
        fn exists(&self, _pid: i32) -> bool {
            self.exists
        }

        fn identify(&self, _pid: i32) -> io::Result<Option<ProcessIdentity>> {
            match self.lookup {
                Lookup::Name(name) => Ok(Some(ProcessIdentity {
                    name: name.to_string(),
                    exe_file: None,
                })),
                Lookup::NameAndExe(name, exe) => Ok(Some(ProcessIdentity {
                    name: name.to_string(),
                    exe_file: Some(exe.to_string()),
                })),
                Lookup::Missing => Ok(None),
                Lookup::Fails => Err(io::Error::new(io::ErrorKind::Other, "table unavailable")),
            }
        }
    }

    fn fake_registry(base_dir: &Path, exists: bool, lookup: Lookup) -> PidRegistry<FakeTable> {
        PidRegistry::with_parts(
            base_dir,
            Executable::from_argv0("/opt/svc/bin/svc"),
            FakeTable { exists, lookup },
        )
    }

    fn own_pid() -> i32 {
        i32::try_from(std::process::id()).unwrap()
    }

    #[test]
    fn test_pid_file_path_scenario() {
        let registry = PidRegistry::with_parts(
            "/tmp/app",
            Executable::from_argv0("/usr/local/bin/svc"),
            SystemProcessTable,
        );
        assert_eq!(registry.pid_file_path(), PathBuf::from("/tmp/app/svc.pid"));

        // Repeated queries without writes agree
        assert_eq!(registry.pid_file_path(), registry.pid_file_path());
        assert_eq!(registry.base_directory(), registry.base_directory());
    }

    #[test]
    fn test_default_base_directory_is_executable_dir() {
        let registry = PidRegistry::new();
        assert_eq!(registry.base_directory(), registry.executable().dir());

        let expected = registry
            .executable()
            .dir()
            .join(format!("{}.pid", registry.executable().application_name()));
        assert_eq!(registry.pid_file_path(), expected);
    }

    #[test]
    fn test_set_base_directory() {
        let dir = tempdir().unwrap();
        let registry = PidRegistry::with_base_dir("/does/not/matter");

        registry.set_base_directory(dir.path());
        assert_eq!(registry.base_directory(), dir.path());
        assert!(registry.pid_file_path().starts_with(dir.path()));
    }

    #[test]
    fn test_concurrent_base_directory_access() {
        let registry = Arc::new(PidRegistry::with_base_dir("/tmp/start"));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    if i % 2 == 0 {
                        registry.set_base_directory(format!("/tmp/writer-{}", i));
                    }
                    registry.base_directory()
                })
            })
            .collect();

        for handle in handles {
            let seen = handle.join().unwrap();
            let seen = seen.to_string_lossy().into_owned();
            assert!(seen == "/tmp/start" || seen.starts_with("/tmp/writer-"));
        }
    }

    #[test]
    fn test_create_then_read_round_trip() {
        let dir = tempdir().unwrap();
        let registry = PidRegistry::with_base_dir(dir.path());

        let pid = registry.create_pid_file().unwrap();
        assert_eq!(pid, own_pid());
        assert_eq!(registry.read_own_pid_file().unwrap(), pid);
    }

    #[test]
    fn test_run_status_lifecycle() {
        let dir = tempdir().unwrap();
        let registry = PidRegistry::with_base_dir(dir.path());

        // Nothing recorded yet
        assert!(registry.get_run_status().is_none());

        let pid = registry.create_pid_file().unwrap();
        let handle = registry
            .get_run_status()
            .expect("own process should be reported as running");
        assert_eq!(handle.pid(), pid);
        assert!(registry.pid_file_path().exists());

        registry.delete_pid_file().unwrap();
        assert!(registry.get_run_status().is_none());

        let error = registry.read_own_pid_file().unwrap_err();
        assert!(matches!(error, PidError::Io(_)));
        assert_eq!(error.pid(), NO_PID);
    }

    #[test]
    fn test_dead_pid_is_cleaned_up() {
        let dir = tempdir().unwrap();
        let registry = PidRegistry::with_base_dir(dir.path());
        let path = registry.pid_file_path();

        fs::write(&path, i32::MAX.to_string()).unwrap();

        assert!(registry.get_run_status().is_none());
        assert!(!path.exists(), "stale PID file should be removed");
    }

    #[test]
    fn test_negative_pid_is_cleaned_up() {
        let dir = tempdir().unwrap();
        let registry = PidRegistry::with_base_dir(dir.path());
        let path = registry.pid_file_path();

        fs::write(&path, "-1").unwrap();

        assert_eq!(registry.read_own_pid_file().unwrap(), -1);
        assert!(registry.get_run_status().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_recycled_pid_is_cleaned_up() {
        let dir = tempdir().unwrap();
        // Our own PID is alive, but under a different executable name
        let registry = PidRegistry::with_parts(
            dir.path(),
            Executable::from_argv0("/nowhere/some-other-daemon"),
            SystemProcessTable,
        );
        let path = registry.pid_file_path();
        fs::write(&path, own_pid().to_string()).unwrap();

        assert!(registry.get_run_status().is_none());
        assert!(!path.exists(), "recycled PID file should be removed");
    }

    #[test]
    fn test_executable_name_matches_case_insensitively() {
        let dir = tempdir().unwrap();
        let registry = fake_registry(dir.path(), true, Lookup::Name("SVC"));
        registry.create_pid_file().unwrap();

        assert_eq!(
            registry.get_run_status().map(|handle| handle.pid()),
            Some(own_pid())
        );
        assert!(registry.pid_file_path().exists());
    }

    #[test]
    fn test_replaced_binary_still_reports_running() {
        let dir = tempdir().unwrap();
        let registry = fake_registry(
            dir.path(),
            true,
            Lookup::NameAndExe("svc-old", "svc (deleted)"),
        );
        registry.create_pid_file().unwrap();

        assert!(registry.get_run_status().is_some());
        assert!(registry.pid_file_path().exists());
    }

    #[test]
    fn test_symlinked_start_still_reports_running() {
        let dir = tempdir().unwrap();
        // Exec'd as `svc`, resolving to a differently named binary
        let registry =
            fake_registry(dir.path(), true, Lookup::NameAndExe("svc", "runstate"));
        registry.create_pid_file().unwrap();

        assert!(registry.get_run_status().is_some());
        assert!(registry.pid_file_path().exists());
    }

    #[test]
    fn test_table_query_failure_reports_running() {
        let dir = tempdir().unwrap();
        let registry = fake_registry(dir.path(), true, Lookup::Fails);
        fs::write(registry.pid_file_path(), "4321").unwrap();

        let handle = registry.get_run_status().unwrap();
        assert_eq!(handle.pid(), 4321);
        assert!(registry.pid_file_path().exists());
    }

    #[test]
    fn test_missing_table_entry_is_cleaned_up() {
        let dir = tempdir().unwrap();
        let registry = fake_registry(dir.path(), true, Lookup::Missing);
        fs::write(registry.pid_file_path(), "4321").unwrap();

        assert!(registry.get_run_status().is_none());
        assert!(!registry.pid_file_path().exists());
    }

    #[test]
    fn test_nonexistent_process_skips_table_lookup() {
        let dir = tempdir().unwrap();
        // A table lookup would report running; existence check must win
        let registry = fake_registry(dir.path(), false, Lookup::Fails);
        fs::write(registry.pid_file_path(), "4321").unwrap();

        assert!(registry.get_run_status().is_none());
        assert!(!registry.pid_file_path().exists());
    }

    #[test]
    fn test_unparsable_pid_file_is_left_alone() {
        let dir = tempdir().unwrap();
        let registry = fake_registry(dir.path(), true, Lookup::Name("svc"));
        fs::write(registry.pid_file_path(), "garbage").unwrap();

        let error = registry.read_own_pid_file().unwrap_err();
        assert!(matches!(error, PidError::Parse { .. }));
        assert_eq!(error.pid(), NO_PID);

        assert!(registry.get_run_status().is_none());
        assert!(registry.pid_file_path().exists());
    }

    #[test]
    fn test_delete_without_pid_file_fails() {
        let dir = tempdir().unwrap();
        let registry = PidRegistry::with_base_dir(dir.path());

        let error = registry.delete_pid_file().unwrap_err();
        match error {
            PidError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("expected I/O error, got {:?}", other),
        }
    }
}
