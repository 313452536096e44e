//! Locates the running executable from the process start arguments.
//!
//! Every query is derived from `argv[0]` on demand. Nothing is cached and no
//! query can fail: when resolution does not work out, the raw `argv[0]` is
//! handed back as-is.
//!
//! Resolution order for [`Executable::path`]:
//!
//! 1. `argv[0]` already has a directory component: returned unmodified, even
//!    when relative.
//! 2. Otherwise it is a bare command name, looked up on the search path.
//! 3. The lookup result is made absolute.
//! 4. If step 2 or 3 fails, the raw `argv[0]` is returned.

use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// The executable of a process, identified by its zeroth start argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executable {
    argv0: OsString,
}

/// Snapshot of every locator query, used for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutableInfo {
    pub path: PathBuf,
    pub dir: PathBuf,
    pub file: String,
    pub name: String,
}

impl Executable {
    /// Returns the executable of the current process.
    pub fn current() -> Self {
        Self::from_argv0(std::env::args_os().next().unwrap_or_default())
    }

    /// Builds a locator around an explicit `argv[0]`.
    pub fn from_argv0(argv0: impl Into<OsString>) -> Self {
        Self {
            argv0: argv0.into(),
        }
    }

    /// Returns the raw zeroth start argument.
    pub fn argv0(&self) -> &Path {
        Path::new(&self.argv0)
    }

    /// Returns the best-effort path of the executable.
    pub fn path(&self) -> PathBuf {
        let raw = self.argv0();

        if has_dir_component(raw) {
            return raw.to_path_buf();
        }

        which::which(&self.argv0)
            .ok()
            .and_then(|found| std::path::absolute(found).ok())
            .unwrap_or_else(|| raw.to_path_buf())
    }

    /// Returns the directory containing the executable.
    ///
    /// A path without a parent yields `.`.
    pub fn dir(&self) -> PathBuf {
        match self.path().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Returns the file name of the executable.
    pub fn file(&self) -> String {
        let path = self.path();
        match path.file_name() {
            Some(file) => file.to_string_lossy().into_owned(),
            None => path.to_string_lossy().into_owned(),
        }
    }

    /// Returns the application name: the file name without its extension.
    ///
    /// The extension starts at the last `.`, so a dot-file such as `.svc`
    /// has an empty name.
    pub fn application_name(&self) -> String {
        let mut file = self.file();
        if let Some(dot) = file.rfind('.') {
            file.truncate(dot);
        }
        file
    }

    /// Collects all queries into a single report.
    pub fn info(&self) -> ExecutableInfo {
        ExecutableInfo {
            path: self.path(),
            dir: self.dir(),
            file: self.file(),
            name: self.application_name(),
        }
    }
}

/// `./tool` counts as a bare name so it is resolved and made absolute.
fn has_dir_component(path: &Path) -> bool {
    match path.parent() {
        Some(parent) => !parent.as_os_str().is_empty() && parent != Path::new("."),
        None => false,
    }
}

/// Path of the current executable.
pub fn executable_path() -> PathBuf {
    Executable::current().path()
}

/// Directory of the current executable.
pub fn executable_dir() -> PathBuf {
    Executable::current().dir()
}

/// File name of the current executable.
pub fn executable_file() -> String {
    Executable::current().file()
}

/// Name of the current application, derived from its executable file name.
pub fn application_name() -> String {
    Executable::current().application_name()
}
