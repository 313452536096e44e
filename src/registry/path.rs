//! Provides the PID file naming scheme and the platform data directory.

use directories::ProjectDirs;
use std::io;
use std::path::{Path, PathBuf};

/// Extension appended to the application name to form the PID file name.
pub(crate) const PID_FILE_EXTENSION: &str = "pid";

/// Joins a base directory with `<app_name>.pid`.
pub fn pid_file_path_in<P: AsRef<Path>>(base_dir: P, app_name: &str) -> PathBuf {
    base_dir
        .as_ref()
        .join(format!("{}.{}", app_name, PID_FILE_EXTENSION))
}

/// Gets the per-user data directory for an application using the `directories` crate.
///
/// This is an alternative base directory for PID files when the executable's
/// own directory is not writable. The directory is created if it does not
/// exist.
///
/// # Errors
///
/// Returns an error if the platform doesn't support application directories
/// or if directory creation fails.
pub fn data_dir(app_name: &str) -> io::Result<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", app_name).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Other,
            "Unable to determine application directories for this platform",
        )
    })?;

    let data_dir = project_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.to_path_buf())
}
