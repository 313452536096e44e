//! PID file I/O.
//!
//! Format: the decimal PID and nothing else. No trailing newline is written;
//! surrounding whitespace is tolerated on read.

use crate::error::PidError;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Maximum number of bytes read from a PID file.
pub const PID_BUFFER_SIZE: usize = 128;

/// Creates (or truncates) the PID file at `path` and writes the current PID.
///
/// Returns the PID that was written. If the file was created but the write
/// failed, the error is [`PidError::Write`] and still carries the PID.
pub fn create_pid_file_at(path: &Path) -> Result<i32, PidError> {
    let mut file = File::create(path)?;
    let pid = current_pid()?;

    if let Err(source) = write!(file, "{}", pid).and_then(|()| file.flush()) {
        return Err(PidError::Write { pid, source });
    }

    Ok(pid)
}

/// Reads and parses `path` as a PID file, returning the recorded PID.
///
/// At most [`PID_BUFFER_SIZE`] bytes are read. The value may be negative
/// if the file was corrupted.
///
/// # Errors
///
/// - [`PidError::Io`] if the file cannot be opened or read, or is empty
/// - [`PidError::Parse`] if the contents are not a base-10 integer
pub fn read_pid_file(path: &Path) -> Result<i32, PidError> {
    let mut file = File::open(path)?;
    let mut buf = [0u8; PID_BUFFER_SIZE];

    let read = file.read(&mut buf)?;
    if read == 0 {
        return Err(PidError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("PID file {} is empty", path.display()),
        )));
    }
    if read > buf.len() {
        return Err(PidError::Overflow {
            read,
            capacity: buf.len(),
        });
    }

    parse_pid(&buf[..read])
}

/// Removes the PID file at `path`. A missing file is an error.
pub fn delete_pid_file_at(path: &Path) -> Result<(), PidError> {
    std::fs::remove_file(path)?;
    Ok(())
}

fn parse_pid(bytes: &[u8]) -> Result<i32, PidError> {
    let contents = String::from_utf8_lossy(bytes);
    contents
        .trim()
        .parse::<i32>()
        .map_err(|source| PidError::Parse {
            contents: contents.to_string(),
            source,
        })
}

fn current_pid() -> Result<i32, PidError> {
    let pid = std::process::id();
    i32::try_from(pid).map_err(|_| {
        PidError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("process id {} does not fit a PID file", pid),
        ))
    })
}
