//! Error types for PID file operations.

use std::io;
use std::num::ParseIntError;
use thiserror::Error;

/// Returned in place of a PID whenever no valid PID could be acquired.
pub const NO_PID: i32 = -1;

/// Errors that can occur while creating, reading or removing a PID file.
#[derive(Debug, Error)]
pub enum PidError {
    /// Creating, opening, reading or removing the PID file failed.
    #[error("PID file I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The PID file was created but the PID could not be written to it.
    ///
    /// The file on disk is unreliable; callers may retry or delete it.
    #[error("failed to write PID {pid} to PID file: {source}")]
    Write { pid: i32, source: io::Error },

    /// The PID file does not contain a base-10 integer.
    #[error("unable to parse PID file contents {contents:?}: {source}")]
    Parse {
        contents: String,
        source: ParseIntError,
    },

    /// More bytes were reported than the read buffer holds.
    #[error("unable to parse PID file: read {read} bytes into a {capacity} byte buffer")]
    Overflow { read: usize, capacity: usize },
}

impl PidError {
    /// Returns the PID that accompanies this failure.
    ///
    /// Only [`PidError::Write`] carries a real PID; every other failure
    /// yields [`NO_PID`].
    pub fn pid(&self) -> i32 {
        match self {
            PidError::Write { pid, .. } => *pid,
            _ => NO_PID,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_keeps_pid() {
        let error = PidError::Write {
            pid: 4321,
            source: io::Error::new(io::ErrorKind::WriteZero, "disk full"),
        };
        assert_eq!(error.pid(), 4321);
        assert!(error.to_string().contains("4321"));
    }

    #[test]
    fn test_other_errors_report_no_pid() {
        let io_error = PidError::from(io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(io_error.pid(), NO_PID);

        let parse_error = PidError::Parse {
            contents: "abc".to_string(),
            source: "abc".parse::<i32>().unwrap_err(),
        };
        assert_eq!(parse_error.pid(), NO_PID);

        let overflow = PidError::Overflow {
            read: 129,
            capacity: 128,
        };
        assert_eq!(overflow.pid(), NO_PID);
    }
}
