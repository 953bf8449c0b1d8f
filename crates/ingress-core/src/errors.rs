//! Error types for the load-test core.
//!
//! Failures are split by how far they reach:
//! - `ConnectionError`: the session could not be established; ends the current batch run
//! - `TransferError`: one file failed to upload; recorded, and the engine moves on
//! - `ConfigError`: rejected before any session is opened or any report line written

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Failure establishing a session with the remote endpoint.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("SSH handshake with {endpoint} failed: {message}")]
    Handshake { endpoint: String, message: String },
    #[error("authentication as '{username}' failed: {message}")]
    Authentication { username: String, message: String },
    #[error("failed to start SFTP subsystem: {message}")]
    Subsystem { message: String },
    #[error("{0}")]
    Other(String),
}

/// Step of an upload that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStage {
    ReadLocal,
    CreateRemote,
    Write,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransferStage::ReadLocal => "read local file",
            TransferStage::CreateRemote => "create remote file",
            TransferStage::Write => "write remote file",
        };
        f.write_str(label)
    }
}

/// A single file failed to upload.
///
/// `Display` renders only the cause, which is what lands in the report line
/// after `Error uploading <file>:`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{cause}")]
pub struct TransferError {
    /// Local file name that was being uploaded.
    pub file: String,
    pub stage: TransferStage,
    pub cause: String,
    /// Whether the failure looks like endpoint pressure (timeouts, resets)
    /// rather than a permanent condition.
    pub transient: bool,
}

impl TransferError {
    pub fn new(file: impl Into<String>, stage: TransferStage, cause: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            stage,
            cause: cause.into(),
            transient: false,
        }
    }

    pub fn from_io(file: impl Into<String>, stage: TransferStage, err: &io::Error) -> Self {
        Self {
            file: file.into(),
            stage,
            cause: err.to_string(),
            transient: is_transient_io_error(err),
        }
    }

    pub fn transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }
}

/// Rejected configuration values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("batch size must be a positive integer (got '{0}')")]
    InvalidBatchSize(String),
    #[error("at least one batch size is required")]
    NoBatchSizes,
    #[error("local directory does not exist: {}", .0.display())]
    MissingLocalDir(PathBuf),
    #[error("local path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("remote directory cannot be empty")]
    EmptyRemoteDir,
    #[error("invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Classify an IO error as transient (the endpoint may recover) or not.
pub fn is_transient_io_error(err: &io::Error) -> bool {
    match err.kind() {
        io::ErrorKind::TimedOut
        | io::ErrorKind::Interrupted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::WouldBlock => true,

        io::ErrorKind::PermissionDenied
        | io::ErrorKind::NotFound
        | io::ErrorKind::InvalidData
        | io::ErrorKind::InvalidInput
        | io::ErrorKind::AlreadyExists
        | io::ErrorKind::WriteZero
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::NotConnected
        | io::ErrorKind::ConnectionRefused => false,

        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_error_displays_cause_only() {
        let err = TransferError::new("b.txt", TransferStage::CreateRemote, "permission denied");
        assert_eq!(err.to_string(), "permission denied");
        assert_eq!(err.stage.to_string(), "create remote file");
    }

    #[test]
    fn io_errors_are_classified() {
        let timeout = io::Error::new(io::ErrorKind::TimedOut, "timeout");
        assert!(is_transient_io_error(&timeout));

        let perm = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert!(!is_transient_io_error(&perm));

        let err = TransferError::from_io("a.txt", TransferStage::Write, &timeout);
        assert!(err.transient);
        assert_eq!(err.cause, "timeout");
    }

    #[test]
    fn connection_error_mentions_endpoint() {
        let err = ConnectionError::Connect {
            endpoint: "sftp.example.com:22".into(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
        };
        assert_eq!(
            err.to_string(),
            "failed to connect to sftp.example.com:22: connection refused"
        );
    }
}
