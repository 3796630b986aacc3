//! Centralized error types for maildoc.
//!
//! Document construction itself never fails; these errors come from the
//! edges around it (reading input files, loading configuration).

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the maildoc library.
#[derive(Error, Debug)]
pub enum MaildocError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified message file does not exist.
    #[error("Message file not found: {0}")]
    FileNotFound(PathBuf),

    /// The configured time zone is not a known IANA zone name.
    #[error("Unknown time zone: {0}")]
    InvalidTimeZone(String),

    /// The configuration file could not be parsed.
    #[error("Invalid configuration in '{path}': {reason}")]
    Config { path: PathBuf, reason: String },

    /// A document could not be serialized for the output boundary.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, MaildocError>`.
pub type Result<T> = std::result::Result<T, MaildocError>;

impl MaildocError {
    /// Create an `Io` variant from a path and an `io::Error`.
    ///
    /// A `NotFound` error becomes [`MaildocError::FileNotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::FileNotFound(path);
        }
        Self::Io { path, source }
    }
}
