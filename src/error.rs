//! Crate-wide error type.
//!
//! Fatal conditions only. Malformed log lines are *soft* failures: parsers
//! skip them, emit a diagnostic, and keep going, so they never show up here.

use std::path::PathBuf;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that terminate the operation that raised them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file the operation depends on does not exist where expected.
    #[error("required file not found: {path}")]
    MissingInput { path: PathBuf },

    /// The external engine process exited non-zero (and the commandlet is
    /// not configured to ignore its exit code).
    #[error("'{command}' exited with status {code}")]
    ProcessFailure { command: String, code: i32 },

    /// A split-out log fragment declares a source file with no known digest.
    /// The file was deleted or renamed between hashing and extraction.
    #[error("no digest recorded for fragment source: {path}")]
    CacheInconsistency { path: PathBuf },

    /// The assembled configuration is missing a section or holds a value of
    /// the wrong shape.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// A commandlet name with no entry in the commandlet settings.
    #[error("unknown commandlet: {name}")]
    UnknownCommandlet { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Shorthand for [`Error::MissingInput`].
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Error::MissingInput { path: path.into() }
    }

    /// Shorthand for [`Error::InvalidConfig`].
    pub fn config(reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            reason: reason.into(),
        }
    }
}
