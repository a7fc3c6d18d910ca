//! # Quarry Host Errors
//!
//! Defines [`Error`], the top-level error type for the host, wrapping the
//! typed subsystem errors, plus the crate-wide [`Result`] alias.

use std::path::PathBuf;
use std::result::Result as StdResult;

use crate::package_system::error::PackageSystemError;
use thiserror::Error as ThisError;

/// Top-level error type for the Quarry host.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Specific, typed package system error
    #[error("Package system error: {0}")]
    PackageSystem(#[from] PackageSystemError),

    /// I/O error with operation and path context
    #[error("I/O error during '{operation}' on '{}': {source}", path.display())]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl Error {
    /// Create an I/O error with operation and path context.
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        Error::Io {
            operation: operation.into(),
            path,
            source,
        }
    }
}
