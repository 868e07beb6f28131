//! Error types for preference loading and validation
//!
//! This module defines the error types used throughout the prefset library.
//! All public functions return [`Result<T, Error>`] for consistent error handling.
//!
//! Validation findings are not errors: [`crate::validate`] always succeeds and
//! reports problems as data in a [`crate::ValidationResult`].

use std::path::PathBuf;

/// Errors that can occur while loading, querying or writing preference files
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed directive. Fatal for the file being processed.
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// The preference file does not exist
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema extension file could not be read or understood
    #[error("Invalid schema: {0}")]
    Schema(String),

    /// Invalid glob pattern in query
    #[error("Invalid glob pattern: {0}")]
    InvalidGlobPattern(String),
}

impl Error {
    pub(crate) fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    /// Map an I/O error on `path` to [`Error::NotFound`] when the file is missing
    pub fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::Io(err)
        }
    }
}

/// Result type alias for convenience
///
/// # Example
///
/// ```rust
/// use prefset::{load, Result};
///
/// fn count(content: &str) -> Result<usize> {
///     Ok(load(content)?.len())
/// }
/// # assert_eq!(count("").unwrap(), 0);
/// ```
pub type Result<T> = std::result::Result<T, Error>;
