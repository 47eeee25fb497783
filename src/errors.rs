//! Centralized error handling.
//!
//! The error surface is deliberately small: a missing file, an unset
//! variable, and a malformed line are all normal outcomes here, not
//! errors. The only failures worth surfacing are filesystem problems
//! with a file the caller named or discovery actually found.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the explicit loader operations.
#[derive(Error, Debug)]
pub enum EnvError {
    /// The environment file could not be read.
    #[error("failed to read environment file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The given path exists but is not a regular file.
    #[error("{} is not a regular file", path.display())]
    InvalidPath { path: PathBuf },
}

impl EnvError {
    /// True when the underlying cause is a file that does not exist.
    ///
    /// The loader uses this to treat a file that vanished between
    /// discovery and read the same as one that was never there.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EnvError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound
        )
    }
}

/// Result type alias
pub type EnvResult<T> = Result<T, EnvError>;

/// Convenience constructors
impl EnvError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EnvError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_path(path: impl Into<PathBuf>) -> Self {
        EnvError::InvalidPath { path: path.into() }
    }
}
