//! Error types for fetchflow-sinks

use fetchflow_core::FlowError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when reading or writing a store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Nothing has been stored at the location yet
    #[error("No stored value at {}", .0.display())]
    Missing(PathBuf),

    /// An IO error occurred
    #[error("IO error at {}: {message}", .path.display())]
    Io {
        /// Location being accessed
        path: PathBuf,
        /// Underlying error
        message: String,
    },

    /// The stored document could not be encoded or decoded
    #[error("Corrupt document at {}: {message}", .path.display())]
    Serialization {
        /// Location being accessed
        path: PathBuf,
        /// Underlying error
        message: String,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::Missing(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
        }
    }

    pub(crate) fn serialization(path: &Path, err: &serde_json::Error) -> Self {
        Self::Serialization {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for FlowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing(path) => Self::CacheMiss(path.display().to_string()),
            other => Self::Persistence(other.to_string()),
        }
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
