use std::path::PathBuf;
use thiserror::Error;

/// Result type for nearby-file operations
pub type Result<T> = std::result::Result<T, NearbyError>;

/// Errors that can occur while searching for nearby files
#[derive(Error, Debug)]
pub enum NearbyError {
    /// The search target does not exist
    #[error("Target path does not exist: {0}")]
    TargetNotFound(PathBuf),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
