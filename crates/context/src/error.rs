use std::path::PathBuf;
use thiserror::Error;

/// Result type for context compilation
pub type Result<T> = std::result::Result<T, ContextError>;

/// Errors that can occur while compiling context
#[derive(Error, Debug)]
pub enum ContextError {
    /// A cell referenced a file or directory that does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Nearby-file search failed
    #[error(transparent)]
    Nearby(#[from] carve_nearby::NearbyError),

    /// Scaffold extraction failed
    #[error(transparent)]
    Scaffold(#[from] carve_scaffold::ScaffoldError),
}
