use std::path::PathBuf;

use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A mutation targeted a path that does not live under the explorer root.
    #[error("Path is outside the explorer root: {}", .0.display())]
    OutsideRoot(PathBuf),

    /// A cache file could not be encoded or decoded.
    #[error("Cache error: {0}")]
    Cache(#[from] serde_json::Error),

    /// The configured exclusion pattern is not a valid regular expression.
    #[error("Invalid exclusion pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The external listing command exited abnormally.
    #[error("Listing command failed: {0}")]
    BuildFailed(String),
}
