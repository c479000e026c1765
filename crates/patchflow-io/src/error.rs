//! Error types for patch and library file I/O.

use patchflow_core::PatchError;

/// Result type alias for file operations.
pub type Result<T> = std::result::Result<T, IoError>;

/// Error type for file operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RON deserialization error
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// RON serialization error
    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    /// File is not a patch or library document
    #[error("Invalid {expected} file: {reason}")]
    InvalidFormat {
        /// Kind of document that was expected
        expected: &'static str,
        /// What was wrong
        reason: String,
    },

    /// File extension not recognised
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// File exceeds the size ceiling
    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge {
        /// Actual size in bytes
        size: u64,
        /// Allowed size in bytes
        limit: u64,
    },

    /// Engine rejected the loaded data
    #[error(transparent)]
    Patch(#[from] PatchError),
}
