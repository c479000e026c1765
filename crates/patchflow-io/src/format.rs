//! File format detection and size-limited reads.

use crate::error::{IoError, Result};
use std::path::Path;

/// Maximum accepted file size (10 MB).
///
/// Guards against unbounded memory use when importing untrusted files.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Serialization format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// `.json`
    Json,
    /// `.ron`
    Ron,
}

impl FileFormat {
    /// Detect the format from a path's extension. Missing extensions default to JSON.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("json");
        match extension {
            "json" => Ok(Self::Json),
            "ron" => Ok(Self::Ron),
            other => Err(IoError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Read a whole file as text, refusing files over `limit` bytes.
pub(crate) fn read_limited(path: &Path, limit: u64) -> Result<String> {
    let size = std::fs::metadata(path)?.len();
    if size > limit {
        return Err(IoError::FileTooLarge { size, limit });
    }
    Ok(std::fs::read_to_string(path)?)
}
