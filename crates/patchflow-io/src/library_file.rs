//! Fixture library file.
//!
//! Libraries are merged into the active type table rather than replacing
//! it, so a partial library only adds or updates the types it names.

use crate::error::{IoError, Result};
use crate::format::{read_limited, FileFormat, MAX_FILE_SIZE};
use chrono::{DateTime, Utc};
use patchflow_core::{FixtureLibrary, FixtureType, ImportedType};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Document type tag of library files.
pub const LIBRARY_FILE_TYPE: &str = "Library";

/// On-disk library document, as written by export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryFile {
    /// Document type tag, `"Library"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Format version
    pub version: String,
    /// When the file was written
    pub export_date: DateTime<Utc>,
    /// Fixture types
    pub fixture_types: Vec<FixtureType>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LibraryDocument {
    Full {
        #[serde(rename = "fixtureTypes")]
        fixture_types: Vec<ImportedType>,
    },
    Bare(Vec<ImportedType>),
}

impl LibraryFile {
    /// Snapshot of a library, stamped now
    pub fn from_library(library: &FixtureLibrary) -> Self {
        Self {
            kind: LIBRARY_FILE_TYPE.to_string(),
            version: crate::PATCH_FILE_VERSION.to_string(),
            export_date: Utc::now(),
            fixture_types: library.types().to_vec(),
        }
    }

    /// Save to `path` (JSON or RON by extension)
    pub fn save(&self, path: &Path) -> Result<()> {
        match FileFormat::from_path(path)? {
            FileFormat::Json => {
                let file = std::fs::File::create(path)?;
                serde_json::to_writer_pretty(file, self)?;
            }
            FileFormat::Ron => {
                let s = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
                std::fs::write(path, s)?;
            }
        }
        Ok(())
    }
}

/// Read the type records of a library file (JSON document, bare JSON
/// array, or RON document)
pub fn read_library_records(path: &Path) -> Result<Vec<ImportedType>> {
    let format = FileFormat::from_path(path)?;
    let content = read_limited(path, MAX_FILE_SIZE)?;
    match format {
        FileFormat::Json => parse_library_json(&content),
        FileFormat::Ron => {
            let file: LibraryFile = ron::from_str(&content)?;
            Ok(file
                .fixture_types
                .into_iter()
                .map(|t| ImportedType {
                    id: Some(t.id),
                    name: Some(t.name),
                    manufacturer: Some(t.manufacturer),
                    mode: Some(t.mode),
                    channels: Some(t.channels),
                })
                .collect())
        }
    }
}

/// Parse library records from JSON
pub fn parse_library_json(content: &str) -> Result<Vec<ImportedType>> {
    let document: LibraryDocument =
        serde_json::from_str(content).map_err(|e| IoError::InvalidFormat {
            expected: "library",
            reason: e.to_string(),
        })?;
    Ok(match document {
        LibraryDocument::Full { fixture_types } => fixture_types,
        LibraryDocument::Bare(records) => records,
    })
}

/// Merge the library file at `path` into `library`. Returns how many types were applied.
pub fn import_library(library: &mut FixtureLibrary, path: &Path) -> Result<usize> {
    let records = read_library_records(path)?;
    Ok(library.merge_import(records))
}

/// Export `library` to `path`
pub fn export_library(library: &FixtureLibrary, path: &Path) -> Result<()> {
    LibraryFile::from_library(library).save(path)
}
