//! Patch snapshot file.
//!
//! A patch file carries the fixture list, the show name and the universe
//! ceiling. Loading also accepts a bare JSON array of fixtures, as written
//! by older exports.

use crate::error::{IoError, Result};
use crate::format::{read_limited, FileFormat, MAX_FILE_SIZE};
use chrono::{DateTime, Utc};
use patchflow_core::{FixtureInstance, Patch};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Document type tag of patch files.
pub const PATCH_FILE_TYPE: &str = "Patch";

/// Current format version written to new files.
pub const PATCH_FILE_VERSION: &str = "1.0.0";

/// Configuration stored alongside the fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchFileConfig {
    /// Universe ceiling the patch was made with
    pub max_universes: u16,
}

/// On-disk patch document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchFile {
    /// Document type tag, `"Patch"`
    #[serde(rename = "type", default = "patch_file_type")]
    pub kind: String,
    /// Format version
    #[serde(default)]
    pub version: String,
    /// Show name
    #[serde(default)]
    pub show_name: Option<String>,
    /// When the file was written
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
    /// Patched fixtures
    pub fixtures: Vec<FixtureInstance>,
    /// Universe ceiling
    #[serde(default)]
    pub config: Option<PatchFileConfig>,
}

fn patch_file_type() -> String {
    PATCH_FILE_TYPE.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PatchDocument {
    Full(PatchFile),
    Bare(Vec<FixtureInstance>),
}

impl PatchFile {
    /// Snapshot of a patch, stamped now
    pub fn from_patch(patch: &Patch) -> Self {
        Self {
            kind: patch_file_type(),
            version: PATCH_FILE_VERSION.to_string(),
            show_name: Some(patch.show_name.clone()),
            export_date: Some(Utc::now()),
            fixtures: patch.fixtures().to_vec(),
            config: Some(PatchFileConfig {
                max_universes: patch.max_universes(),
            }),
        }
    }

    /// Load a patch file (JSON or RON by extension)
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_limit(path, MAX_FILE_SIZE)
    }

    fn load_with_limit(path: &Path, limit: u64) -> Result<Self> {
        let format = FileFormat::from_path(path)?;
        let content = read_limited(path, limit)?;
        let file = match format {
            FileFormat::Json => Self::from_json(&content)?,
            FileFormat::Ron => ron::from_str(&content)?,
        };
        if file.kind != PATCH_FILE_TYPE {
            return Err(IoError::InvalidFormat {
                expected: "patch",
                reason: format!("document type is {:?}", file.kind),
            });
        }
        debug!("Loaded {} fixtures from {:?}", file.fixtures.len(), path);
        Ok(file)
    }

    /// Parse a JSON patch document or a bare fixture array
    pub fn from_json(content: &str) -> Result<Self> {
        let document: PatchDocument =
            serde_json::from_str(content).map_err(|e| IoError::InvalidFormat {
                expected: "patch",
                reason: e.to_string(),
            })?;
        Ok(match document {
            PatchDocument::Full(file) => file,
            PatchDocument::Bare(fixtures) => Self {
                kind: patch_file_type(),
                version: String::new(),
                show_name: None,
                export_date: None,
                fixtures,
                config: None,
            },
        })
    }

    /// Save to `path` (JSON or RON by extension), refreshing the export date
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let format = FileFormat::from_path(path)?;
        self.export_date = Some(Utc::now());
        match format {
            FileFormat::Json => {
                let file = std::fs::File::create(path)?;
                serde_json::to_writer_pretty(file, self)?;
            }
            FileFormat::Ron => {
                let s = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
                std::fs::write(path, s)?;
            }
        }
        info!("Saved {} fixtures to {:?}", self.fixtures.len(), path);
        Ok(())
    }

    /// Replace the patch's fixtures, show name and ceiling with this snapshot
    pub fn apply_to(self, patch: &mut Patch) -> Result<()> {
        if let Some(config) = self.config {
            patch.set_max_universes(config.max_universes)?;
        }
        if let Some(name) = self.show_name {
            patch.show_name = name;
        }
        patch.replace_fixtures(self.fixtures);
        Ok(())
    }
}

/// Save a patch to `path`
pub fn save_patch(patch: &Patch, path: &Path) -> Result<()> {
    PatchFile::from_patch(patch).save(path)
}

/// Load `path` into `patch`, replacing its fixture set
pub fn load_patch(patch: &mut Patch, path: &Path) -> Result<()> {
    PatchFile::load(path)?.apply_to(patch)
}
