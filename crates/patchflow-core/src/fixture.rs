//! Fixture types and patched fixture instances

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Number of addressable slots in one universe.
pub const UNIVERSE_SIZE: u16 = 512;

/// Identifier of a fixture type in the library.
pub type TypeId = String;

/// Stable identity of a fixture instance.
///
/// Distinct from the user-facing FID, which can be renumbered freely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureId(String);

impl FixtureId {
    /// Generate a fresh random identity
    pub fn generate() -> Self {
        Self(format!("fix-{}", Uuid::new_v4().simple()))
    }

    /// Borrow the identity as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FixtureId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FixtureId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for FixtureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fixture type (personality): manufacturer, model, mode and footprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureType {
    /// Library identifier
    pub id: TypeId,
    /// Model name
    pub name: String,
    /// Manufacturer name
    pub manufacturer: String,
    /// Mode label
    pub mode: String,
    /// Number of contiguous slots the fixture occupies
    pub channels: u16,
}

impl FixtureType {
    /// Create a new fixture type
    pub fn new(
        id: impl Into<TypeId>,
        manufacturer: impl Into<String>,
        name: impl Into<String>,
        mode: impl Into<String>,
        channels: u16,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            manufacturer: manufacturer.into(),
            mode: mode.into(),
            channels,
        }
    }

    /// Grouping key used by the library ("Manufacturer - Model")
    pub fn group_key(&self) -> String {
        format!("{} - {}", self.manufacturer, self.name)
    }
}

/// A fixture patched at a universe and start address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureInstance {
    /// Stable identity
    pub id: FixtureId,
    /// User-facing fixture ID, unique across the patch
    pub fid: u32,
    /// Display name
    pub name: String,
    /// Fixture type reference
    pub type_id: TypeId,
    /// Universe (1-based)
    pub universe: u16,
    /// Start address (1-512)
    pub address: u16,
    /// Display color derived from the manufacturer
    #[serde(default)]
    pub color: String,
    /// Free-text location label
    #[serde(default)]
    pub location: String,
    /// Part of the venue's permanent rig
    #[serde(default)]
    pub is_fixed: bool,
}

impl FixtureInstance {
    /// Last address covered by a footprint of `channels` slots
    pub fn end_address(&self, channels: u16) -> u32 {
        u32::from(self.address) + u32::from(channels) - 1
    }

    /// Combined placement key used for ordering (`universe * 1000 + address`)
    pub fn patch_key(&self) -> u32 {
        u32::from(self.universe) * 1000 + u32::from(self.address)
    }

    /// Patch label in `U.A` notation
    pub fn patch_label(&self) -> String {
        format!("{}.{}", self.universe, self.address)
    }
}

const MANUFACTURER_PALETTE: [&str; 10] = [
    "#2563eb", "#059669", "#d97706", "#7c3aed", "#db2777", "#0891b2", "#e11d48", "#65a30d",
    "#4f46e5", "#9333ea",
];

/// Deterministic display color for a manufacturer name
pub fn manufacturer_color(manufacturer: &str) -> &'static str {
    let hash = manufacturer.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    });
    MANUFACTURER_PALETTE[(hash.unsigned_abs() % MANUFACTURER_PALETTE.len() as u32) as usize]
}
