//! Fixture type library
//!
//! Holds the type table consulted by every engine operation. Types are
//! replaced wholesale, never mutated in place, so instances referencing a
//! type always see a consistent footprint.

use crate::fixture::{FixtureType, TypeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use tracing::{debug, info};

/// The table of known fixture types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureLibrary {
    types: Vec<FixtureType>,
}

impl Default for FixtureLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A fixture type record as found in an imported library file.
///
/// Every field is optional; incomplete records are skipped on merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportedType {
    /// Library identifier
    pub id: Option<TypeId>,
    /// Model name
    pub name: Option<String>,
    /// Manufacturer name
    pub manufacturer: Option<String>,
    /// Mode label
    pub mode: Option<String>,
    /// Footprint
    pub channels: Option<u16>,
}

/// Fields for a user-defined type. Empty fields fall back to defaults.
#[derive(Debug, Clone, Default)]
pub struct CustomType {
    /// Manufacturer, defaults to "Custom"
    pub manufacturer: String,
    /// Model name, defaults to "Unknown"
    pub name: String,
    /// Mode label, defaults to "Standard"
    pub mode: String,
    /// Footprint, defaults to 1
    pub channels: u16,
}

impl FixtureLibrary {
    /// Create an empty library
    pub fn empty() -> Self {
        Self { types: Vec::new() }
    }

    /// Create a library from a list of types
    pub fn from_types(types: Vec<FixtureType>) -> Self {
        Self { types }
    }

    /// Starter table shipped with the application
    pub fn builtin() -> Self {
        Self::from_types(vec![
            FixtureType::new("generic-dimmer", "Generic", "Dimmer", "1ch", 1),
            FixtureType::new("generic-rgb", "Generic", "RGB Par", "3ch", 3),
            FixtureType::new("generic-rgba", "Generic", "RGBA Par", "4ch", 4),
            FixtureType::new("generic-rgbw", "Generic", "RGBW Par", "4ch", 4),
            FixtureType::new("generic-rgbw-8", "Generic", "RGBW Par", "8ch", 8),
            FixtureType::new("generic-spot-16", "Generic", "Moving Spot", "Standard", 16),
            FixtureType::new("generic-spot-24", "Generic", "Moving Spot", "Extended", 24),
            FixtureType::new("generic-wash-15", "Generic", "LED Wash", "Standard", 15),
        ])
    }

    /// Look up a type by id
    pub fn get(&self, id: &str) -> Option<&FixtureType> {
        self.types.iter().find(|t| t.id == id)
    }

    /// Footprint of a type, if it resolves
    pub fn channels(&self, id: &str) -> Option<u16> {
        self.get(id).map(|t| t.channels)
    }

    /// All types in insertion order
    pub fn types(&self) -> &[FixtureType] {
        &self.types
    }

    /// Number of types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Types grouped by "Manufacturer - Model", each group listing its modes
    pub fn groups(&self) -> BTreeMap<String, Vec<&FixtureType>> {
        let mut groups: BTreeMap<String, Vec<&FixtureType>> = BTreeMap::new();
        for t in &self.types {
            groups.entry(t.group_key()).or_default().push(t);
        }
        groups
    }

    /// Add a user-defined type and return its generated id
    pub fn add_custom(&mut self, custom: CustomType) -> TypeId {
        let id = format!("custom-{}", Uuid::new_v4().simple());
        let ty = FixtureType::new(
            id.clone(),
            non_empty_or(custom.manufacturer, "Custom"),
            non_empty_or(custom.name, "Unknown"),
            non_empty_or(custom.mode, "Standard"),
            custom.channels.max(1),
        );
        info!("Added custom fixture type {} ({})", ty.group_key(), ty.mode);
        self.types.push(ty);
        id
    }

    /// Merge imported type records into the library.
    ///
    /// A record lacking a name, manufacturer or a non-zero footprint is
    /// skipped. A record matching an existing type by id, or by
    /// (manufacturer, name, mode), overwrites the fields it carries.
    /// Anything else is appended. Returns the number of records applied.
    pub fn merge_import(&mut self, incoming: Vec<ImportedType>) -> usize {
        let mut applied = 0;
        for record in incoming {
            let ImportedType {
                id,
                name,
                manufacturer,
                mode,
                channels,
            } = record;
            let (Some(name), Some(manufacturer), Some(channels)) = (name, manufacturer, channels)
            else {
                debug!("Skipping incomplete imported type {:?}", id);
                continue;
            };
            if name.is_empty() || manufacturer.is_empty() || channels == 0 {
                continue;
            }

            let existing = self.types.iter_mut().find(|t| {
                id.as_deref() == Some(t.id.as_str())
                    || (t.manufacturer == manufacturer
                        && t.name == name
                        && Some(t.mode.as_str()) == mode.as_deref())
            });

            match existing {
                Some(t) => {
                    if let Some(id) = id {
                        t.id = id;
                    }
                    if let Some(mode) = mode {
                        t.mode = mode;
                    }
                    t.name = name;
                    t.manufacturer = manufacturer;
                    t.channels = channels;
                }
                None => {
                    let id = id.unwrap_or_else(|| format!("imported-{}", Uuid::new_v4().simple()));
                    self.types.push(FixtureType::new(
                        id,
                        manufacturer,
                        name,
                        mode.unwrap_or_default(),
                        channels,
                    ));
                }
            }
            applied += 1;
        }
        info!("Merged {} fixture types into library", applied);
        applied
    }
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let lib = FixtureLibrary::builtin();
        assert_eq!(lib.channels("generic-rgb"), Some(3));
        assert!(lib.get("nope").is_none());
    }

    #[test]
    fn test_groups_collect_modes() {
        let lib = FixtureLibrary::builtin();
        let groups = lib.groups();
        let spot = &groups["Generic - Moving Spot"];
        assert_eq!(spot.len(), 2);
        assert_eq!(spot[1].channels, 24);
    }

    #[test]
    fn test_add_custom_applies_defaults() {
        let mut lib = FixtureLibrary::empty();
        let id = lib.add_custom(CustomType::default());
        let ty = lib.get(&id).unwrap();
        assert_eq!(ty.manufacturer, "Custom");
        assert_eq!(ty.name, "Unknown");
        assert_eq!(ty.mode, "Standard");
        assert_eq!(ty.channels, 1);
    }

    #[test]
    fn test_merge_import_replaces_and_appends() {
        let mut lib = FixtureLibrary::builtin();
        let before = lib.len();
        let applied = lib.merge_import(vec![
            ImportedType {
                id: None,
                name: Some("RGB Par".into()),
                manufacturer: Some("Generic".into()),
                mode: Some("3ch".into()),
                channels: Some(6),
            },
            ImportedType {
                id: Some("acme-beam".into()),
                name: Some("Beam".into()),
                manufacturer: Some("Acme".into()),
                mode: Some("Basic".into()),
                channels: Some(12),
            },
            ImportedType {
                name: Some("Broken".into()),
                ..Default::default()
            },
        ]);
        assert_eq!(applied, 2);
        assert_eq!(lib.len(), before + 1);
        assert_eq!(lib.channels("generic-rgb"), Some(6));
        assert_eq!(lib.channels("acme-beam"), Some(12));
    }

    #[test]
    fn test_merge_import_generates_missing_id() {
        let mut lib = FixtureLibrary::empty();
        lib.merge_import(vec![ImportedType {
            name: Some("Blinder".into()),
            manufacturer: Some("Acme".into()),
            channels: Some(2),
            ..Default::default()
        }]);
        assert!(lib.types()[0].id.starts_with("imported-"));
    }
}
