//! Bulk re-patch transaction
//!
//! Applies a set of field changes across an ordered selection of fixtures.
//! Sequential values (FIDs, addresses) are handed out in the order of the
//! selection, so the caller's ordering decides the outcome. Any failure
//! discards every change.

use crate::collision::{check_collision, validate_changed};
use crate::cursor::PatchCursor;
use crate::error::{PatchError, Result};
use crate::fixture::{manufacturer_color, FixtureId, FixtureInstance, TypeId};
use crate::library::FixtureLibrary;
use crate::occupancy::OccupancyIndex;
use crate::registry::FidRegistry;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// How to rename the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkName {
    /// Every target gets the same name
    Fixed(String),
    /// Targets are named `"{base} 1"`, `"{base} 2"`, ... in selection order
    Numbered(String),
}

/// Starting point for a sequential re-patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Universe of the first target
    pub universe: u16,
    /// Address of the first target
    pub address: u16,
}

/// Field changes to apply to every target. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkEdit {
    /// Rename
    pub name: Option<BulkName>,
    /// Renumber FIDs sequentially from this base
    pub fid_base: Option<u32>,
    /// Change the fixture type
    pub type_id: Option<TypeId>,
    /// Re-patch sequentially from this placement
    pub placement: Option<Placement>,
    /// Set the location label
    pub location: Option<String>,
    /// Set the fixed installation flag
    pub is_fixed: Option<bool>,
}

impl BulkEdit {
    /// Whether the edit changes nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Compute the fixture set that results from applying `edit` to `targets`.
///
/// `targets` is processed in order. Placements are validated against the
/// current patch with every target excluded, since the selection moves as
/// a group. The returned set replaces `fixtures` wholesale; on error the
/// caller keeps `fixtures` as it was.
pub fn apply_bulk_edit(
    targets: &[FixtureId],
    edit: &BulkEdit,
    fixtures: &[FixtureInstance],
    library: &FixtureLibrary,
    max_universes: u16,
) -> Result<Vec<FixtureInstance>> {
    let positions: HashMap<&FixtureId, usize> = fixtures
        .iter()
        .enumerate()
        .map(|(i, f)| (&f.id, i))
        .collect();
    let mut selection: HashSet<FixtureId> = HashSet::with_capacity(targets.len());
    for id in targets {
        if !positions.contains_key(id) {
            return Err(PatchError::FixtureNotFound(id.clone()));
        }
        if !selection.insert(id.clone()) {
            return Err(PatchError::InvalidParameter(format!(
                "fixture {id} selected twice"
            )));
        }
    }

    if let Some(base) = edit.fid_base {
        if base == 0 {
            return Err(PatchError::InvalidParameter(
                "FID must be a positive number".to_string(),
            ));
        }
        let registry = FidRegistry::new(fixtures, &selection);
        for offset in 0..targets.len() as u32 {
            let fid = base.checked_add(offset).ok_or_else(|| {
                PatchError::InvalidParameter("FID counter overflow".to_string())
            })?;
            if !registry.is_available(fid) {
                return Err(PatchError::DuplicateFid { fid });
            }
        }
    }

    let new_type = match &edit.type_id {
        Some(type_id) => Some(
            library
                .get(type_id)
                .ok_or_else(|| PatchError::TypeNotFound(type_id.clone()))?,
        ),
        None => None,
    };

    let index = OccupancyIndex::build(fixtures, library);
    let start = edit.placement.unwrap_or(Placement {
        universe: 1,
        address: 1,
    });
    let mut cursor = PatchCursor::new(edit.fid_base.unwrap_or(1), start.universe, start.address);
    let mut updated = fixtures.to_vec();

    for (i, id) in targets.iter().enumerate() {
        let fixture = &mut updated[positions[id]];

        match &edit.name {
            Some(BulkName::Fixed(name)) => fixture.name = name.clone(),
            Some(BulkName::Numbered(base)) => fixture.name = format!("{} {}", base, i + 1),
            None => {}
        }
        if edit.fid_base.is_some() {
            fixture.fid = cursor.fid;
        }
        if let Some(ty) = new_type {
            fixture.type_id = ty.id.clone();
            fixture.color = manufacturer_color(&ty.manufacturer).to_string();
        }
        if let Some(location) = &edit.location {
            fixture.location = location.clone();
        }
        if let Some(is_fixed) = edit.is_fixed {
            fixture.is_fixed = is_fixed;
        }

        if edit.placement.is_some() {
            // The footprint of the (possibly new) type drives both the check
            // and how far the cursor advances.
            let channels = library
                .channels(&fixture.type_id)
                .ok_or_else(|| PatchError::TypeNotFound(fixture.type_id.clone()))?;
            if i > 0 {
                cursor = cursor.fit(channels, max_universes)?;
            }
            let universe = cursor.placement_universe(max_universes)?;
            check_collision(&index, universe, cursor.address, channels, &selection)?;
            fixture.universe = universe;
            fixture.address = cursor.address;
            cursor = cursor.step(channels, max_universes)?;
        } else {
            cursor = cursor.step_fid()?;
        }
    }

    validate_changed(&updated, &selection, library, max_universes)?;
    debug!("Bulk edit prepared for {} fixtures", targets.len());
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocate::{allocate, AllocationRequest};
    use crate::fixture::FixtureType;

    fn lib() -> FixtureLibrary {
        FixtureLibrary::from_types(vec![
            FixtureType::new("par", "Acme", "Par", "4ch", 4),
            FixtureType::new("spot", "Other", "Spot", "16ch", 16),
            FixtureType::new("big", "Acme", "Big", "200ch", 200),
        ])
    }

    fn patch(quantity: u32) -> Vec<FixtureInstance> {
        allocate(
            &AllocationRequest::single(1, 1, 1, "par", "Par").with_quantity(quantity),
            &[],
            &lib(),
            4,
        )
        .unwrap()
    }

    fn ids(fixtures: &[FixtureInstance]) -> Vec<FixtureId> {
        fixtures.iter().map(|f| f.id.clone()).collect()
    }

    #[test]
    fn test_numbered_rename_follows_target_order() {
        let fixtures = patch(3);
        let mut targets = ids(&fixtures);
        targets.reverse();
        let edit = BulkEdit {
            name: Some(BulkName::Numbered("Front".into())),
            ..Default::default()
        };
        let updated = apply_bulk_edit(&targets, &edit, &fixtures, &lib(), 4).unwrap();
        assert_eq!(updated[2].name, "Front 1");
        assert_eq!(updated[0].name, "Front 3");
    }

    #[test]
    fn test_group_move_ignores_old_positions() {
        let fixtures = patch(3);
        // Shift the whole group by one slot: overlaps its own old footprint.
        let edit = BulkEdit {
            placement: Some(Placement {
                universe: 1,
                address: 2,
            }),
            ..Default::default()
        };
        let updated = apply_bulk_edit(&ids(&fixtures), &edit, &fixtures, &lib(), 4).unwrap();
        let addresses: Vec<_> = updated.iter().map(|f| f.address).collect();
        assert_eq!(addresses, vec![2, 6, 10]);
    }

    #[test]
    fn test_fid_renumber_checks_complement() {
        let fixtures = patch(4);
        let targets = ids(&fixtures[..2]);
        let edit = BulkEdit {
            fid_base: Some(2),
            ..Default::default()
        };
        // FIDs 2 and 3: 3 belongs to a fixture outside the selection
        assert_eq!(
            apply_bulk_edit(&targets, &edit, &fixtures, &lib(), 4),
            Err(PatchError::DuplicateFid { fid: 3 })
        );
        let edit = BulkEdit {
            fid_base: Some(10),
            ..Default::default()
        };
        let updated = apply_bulk_edit(&targets, &edit, &fixtures, &lib(), 4).unwrap();
        assert_eq!(updated[0].fid, 10);
        assert_eq!(updated[1].fid, 11);
        assert_eq!(updated[2].fid, 3);
    }

    #[test]
    fn test_type_change_uses_new_footprint() {
        let fixtures = patch(2);
        let edit = BulkEdit {
            type_id: Some("spot".into()),
            placement: Some(Placement {
                universe: 2,
                address: 1,
            }),
            ..Default::default()
        };
        let updated = apply_bulk_edit(&ids(&fixtures), &edit, &fixtures, &lib(), 4).unwrap();
        assert_eq!(updated[1].address, 17);
        assert_eq!(updated[1].type_id, "spot");
        assert_eq!(updated[1].color, manufacturer_color("Other"));
    }

    #[test]
    fn test_type_change_without_placement_validates_overlap() {
        let fixtures = patch(2);
        let edit = BulkEdit {
            type_id: Some("spot".into()),
            ..Default::default()
        };
        let err = apply_bulk_edit(&ids(&fixtures[..1]), &edit, &fixtures, &lib(), 4).unwrap_err();
        assert!(matches!(err, PatchError::Collision { .. }));
    }

    #[test]
    fn test_rejects_unknown_and_repeated_targets() {
        let fixtures = patch(1);
        let edit = BulkEdit::default();
        assert!(matches!(
            apply_bulk_edit(&[FixtureId::from("ghost")], &edit, &fixtures, &lib(), 4),
            Err(PatchError::FixtureNotFound(_))
        ));
        let twice = vec![fixtures[0].id.clone(), fixtures[0].id.clone()];
        assert!(matches!(
            apply_bulk_edit(&twice, &edit, &fixtures, &lib(), 4),
            Err(PatchError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_repatch_rolls_into_next_universe() {
        let fixtures = patch(3);
        let edit = BulkEdit {
            type_id: Some("big".into()),
            placement: Some(Placement {
                universe: 1,
                address: 1,
            }),
            ..Default::default()
        };
        let updated = apply_bulk_edit(&ids(&fixtures), &edit, &fixtures, &lib(), 4).unwrap();
        let placements: Vec<_> = updated.iter().map(|f| (f.universe, f.address)).collect();
        assert_eq!(placements, vec![(1, 1), (1, 201), (2, 1)]);

        // Same move with a single universe available rolls past the ceiling
        assert_eq!(
            apply_bulk_edit(&ids(&fixtures), &edit, &fixtures, &lib(), 1),
            Err(PatchError::Capacity {
                universe: 2,
                max_universes: 1
            })
        );
    }

    #[test]
    fn test_repatch_past_ceiling_aborts() {
        let fixtures = patch(2);
        let edit = BulkEdit {
            type_id: Some("spot".into()),
            placement: Some(Placement {
                universe: 4,
                address: 500,
            }),
            ..Default::default()
        };
        assert_eq!(
            apply_bulk_edit(&ids(&fixtures), &edit, &fixtures, &lib(), 4),
            Err(PatchError::Range {
                universe: 4,
                address: 513
            })
        );
        let edit = BulkEdit {
            placement: Some(Placement {
                universe: 4,
                address: 509,
            }),
            ..Default::default()
        };
        assert_eq!(
            apply_bulk_edit(&ids(&fixtures), &edit, &fixtures, &lib(), 4),
            Err(PatchError::Capacity {
                universe: 5,
                max_universes: 4
            })
        );
    }
}
