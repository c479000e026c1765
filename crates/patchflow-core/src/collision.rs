//! Collision validation
//!
//! [`check_collision`] gates a single footprint placement.
//! [`validate_patch`] and [`validate_changed`] check the invariants of a
//! whole candidate set and serve as the final gate before a commit.

use crate::error::{PatchError, Result};
use crate::fixture::{FixtureId, FixtureInstance, UNIVERSE_SIZE};
use crate::library::FixtureLibrary;
use crate::occupancy::{Occupancy, OccupancyIndex};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Check that a footprint at `universe.address` fits and overlaps nothing
/// outside `exclude`.
pub fn check_collision(
    index: &OccupancyIndex,
    universe: u16,
    address: u16,
    channels: u16,
    exclude: &HashSet<FixtureId>,
) -> Result<()> {
    if address == 0 {
        return Err(PatchError::Range {
            universe,
            address: 0,
        });
    }
    for offset in 0..u32::from(channels) {
        let target = u32::from(address) + offset;
        if target > u32::from(UNIVERSE_SIZE) {
            return Err(PatchError::Range {
                universe,
                address: target,
            });
        }
        if let Some(occupant) = index.occupant(universe, target) {
            if exclude.contains(occupant) {
                continue;
            }
            let (fid, name) = index
                .owner(occupant)
                .map(|o| (o.fid, o.name.clone()))
                .unwrap_or_default();
            return Err(PatchError::Collision {
                universe,
                address: target as u16,
                fixture: occupant.clone(),
                fid,
                name,
            });
        }
    }
    Ok(())
}

/// Check every invariant over a whole fixture set.
///
/// Instances with an unresolvable type are skipped for range and overlap
/// purposes but still count towards FID uniqueness.
pub fn validate_patch(
    fixtures: &[FixtureInstance],
    library: &FixtureLibrary,
    max_universes: u16,
) -> Result<()> {
    validate_where(fixtures, library, max_universes, |_| true)
}

/// Check the invariants only for violations that involve `changed`.
///
/// Used as the commit gate so that an inconsistency already present in an
/// imported snapshot does not block unrelated edits.
pub fn validate_changed(
    fixtures: &[FixtureInstance],
    changed: &HashSet<FixtureId>,
    library: &FixtureLibrary,
    max_universes: u16,
) -> Result<()> {
    validate_where(fixtures, library, max_universes, |id| changed.contains(id))
}

fn validate_where(
    fixtures: &[FixtureInstance],
    library: &FixtureLibrary,
    max_universes: u16,
    involves: impl Fn(&FixtureId) -> bool,
) -> Result<()> {
    let mut fids: HashMap<u32, &FixtureId> = HashMap::with_capacity(fixtures.len());
    for fixture in fixtures {
        if let Some(previous) = fids.insert(fixture.fid, &fixture.id) {
            if involves(previous) || involves(&fixture.id) {
                return Err(PatchError::DuplicateFid { fid: fixture.fid });
            }
        }
    }

    let mut universes: BTreeMap<u16, Occupancy> = BTreeMap::new();
    let mut owners: HashMap<&FixtureId, &FixtureInstance> = HashMap::new();
    for fixture in fixtures {
        let Some(channels) = library.channels(&fixture.type_id) else {
            continue;
        };
        let relevant = involves(&fixture.id);

        if relevant && (fixture.universe == 0 || fixture.universe > max_universes) {
            return Err(PatchError::Capacity {
                universe: u32::from(fixture.universe),
                max_universes,
            });
        }
        if relevant && fixture.address == 0 {
            return Err(PatchError::Range {
                universe: fixture.universe,
                address: 0,
            });
        }
        if relevant && fixture.end_address(channels) > u32::from(UNIVERSE_SIZE) {
            return Err(PatchError::Range {
                universe: fixture.universe,
                address: fixture.end_address(channels),
            });
        }

        let map = universes
            .entry(fixture.universe)
            .or_insert_with(|| Occupancy::empty(fixture.universe));
        for offset in 0..u32::from(channels) {
            let address = u32::from(fixture.address) + offset;
            let Some(occupant) = map.occupant(address) else {
                continue;
            };
            if relevant || involves(occupant) {
                let other = owners[occupant];
                return Err(PatchError::Collision {
                    universe: fixture.universe,
                    address: address as u16,
                    fixture: other.id.clone(),
                    fid: other.fid,
                    name: other.name.clone(),
                });
            }
        }
        map.mark(&fixture.id, fixture.address, channels);
        owners.insert(&fixture.id, fixture);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::FixtureType;

    fn lib() -> FixtureLibrary {
        FixtureLibrary::from_types(vec![FixtureType::new("four", "Generic", "RGBW", "4ch", 4)])
    }

    fn fixture(id: &str, fid: u32, universe: u16, address: u16) -> FixtureInstance {
        FixtureInstance {
            id: FixtureId::from(id),
            fid,
            name: format!("Par {fid}"),
            type_id: "four".to_string(),
            universe,
            address,
            color: String::new(),
            location: String::new(),
            is_fixed: false,
        }
    }

    #[test]
    fn test_range_boundary() {
        let index = OccupancyIndex::default();
        let err = check_collision(&index, 1, 510, 4, &HashSet::new()).unwrap_err();
        assert_eq!(
            err,
            PatchError::Range {
                universe: 1,
                address: 513
            }
        );
        assert!(check_collision(&index, 1, 509, 4, &HashSet::new()).is_ok());
    }

    #[test]
    fn test_collision_names_conflicting_fixture() {
        let index = OccupancyIndex::build(&[fixture("a", 7, 1, 10)], &lib());
        let err = check_collision(&index, 1, 8, 4, &HashSet::new()).unwrap_err();
        match err {
            PatchError::Collision {
                address, fid, name, ..
            } => {
                assert_eq!(address, 10);
                assert_eq!(fid, 7);
                assert_eq!(name, "Par 7");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_collision_respects_exclusion() {
        let index = OccupancyIndex::build(&[fixture("a", 7, 1, 10)], &lib());
        let exclude: HashSet<_> = [FixtureId::from("a")].into_iter().collect();
        assert!(check_collision(&index, 1, 8, 4, &exclude).is_ok());
    }

    #[test]
    fn test_address_zero_is_out_of_range() {
        let index = OccupancyIndex::default();
        assert!(matches!(
            check_collision(&index, 1, 0, 1, &HashSet::new()),
            Err(PatchError::Range { address: 0, .. })
        ));
    }

    #[test]
    fn test_validate_patch_detects_overlap_and_duplicates() {
        let ok = vec![fixture("a", 1, 1, 1), fixture("b", 2, 1, 5)];
        assert!(validate_patch(&ok, &lib(), 4).is_ok());

        let overlap = vec![fixture("a", 1, 1, 1), fixture("b", 2, 1, 4)];
        assert!(matches!(
            validate_patch(&overlap, &lib(), 4),
            Err(PatchError::Collision { fid: 1, .. })
        ));

        let dup = vec![fixture("a", 1, 1, 1), fixture("b", 1, 1, 5)];
        assert_eq!(
            validate_patch(&dup, &lib(), 4),
            Err(PatchError::DuplicateFid { fid: 1 })
        );

        let beyond = vec![fixture("a", 1, 5, 1)];
        assert!(matches!(
            validate_patch(&beyond, &lib(), 4),
            Err(PatchError::Capacity { universe: 5, .. })
        ));
    }

    #[test]
    fn test_validate_changed_ignores_unrelated_violations() {
        let fixtures = vec![
            fixture("a", 1, 1, 1),
            fixture("b", 2, 1, 2),
            fixture("c", 3, 2, 1),
        ];
        let changed: HashSet<_> = [FixtureId::from("c")].into_iter().collect();
        assert!(validate_changed(&fixtures, &changed, &lib(), 4).is_ok());
        let changed: HashSet<_> = [FixtureId::from("b")].into_iter().collect();
        assert!(validate_changed(&fixtures, &changed, &lib(), 4).is_err());
    }
}
