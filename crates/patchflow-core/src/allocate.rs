//! Sequential allocator
//!
//! Creates one or more fixtures of the same type with ascending FIDs and
//! contiguous addresses, rolling over into the next universe when one
//! fills up. A batch either lands completely or not at all.

use crate::collision::check_collision;
use crate::cursor::PatchCursor;
use crate::error::{PatchError, Result};
use crate::fixture::{manufacturer_color, FixtureId, FixtureInstance, TypeId};
use crate::library::FixtureLibrary;
use crate::occupancy::{Occupancy, OccupancyIndex};
use crate::registry::FidRegistry;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Parameters for creating a batch of fixtures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequest {
    /// FID of the first fixture
    pub start_fid: u32,
    /// Universe of the first fixture
    pub start_universe: u16,
    /// Address of the first fixture
    pub start_address: u16,
    /// Number of fixtures to create
    pub quantity: u32,
    /// Fixture type of every fixture in the batch
    pub type_id: TypeId,
    /// Base display name; a sequence number is appended
    pub base_name: String,
    /// Location label
    pub location: String,
    /// Fixed installation flag
    pub is_fixed: bool,
}

impl AllocationRequest {
    /// A single fixture of `type_id` at `universe.address`
    pub fn single(
        fid: u32,
        universe: u16,
        address: u16,
        type_id: impl Into<TypeId>,
        base_name: impl Into<String>,
    ) -> Self {
        Self {
            start_fid: fid,
            start_universe: universe,
            start_address: address,
            quantity: 1,
            type_id: type_id.into(),
            base_name: base_name.into(),
            location: String::new(),
            is_fixed: false,
        }
    }

    /// Same request with a different quantity
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Same request with a location label
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }
}

/// Synthesize the instances for a batch against the existing set.
///
/// Returns only the new instances; the caller appends them to the set.
pub fn allocate(
    request: &AllocationRequest,
    fixtures: &[FixtureInstance],
    library: &FixtureLibrary,
    max_universes: u16,
) -> Result<Vec<FixtureInstance>> {
    let base_name = request.base_name.as_str();
    if base_name.trim().is_empty() {
        return Err(PatchError::InvalidParameter(
            "fixture name must not be empty".to_string(),
        ));
    }
    if request.start_fid == 0 {
        return Err(PatchError::InvalidParameter(
            "FID must be a positive number".to_string(),
        ));
    }
    if request.quantity == 0 {
        return Err(PatchError::InvalidParameter(
            "quantity must be at least 1".to_string(),
        ));
    }
    let fixture_type = library
        .get(&request.type_id)
        .ok_or_else(|| PatchError::TypeNotFound(request.type_id.clone()))?;
    let channels = fixture_type.channels;
    let color = manufacturer_color(&fixture_type.manufacturer);
    let first_seq = next_sequence_number(&request.type_id, base_name, fixtures);

    let no_exclusions = HashSet::new();
    let mut index = OccupancyIndex::build(fixtures, library);
    let mut registry = FidRegistry::new(fixtures, &no_exclusions);
    let mut cursor = PatchCursor::new(
        request.start_fid,
        request.start_universe,
        request.start_address,
    );
    let mut created = Vec::with_capacity(request.quantity as usize);

    for i in 0..request.quantity {
        // The first fixture goes exactly where it was asked for.
        if i > 0 {
            cursor = cursor.fit(channels, max_universes)?;
        }
        let universe = cursor.placement_universe(max_universes)?;
        registry.claim(cursor.fid)?;
        check_collision(&index, universe, cursor.address, channels, &no_exclusions)?;

        let instance = FixtureInstance {
            id: FixtureId::generate(),
            fid: cursor.fid,
            name: format!("{} {}", base_name, first_seq + i),
            type_id: request.type_id.clone(),
            universe,
            address: cursor.address,
            color: color.to_string(),
            location: request.location.clone(),
            is_fixed: request.is_fixed,
        };
        // Later batch members must see earlier ones as occupied.
        index.insert(&instance, channels);
        created.push(instance);
        cursor = cursor.step(channels, max_universes)?;
    }

    debug!(
        "Allocated {} x {} from FID {} at {}.{}",
        created.len(),
        fixture_type.group_key(),
        request.start_fid,
        request.start_universe,
        request.start_address
    );
    Ok(created)
}

/// Next display sequence number for `base_name` among fixtures of a type.
///
/// Continues from the highest `"{base_name} N"` suffix. When no suffix is
/// found the sequence starts after the count of same-type fixtures.
pub fn next_sequence_number(
    type_id: &str,
    base_name: &str,
    fixtures: &[FixtureInstance],
) -> u32 {
    let same_type: Vec<_> = fixtures.iter().filter(|f| f.type_id == type_id).collect();
    if same_type.is_empty() {
        return 1;
    }
    let highest = same_type
        .iter()
        .filter_map(|f| {
            let suffix = f.name.strip_prefix(base_name)?.strip_prefix(' ')?;
            if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            suffix.parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0);
    if highest > 0 {
        highest + 1
    } else {
        same_type.len() as u32 + 1
    }
}

/// Non-fatal remark attached to an address suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionWarning {
    /// Only a single footprint fits contiguously; the batch may fail
    BatchMayNotFit {
        /// Requested batch size
        quantity: u32,
    },
}

/// Result of a next-free address search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSuggestion {
    /// Suggested start address
    pub address: u16,
    /// Present when only the fallback search succeeded
    pub warning: Option<SuggestionWarning>,
}

/// Suggest a start address for `quantity` fixtures of `channels` slots.
///
/// Looks for room for the whole batch first, then for a single footprint
/// (with a warning when `quantity > 1`). Fails when not even one footprint
/// fits.
pub fn suggest_address(
    occupancy: &Occupancy,
    channels: u16,
    quantity: u32,
    exclude: &HashSet<FixtureId>,
) -> Result<AddressSuggestion> {
    let total = u32::from(channels).saturating_mul(quantity.max(1));
    if let Ok(total) = u16::try_from(total) {
        if let Some(address) = occupancy.find_free_run(total, exclude) {
            return Ok(AddressSuggestion {
                address,
                warning: None,
            });
        }
    }
    match occupancy.find_free_run(channels, exclude) {
        Some(address) => {
            let warning = (quantity > 1).then_some(SuggestionWarning::BatchMayNotFit { quantity });
            if warning.is_some() {
                warn!(
                    "Universe {} has no contiguous room for {} fixtures; patch may fail",
                    occupancy.universe(),
                    quantity
                );
            }
            Ok(AddressSuggestion { address, warning })
        }
        None => Err(PatchError::NoFreeRun {
            universe: occupancy.universe(),
            channels,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::FixtureType;
    use crate::occupancy::occupancy;

    fn lib() -> FixtureLibrary {
        FixtureLibrary::from_types(vec![
            FixtureType::new("big", "Acme", "Big", "200ch", 200),
            FixtureType::new("par", "Acme", "Par", "4ch", 4),
        ])
    }

    #[test]
    fn test_batch_rolls_into_next_universe() {
        let req = AllocationRequest::single(1, 1, 1, "big", "Big").with_quantity(3);
        let created = allocate(&req, &[], &lib(), 2).unwrap();
        let placements: Vec<_> = created.iter().map(|f| (f.universe, f.address)).collect();
        assert_eq!(placements, vec![(1, 1), (1, 201), (2, 1)]);
        let fids: Vec<_> = created.iter().map(|f| f.fid).collect();
        assert_eq!(fids, vec![1, 2, 3]);
        assert_eq!(created[2].name, "Big 3");
    }

    #[test]
    fn test_batch_past_ceiling_is_rejected() {
        let req = AllocationRequest::single(1, 1, 1, "big", "Big").with_quantity(3);
        assert_eq!(
            allocate(&req, &[], &lib(), 1),
            Err(PatchError::Capacity {
                universe: 2,
                max_universes: 1
            })
        );
    }

    #[test]
    fn test_batch_rolling_past_last_universe_is_rejected() {
        // The last fixture fills slot 512, so the counter rolls into universe 2.
        let req = AllocationRequest::single(1, 1, 1, "par", "Par").with_quantity(128);
        assert_eq!(
            allocate(&req, &[], &lib(), 1),
            Err(PatchError::Capacity {
                universe: 2,
                max_universes: 1
            })
        );
        let req = AllocationRequest::single(1, 1, 1, "par", "Par").with_quantity(127);
        let created = allocate(&req, &[], &lib(), 1).unwrap();
        assert_eq!(created[126].address, 505);
    }

    #[test]
    fn test_first_fixture_is_not_moved() {
        let req = AllocationRequest::single(1, 1, 401, "big", "Big");
        assert_eq!(
            allocate(&req, &[], &lib(), 2),
            Err(PatchError::Range {
                universe: 1,
                address: 513
            })
        );
    }

    #[test]
    fn test_name_is_numbered_as_given() {
        let req = AllocationRequest::single(1, 1, 1, "par", " Par").with_quantity(2);
        let created = allocate(&req, &[], &lib(), 1).unwrap();
        assert_eq!(created[0].name, " Par 1");
        assert_eq!(created[1].name, " Par 2");
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let req = AllocationRequest::single(0, 1, 1, "par", "Par");
        assert!(matches!(
            allocate(&req, &[], &lib(), 1),
            Err(PatchError::InvalidParameter(_))
        ));
        let req = AllocationRequest::single(1, 1, 1, "par", "  ");
        assert!(allocate(&req, &[], &lib(), 1).is_err());
        let req = AllocationRequest::single(1, 1, 1, "nope", "Par");
        assert_eq!(
            allocate(&req, &[], &lib(), 1),
            Err(PatchError::TypeNotFound("nope".to_string()))
        );
    }

    #[test]
    fn test_sequence_number_continues_suffix() {
        let first = allocate(
            &AllocationRequest::single(1, 1, 1, "par", "Par").with_quantity(2),
            &[],
            &lib(),
            1,
        )
        .unwrap();
        assert_eq!(next_sequence_number("par", "Par", &first), 3);
        assert_eq!(next_sequence_number("par", "Wash", &first), 3);
        assert_eq!(next_sequence_number("big", "Par", &first), 1);
    }

    #[test]
    fn test_sequence_number_ignores_partial_matches() {
        let mut fixtures = allocate(
            &AllocationRequest::single(1, 1, 1, "par", "Par").with_quantity(1),
            &[],
            &lib(),
            1,
        )
        .unwrap();
        fixtures[0].name = "Par 7b".to_string();
        assert_eq!(next_sequence_number("par", "Par", &fixtures), 2);
    }

    #[test]
    fn test_suggestion_falls_back_to_single_footprint() {
        let existing = allocate(
            &AllocationRequest::single(1, 1, 100, "big", "Big").with_quantity(2),
            &[],
            &lib(),
            1,
        )
        .unwrap();
        // free: 1..=99 and 500..=512
        let map = occupancy(1, &existing, &lib());
        let s = suggest_address(&map, 4, 10, &HashSet::new()).unwrap();
        assert_eq!(s.address, 1);
        assert!(s.warning.is_none());

        let s = suggest_address(&map, 4, 30, &HashSet::new()).unwrap();
        assert_eq!(s.address, 1);
        assert_eq!(
            s.warning,
            Some(SuggestionWarning::BatchMayNotFit { quantity: 30 })
        );

        assert_eq!(
            suggest_address(&map, 200, 1, &HashSet::new()),
            Err(PatchError::NoFreeRun {
                universe: 1,
                channels: 200
            })
        );
    }
}
