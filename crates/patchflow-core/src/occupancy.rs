//! Occupancy index
//!
//! Derives, from the current fixture set and type table, which fixture
//! occupies each slot of a universe. The index is a pure function of its
//! inputs and is rebuilt on every query instead of being maintained
//! incrementally.

use crate::fixture::{FixtureId, FixtureInstance, UNIVERSE_SIZE};
use crate::library::FixtureLibrary;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Slot map of a single universe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupancy {
    universe: u16,
    slots: Vec<Option<FixtureId>>,
}

impl Occupancy {
    /// An empty universe
    pub fn empty(universe: u16) -> Self {
        Self {
            universe,
            slots: vec![None; UNIVERSE_SIZE as usize],
        }
    }

    /// Universe number this map describes
    pub fn universe(&self) -> u16 {
        self.universe
    }

    /// All 512 slots, index 0 is address 1
    pub fn slots(&self) -> &[Option<FixtureId>] {
        &self.slots
    }

    /// Occupant of a 1-based address, `None` when free or out of range
    pub fn occupant(&self, address: u32) -> Option<&FixtureId> {
        if address == 0 {
            return None;
        }
        self.slots
            .get(address as usize - 1)
            .and_then(|slot| slot.as_ref())
    }

    /// Number of occupied slots
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Percentage of the universe in use, rounded
    pub fn usage_percent(&self) -> u8 {
        ((self.occupied_count() * 100 + UNIVERSE_SIZE as usize / 2) / UNIVERSE_SIZE as usize) as u8
    }

    /// Mark `channels` slots starting at `address`. Slots beyond 512 are dropped.
    pub(crate) fn mark(&mut self, id: &FixtureId, address: u16, channels: u16) {
        let start = usize::from(address.max(1)) - 1;
        let end = (start + usize::from(channels)).min(self.slots.len());
        for slot in &mut self.slots[start.min(end)..end] {
            *slot = Some(id.clone());
        }
    }

    /// First-fit search for `needed` contiguous free slots.
    ///
    /// A slot is free when unoccupied or occupied by an identity in
    /// `exclude`. Returns the 1-based start address of the first run that
    /// reaches `needed`, scanning left to right.
    pub fn find_free_run(&self, needed: u16, exclude: &HashSet<FixtureId>) -> Option<u16> {
        if needed == 0 || needed > UNIVERSE_SIZE {
            return None;
        }
        let mut run = 0u16;
        let mut start = 1u16;
        for (i, slot) in self.slots.iter().enumerate() {
            let free = match slot {
                None => true,
                Some(id) => exclude.contains(id),
            };
            if !free {
                run = 0;
                continue;
            }
            if run == 0 {
                start = i as u16 + 1;
            }
            run += 1;
            if run >= needed {
                return Some(start);
            }
        }
        None
    }
}

/// Build the slot map of one universe from a fixture set.
///
/// Instances whose type does not resolve are skipped.
pub fn occupancy(
    universe: u16,
    fixtures: &[FixtureInstance],
    library: &FixtureLibrary,
) -> Occupancy {
    let mut map = Occupancy::empty(universe);
    for fixture in fixtures.iter().filter(|f| f.universe == universe) {
        match library.channels(&fixture.type_id) {
            Some(channels) => map.mark(&fixture.id, fixture.address, channels),
            None => debug!(
                "Skipping {} in occupancy: unknown type {}",
                fixture.id,
                fixture.type_id
            ),
        }
    }
    map
}

/// First-fit search over a universe map. See [`Occupancy::find_free_run`].
pub fn find_free_run(
    occupancy: &Occupancy,
    needed: u16,
    exclude: &HashSet<FixtureId>,
) -> Option<u16> {
    occupancy.find_free_run(needed, exclude)
}

/// Owner details used for collision messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    /// FID of the occupying fixture
    pub fid: u32,
    /// Display name of the occupying fixture
    pub name: String,
}

/// Occupancy of every universe in use, plus who owns each identity.
///
/// Universes with no fixtures are reported as empty maps on lookup.
#[derive(Debug, Clone, Default)]
pub struct OccupancyIndex {
    universes: BTreeMap<u16, Occupancy>,
    owners: HashMap<FixtureId, Owner>,
}

impl OccupancyIndex {
    /// Build the index for a whole fixture set
    pub fn build(fixtures: &[FixtureInstance], library: &FixtureLibrary) -> Self {
        let mut index = Self::default();
        for fixture in fixtures {
            match library.channels(&fixture.type_id) {
                Some(channels) => index.insert(fixture, channels),
                None => debug!(
                    "Skipping {} in occupancy index: unknown type {}",
                    fixture.id,
                    fixture.type_id
                ),
            }
        }
        index
    }

    /// Record an instance with the given footprint
    pub fn insert(&mut self, fixture: &FixtureInstance, channels: u16) {
        self.universes
            .entry(fixture.universe)
            .or_insert_with(|| Occupancy::empty(fixture.universe))
            .mark(&fixture.id, fixture.address, channels);
        self.owners.insert(
            fixture.id.clone(),
            Owner {
                fid: fixture.fid,
                name: fixture.name.clone(),
            },
        );
    }

    /// Slot map of a universe (empty if nothing is patched there)
    pub fn universe(&self, universe: u16) -> Occupancy {
        self.universes
            .get(&universe)
            .cloned()
            .unwrap_or_else(|| Occupancy::empty(universe))
    }

    /// Occupant of `universe.address`
    pub fn occupant(&self, universe: u16, address: u32) -> Option<&FixtureId> {
        self.universes
            .get(&universe)
            .and_then(|map| map.occupant(address))
    }

    /// Owner details for an identity
    pub fn owner(&self, id: &FixtureId) -> Option<&Owner> {
        self.owners.get(id)
    }

    /// Universes that hold at least one fixture
    pub fn used_universes(&self) -> impl Iterator<Item = u16> + '_ {
        self.universes.keys().copied()
    }
}
