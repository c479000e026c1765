//! Patch store
//!
//! [`Patch`] owns the active fixture set, the type library and the
//! configuration. Every operation reads the store, computes a complete
//! candidate fixture set and returns it; nothing is written until the
//! candidate is handed back to [`Patch::commit`]. A failed operation
//! therefore leaves the store exactly as it was.

use crate::allocate::{allocate, suggest_address, AddressSuggestion, AllocationRequest};
use crate::bulk::{apply_bulk_edit, BulkEdit};
use crate::collision::{check_collision, validate_changed, validate_patch};
use crate::config::PatchConfig;
use crate::error::{PatchError, Result};
use crate::fixture::{manufacturer_color, FixtureId, FixtureInstance, TypeId};
use crate::library::FixtureLibrary;
use crate::occupancy::{occupancy, Occupancy, OccupancyIndex};
use crate::registry::is_fid_available;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

/// New values for a single fixture edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureEdit {
    /// Fixture ID
    pub fid: u32,
    /// Display name
    pub name: String,
    /// Fixture type
    pub type_id: TypeId,
    /// Universe
    pub universe: u16,
    /// Start address
    pub address: u16,
    /// Location label
    pub location: String,
    /// Fixed installation flag
    pub is_fixed: bool,
}

impl FixtureEdit {
    /// Edit pre-filled with the fixture's current values
    pub fn from_fixture(fixture: &FixtureInstance) -> Self {
        Self {
            fid: fixture.fid,
            name: fixture.name.clone(),
            type_id: fixture.type_id.clone(),
            universe: fixture.universe,
            address: fixture.address,
            location: fixture.location.clone(),
            is_fixed: fixture.is_fixed,
        }
    }
}

/// Slot usage of one universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseUsage {
    /// Universe number
    pub universe: u16,
    /// Occupied slots
    pub occupied: usize,
    /// Occupied share of the 512 slots, rounded
    pub percent: u8,
}

/// Summary figures for the whole patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchStats {
    /// Number of fixtures
    pub fixture_count: usize,
    /// Sum of resolvable footprints
    pub total_parameters: u64,
    /// Distinct universes with at least one fixture
    pub universes_used: usize,
    /// Per-universe usage in ascending universe order
    pub universes: Vec<UniverseUsage>,
}

/// The active patch: fixtures, type library and configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Show name
    pub show_name: String,
    fixtures: Vec<FixtureInstance>,
    library: FixtureLibrary,
    config: PatchConfig,
}

impl Default for Patch {
    fn default() -> Self {
        Self::new(FixtureLibrary::builtin(), PatchConfig::default())
    }
}

impl Patch {
    /// Create an empty patch
    pub fn new(library: FixtureLibrary, config: PatchConfig) -> Self {
        Self {
            show_name: "New Show".to_string(),
            fixtures: Vec::new(),
            library,
            config,
        }
    }

    /// Active fixtures
    pub fn fixtures(&self) -> &[FixtureInstance] {
        &self.fixtures
    }

    /// Type library
    pub fn library(&self) -> &FixtureLibrary {
        &self.library
    }

    /// Mutable type library
    pub fn library_mut(&mut self) -> &mut FixtureLibrary {
        &mut self.library
    }

    /// Configuration
    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// Universe ceiling
    pub fn max_universes(&self) -> u16 {
        self.config.max_universes
    }

    /// Change the universe ceiling
    pub fn set_max_universes(&mut self, max_universes: u16) -> Result<()> {
        let config = PatchConfig {
            max_universes,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Look up a fixture
    pub fn fixture(&self, id: &FixtureId) -> Option<&FixtureInstance> {
        self.fixtures.iter().find(|f| &f.id == id)
    }

    /// Look up a fixture by FID
    pub fn fixture_by_fid(&self, fid: u32) -> Option<&FixtureInstance> {
        self.fixtures.iter().find(|f| f.fid == fid)
    }

    /// Slot map of one universe
    pub fn occupancy(&self, universe: u16) -> Occupancy {
        occupancy(universe, &self.fixtures, &self.library)
    }

    /// Slot maps of every universe in use
    pub fn occupancy_index(&self) -> OccupancyIndex {
        OccupancyIndex::build(&self.fixtures, &self.library)
    }

    /// Check a footprint placement against the current patch
    pub fn check_collision(
        &self,
        universe: u16,
        address: u16,
        channels: u16,
        exclude: &HashSet<FixtureId>,
    ) -> Result<()> {
        check_collision(&self.occupancy_index(), universe, address, channels, exclude)
    }

    /// Whether `fid` is free outside `exclude`
    pub fn is_fid_available(&self, fid: u32, exclude: &HashSet<FixtureId>) -> bool {
        is_fid_available(fid, exclude, &self.fixtures)
    }

    /// Next free address for `quantity` fixtures of a type in `universe`.
    ///
    /// `editing` is treated as free so a fixture can move into its own slots.
    pub fn suggest_address(
        &self,
        universe: u16,
        type_id: &str,
        quantity: u32,
        editing: Option<&FixtureId>,
    ) -> Result<AddressSuggestion> {
        let channels = self
            .library
            .channels(type_id)
            .ok_or_else(|| PatchError::TypeNotFound(type_id.to_string()))?;
        let exclude: HashSet<FixtureId> = editing.cloned().into_iter().collect();
        let quantity = if editing.is_some() { 1 } else { quantity };
        suggest_address(&self.occupancy(universe), channels, quantity, &exclude)
    }

    /// Candidate set with a new batch appended
    pub fn plan_allocation(&self, request: &AllocationRequest) -> Result<Vec<FixtureInstance>> {
        let created = allocate(
            request,
            &self.fixtures,
            &self.library,
            self.config.max_universes,
        )?;
        let mut candidate = self.fixtures.clone();
        candidate.extend(created);
        Ok(candidate)
    }

    /// Candidate set with one fixture edited
    pub fn plan_edit(&self, id: &FixtureId, edit: &FixtureEdit) -> Result<Vec<FixtureInstance>> {
        let position = self
            .fixtures
            .iter()
            .position(|f| &f.id == id)
            .ok_or_else(|| PatchError::FixtureNotFound(id.clone()))?;
        let fixture_type = self
            .library
            .get(&edit.type_id)
            .ok_or_else(|| PatchError::TypeNotFound(edit.type_id.clone()))?;
        if edit.fid == 0 {
            return Err(PatchError::InvalidParameter(
                "FID must be a positive number".to_string(),
            ));
        }

        let this: HashSet<FixtureId> = [id.clone()].into_iter().collect();
        if !self.is_fid_available(edit.fid, &this) {
            return Err(PatchError::DuplicateFid { fid: edit.fid });
        }
        if edit.universe == 0 || edit.universe > self.config.max_universes {
            return Err(PatchError::Capacity {
                universe: u32::from(edit.universe),
                max_universes: self.config.max_universes,
            });
        }
        self.check_collision(edit.universe, edit.address, fixture_type.channels, &this)?;

        let mut candidate = self.fixtures.clone();
        let fixture = &mut candidate[position];
        fixture.fid = edit.fid;
        fixture.name = edit.name.clone();
        fixture.type_id = edit.type_id.clone();
        fixture.universe = edit.universe;
        fixture.address = edit.address;
        fixture.color = manufacturer_color(&fixture_type.manufacturer).to_string();
        fixture.location = edit.location.clone();
        fixture.is_fixed = edit.is_fixed;

        validate_changed(
            &candidate,
            &this,
            &self.library,
            self.config.max_universes,
        )?;
        Ok(candidate)
    }

    /// Candidate set after a bulk edit over `targets` in the given order
    pub fn plan_bulk_edit(
        &self,
        targets: &[FixtureId],
        edit: &BulkEdit,
    ) -> Result<Vec<FixtureInstance>> {
        apply_bulk_edit(
            targets,
            edit,
            &self.fixtures,
            &self.library,
            self.config.max_universes,
        )
    }

    /// Candidate set without the given fixtures. Unknown ids are ignored.
    pub fn plan_removal(&self, ids: &HashSet<FixtureId>) -> Vec<FixtureInstance> {
        self.fixtures
            .iter()
            .filter(|f| !ids.contains(&f.id))
            .cloned()
            .collect()
    }

    /// Replace the fixture set with a committed candidate
    pub fn commit(&mut self, fixtures: Vec<FixtureInstance>) {
        info!(
            "Committed patch: {} -> {} fixtures",
            self.fixtures.len(),
            fixtures.len()
        );
        self.fixtures = fixtures;
    }

    /// Create fixtures and commit; returns the ids of the new fixtures
    pub fn add_fixtures(&mut self, request: &AllocationRequest) -> Result<Vec<FixtureId>> {
        let before = self.fixtures.len();
        let candidate = self.plan_allocation(request).map_err(|e| {
            warn!("Fixture creation rejected: {}", e);
            e
        })?;
        let ids = candidate[before..].iter().map(|f| f.id.clone()).collect();
        self.commit(candidate);
        Ok(ids)
    }

    /// Edit one fixture and commit
    pub fn edit_fixture(&mut self, id: &FixtureId, edit: &FixtureEdit) -> Result<()> {
        let candidate = self.plan_edit(id, edit).map_err(|e| {
            warn!("Edit of {} rejected: {}", id, e);
            e
        })?;
        self.commit(candidate);
        Ok(())
    }

    /// Bulk edit and commit
    pub fn bulk_edit(&mut self, targets: &[FixtureId], edit: &BulkEdit) -> Result<()> {
        let candidate = self.plan_bulk_edit(targets, edit).map_err(|e| {
            warn!("Bulk edit rejected: {}", e);
            e
        })?;
        self.commit(candidate);
        Ok(())
    }

    /// Remove one fixture. Returns whether it existed.
    pub fn remove_fixture(&mut self, id: &FixtureId) -> bool {
        let ids: HashSet<FixtureId> = [id.clone()].into_iter().collect();
        self.remove_fixtures(&ids) == 1
    }

    /// Remove several fixtures. Returns how many were removed.
    pub fn remove_fixtures(&mut self, ids: &HashSet<FixtureId>) -> usize {
        let candidate = self.plan_removal(ids);
        let removed = self.fixtures.len() - candidate.len();
        self.commit(candidate);
        removed
    }

    /// Replace the whole fixture set, as on snapshot import.
    ///
    /// Imported data is taken as-is; the occupancy index tolerates
    /// unresolved types and out-of-range footprints.
    pub fn replace_fixtures(&mut self, fixtures: Vec<FixtureInstance>) {
        if let Err(e) = validate_patch(&fixtures, &self.library, self.config.max_universes) {
            warn!("Imported patch is inconsistent: {}", e);
        }
        self.commit(fixtures);
    }

    /// Remove every fixture
    pub fn reset(&mut self) {
        self.commit(Vec::new());
    }

    /// Summary figures
    pub fn stats(&self) -> PatchStats {
        let total_parameters = self
            .fixtures
            .iter()
            .filter_map(|f| self.library.channels(&f.type_id))
            .map(u64::from)
            .sum();
        let universes_used = self
            .fixtures
            .iter()
            .map(|f| f.universe)
            .collect::<HashSet<_>>()
            .len();
        let index = self.occupancy_index();
        let universes = index
            .used_universes()
            .map(|universe| {
                let map = index.universe(universe);
                UniverseUsage {
                    universe,
                    occupied: map.occupied_count(),
                    percent: map.usage_percent(),
                }
            })
            .collect();
        PatchStats {
            fixture_count: self.fixtures.len(),
            total_parameters,
            universes_used,
            universes,
        }
    }
}
