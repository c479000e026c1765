//! FID registry
//!
//! "The rest of the patch" is always the complement of the instances
//! currently being written.

use crate::error::{PatchError, Result};
use crate::fixture::{FixtureId, FixtureInstance};
use std::collections::HashSet;

/// Whether `fid` is unused by every instance outside `exclude`
pub fn is_fid_available(
    fid: u32,
    exclude: &HashSet<FixtureId>,
    fixtures: &[FixtureInstance],
) -> bool {
    !fixtures
        .iter()
        .any(|f| f.fid == fid && !exclude.contains(&f.id))
}

/// FIDs taken by the complement of an editing set, plus any claimed since.
#[derive(Debug, Clone, Default)]
pub struct FidRegistry {
    taken: HashSet<u32>,
}

impl FidRegistry {
    /// Registry over every instance not in `exclude`
    pub fn new(fixtures: &[FixtureInstance], exclude: &HashSet<FixtureId>) -> Self {
        Self {
            taken: fixtures
                .iter()
                .filter(|f| !exclude.contains(&f.id))
                .map(|f| f.fid)
                .collect(),
        }
    }

    /// Whether `fid` is free
    pub fn is_available(&self, fid: u32) -> bool {
        !self.taken.contains(&fid)
    }

    /// Reserve `fid`, failing if it is already taken
    pub fn claim(&mut self, fid: u32) -> Result<()> {
        if self.taken.insert(fid) {
            Ok(())
        } else {
            Err(PatchError::DuplicateFid { fid })
        }
    }
}
