//! Sequential patch cursor
//!
//! Batch creation and bulk re-patching hand out FIDs and addresses from a
//! running (FID, universe, address) counter. The counter is a plain value
//! advanced by a pure step so the rollover and ceiling rules can be tested
//! on their own.

use crate::error::{PatchError, Result};
use crate::fixture::UNIVERSE_SIZE;

/// Running counters for sequential placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchCursor {
    /// Next FID to hand out
    pub fid: u32,
    /// Universe of the next placement
    pub universe: u32,
    /// Address of the next placement
    pub address: u16,
}

impl PatchCursor {
    /// Start a cursor
    pub fn new(fid: u32, universe: u16, address: u16) -> Self {
        Self {
            fid,
            universe: u32::from(universe),
            address,
        }
    }

    /// Universe of the next placement, failing past the ceiling
    pub fn placement_universe(&self, max_universes: u16) -> Result<u16> {
        if self.universe == 0 || self.universe > u32::from(max_universes) {
            return Err(PatchError::Capacity {
                universe: self.universe,
                max_universes,
            });
        }
        Ok(self.universe as u16)
    }

    /// Move to address 1 of the next universe if a footprint of `channels`
    /// slots would run past 512 from the current address.
    pub fn fit(self, channels: u16, max_universes: u16) -> Result<Self> {
        let end = u32::from(self.address) + u32::from(channels.max(1)) - 1;
        if self.address > 1 && end > u32::from(UNIVERSE_SIZE) {
            self.roll(max_universes)
        } else {
            Ok(self)
        }
    }

    /// Advance past a footprint of `channels` slots.
    ///
    /// When the next address passes 512 the cursor rolls to address 1 of the
    /// following universe, failing if that universe is past the ceiling.
    pub fn step(self, channels: u16, max_universes: u16) -> Result<Self> {
        let next = u32::from(self.address) + u32::from(channels);
        let cursor = self.step_fid()?;
        if next > u32::from(UNIVERSE_SIZE) {
            cursor.roll(max_universes)
        } else {
            Ok(Self {
                address: next as u16,
                ..cursor
            })
        }
    }

    /// Advance only the FID counter
    pub fn step_fid(self) -> Result<Self> {
        let fid = self
            .fid
            .checked_add(1)
            .ok_or_else(|| PatchError::InvalidParameter("FID counter overflow".to_string()))?;
        Ok(Self { fid, ..self })
    }

    fn roll(self, max_universes: u16) -> Result<Self> {
        let universe = self.universe + 1;
        if universe > u32::from(max_universes) {
            return Err(PatchError::Capacity {
                universe,
                max_universes,
            });
        }
        Ok(Self {
            universe,
            address: 1,
            ..self
        })
    }
}
