//! Error types for the patch engine

use crate::fixture::FixtureId;
use thiserror::Error;

/// Errors raised by placement, allocation and editing operations.
///
/// Every variant is recoverable: the operation that produced it has not
/// touched the fixture set it was computed from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// Footprint extends past slot 512 (or starts before slot 1)
    #[error("Address {address} out of range in universe {universe} (max 512)")]
    Range {
        /// Universe being patched
        universe: u16,
        /// Offending absolute address
        address: u32,
    },

    /// Footprint overlaps another fixture
    #[error("DMX collision at {universe}.{address} with {name} (FID {fid})")]
    Collision {
        /// Universe of the collision
        universe: u16,
        /// First conflicting address
        address: u16,
        /// Identity of the fixture already occupying the slot
        fixture: FixtureId,
        /// FID of the conflicting fixture
        fid: u32,
        /// Display name of the conflicting fixture
        name: String,
    },

    /// FID already used outside the set being edited
    #[error("FID {fid} is already in use")]
    DuplicateFid {
        /// The duplicated FID
        fid: u32,
    },

    /// Placement would need a universe beyond the configured ceiling
    #[error("Universe {universe} exceeds the limit of {max_universes} universes")]
    Capacity {
        /// Universe that would have been required
        universe: u32,
        /// Configured ceiling
        max_universes: u16,
    },

    /// No run of free slots large enough for a single footprint
    #[error("Universe {universe} is full or has no room for {channels} channels")]
    NoFreeRun {
        /// Universe that was searched
        universe: u16,
        /// Footprint that was requested
        channels: u16,
    },

    /// Referenced fixture type does not resolve
    #[error("Fixture type not found: {0}")]
    TypeNotFound(String),

    /// Referenced fixture instance does not resolve
    #[error("Fixture not found: {0}")]
    FixtureNotFound(FixtureId),

    /// Invalid operation argument
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for patch operations
pub type Result<T> = std::result::Result<T, PatchError>;
