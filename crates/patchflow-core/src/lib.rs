//! PatchFlow Core - DMX Patch Engine
//!
//! This crate assigns multi-channel lighting fixtures to addresses in a set
//! of 512-slot DMX universes and keeps the patch consistent:
//! - Occupancy index derived from the fixture set on every query
//! - First-fit free address search
//! - Collision and range validation
//! - Sequential batch allocation with universe rollover
//! - Atomic bulk re-patch of a selection
//! - FID uniqueness registry
//!
//! Every operation computes a complete candidate fixture set. The [`Patch`]
//! store only changes when a candidate is committed, so a rejected
//! operation never leaves a partial write behind.
//!
//! ## Quick Start
//!
//! ```rust
//! use patchflow_core::{AllocationRequest, Patch};
//!
//! # fn main() -> patchflow_core::Result<()> {
//! let mut patch = Patch::default();
//! let request = AllocationRequest::single(101, 1, 1, "generic-rgb", "Front Par").with_quantity(4);
//! let ids = patch.add_fixtures(&request)?;
//! assert_eq!(ids.len(), 4);
//! assert_eq!(patch.occupancy(1).occupied_count(), 12);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod allocate;
pub mod bulk;
pub mod collision;
pub mod config;
pub mod cursor;
pub mod error;
pub mod fixture;
pub mod library;
pub mod logging;
pub mod occupancy;
pub mod patch;
pub mod registry;
pub mod report;
pub mod sort;

// --- Re-exports grouped by category ---

// Data model
pub use fixture::{manufacturer_color, FixtureId, FixtureInstance, FixtureType, TypeId, UNIVERSE_SIZE};
pub use library::{CustomType, FixtureLibrary, ImportedType};

// Engine
pub use allocate::{
    allocate, next_sequence_number, suggest_address, AddressSuggestion, AllocationRequest,
    SuggestionWarning,
};
pub use bulk::{apply_bulk_edit, BulkEdit, BulkName, Placement};
pub use collision::{check_collision, validate_changed, validate_patch};
pub use cursor::PatchCursor;
pub use occupancy::{find_free_run, occupancy, Occupancy, OccupancyIndex, Owner};
pub use registry::{is_fid_available, FidRegistry};

// Store, ordering and reporting
pub use patch::{FixtureEdit, Patch, PatchStats, UniverseUsage};
pub use report::{PatchReport, ReportOptions, ReportRow};
pub use sort::{matches_filter, ListSort, ListSortKey, SortDirection, SortMode};

// Configuration & errors
pub use config::{PatchConfig, MAX_UNIVERSE_CEILING};
pub use error::{PatchError, Result};
pub use logging::LogConfig;
