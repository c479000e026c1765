//! PatchFlow I/O - Patch and Library Files
//!
//! - [`patch_file`]: patch snapshots (fixtures, show name, universe ceiling)
//! - [`library_file`]: fixture type libraries, merged on import
//! - [`report`]: plain-text patch reports
//!
//! JSON and RON are selected by file extension.

#![warn(missing_docs)]

pub mod error;
pub mod format;
pub mod library_file;
pub mod patch_file;
pub mod report;

pub use error::{IoError, Result};
pub use format::{FileFormat, MAX_FILE_SIZE};
pub use library_file::{export_library, import_library, parse_library_json, LibraryFile};
pub use patch_file::{load_patch, save_patch, PatchFile, PATCH_FILE_VERSION};
pub use report::render_text;
