use clap::{Args, Parser, Subcommand, ValueEnum};
use patchflow_core::{ListSortKey, Placement, SortDirection, SortMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "patchflow")]
#[command(about = "Patch lighting fixtures into DMX universes")]
#[command(version)]
pub struct Cli {
    /// Patch file to operate on (created on first write)
    #[arg(short, long, default_value = "patch.json")]
    pub patch: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Fixture library file merged over the built-in types
    #[arg(short, long)]
    pub library: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create one or more fixtures of a type
    Add(AddArgs),
    /// Edit a single fixture
    Edit(EditArgs),
    /// Apply changes to a selection of fixtures
    Bulk(BulkArgs),
    /// Remove fixtures by FID
    Remove {
        /// FIDs to remove
        #[arg(required = true, value_delimiter = ',')]
        fids: Vec<u32>,
    },
    /// List fixtures
    List(ListArgs),
    /// Show the slot map of a universe
    Sheet {
        /// Universe to show
        #[arg(short, long, default_value_t = 1)]
        universe: u16,
    },
    /// Find the next free address for a type
    Free {
        /// Universe to search
        #[arg(short, long, default_value_t = 1)]
        universe: u16,
        /// Fixture type id
        #[arg(short = 't', long = "type")]
        type_id: String,
        /// Number of fixtures that should fit
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Print patch statistics
    Stats,
    /// Write a sorted patch report
    Report(ReportArgs),
    /// Replace the patch with the contents of another patch file
    Import {
        /// Patch file to import
        file: PathBuf,
    },
    /// Remove every fixture
    Reset,
    /// Manage the fixture library
    #[command(subcommand)]
    Library(LibraryCommand),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Fixture type id
    #[arg(short = 't', long = "type")]
    pub type_id: String,
    /// FID of the first fixture
    #[arg(short, long)]
    pub fid: u32,
    /// Base name (defaults to the type's model name)
    #[arg(short, long)]
    pub name: Option<String>,
    /// Universe of the first fixture
    #[arg(short, long, default_value_t = 1)]
    pub universe: u16,
    /// Address of the first fixture
    #[arg(short, long, conflicts_with = "next_free")]
    pub address: Option<u16>,
    /// Start at the first free address in the universe
    #[arg(long)]
    pub next_free: bool,
    /// Number of fixtures
    #[arg(short, long, default_value_t = 1)]
    pub quantity: u32,
    /// Location label
    #[arg(long)]
    pub location: Option<String>,
    /// Mark as part of the fixed installation
    #[arg(long)]
    pub fixed: bool,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// FID of the fixture to edit
    pub fid: u32,
    /// New FID
    #[arg(long)]
    pub new_fid: Option<u32>,
    /// New name
    #[arg(long)]
    pub name: Option<String>,
    /// New fixture type id
    #[arg(long = "type")]
    pub type_id: Option<String>,
    /// New universe
    #[arg(long)]
    pub universe: Option<u16>,
    /// New address
    #[arg(long, conflicts_with = "next_free")]
    pub address: Option<u16>,
    /// Move to the first free address (own slots count as free)
    #[arg(long)]
    pub next_free: bool,
    /// New location
    #[arg(long)]
    pub location: Option<String>,
    /// Fixed installation flag
    #[arg(long)]
    pub fixed: Option<bool>,
}

#[derive(Args, Debug)]
pub struct BulkArgs {
    /// FIDs to change (defaults to every fixture)
    #[arg(long, value_delimiter = ',')]
    pub fids: Vec<u32>,
    /// Order in which the selection receives sequential values
    #[arg(long, value_enum, default_value_t = SortKeyArg::Patch)]
    pub order: SortKeyArg,
    /// Reverse the order
    #[arg(long)]
    pub desc: bool,
    /// New name
    #[arg(long)]
    pub rename: Option<String>,
    /// Append 1, 2, 3... to the new name
    #[arg(long, requires = "rename")]
    pub numbered: bool,
    /// Renumber FIDs starting here
    #[arg(long)]
    pub renumber: Option<u32>,
    /// New fixture type id
    #[arg(long = "type")]
    pub type_id: Option<String>,
    /// Re-patch sequentially starting at UNIVERSE.ADDRESS
    #[arg(long, value_parser = parse_placement)]
    pub repatch: Option<Placement>,
    /// New location
    #[arg(long)]
    pub location: Option<String>,
    /// Fixed installation flag
    #[arg(long)]
    pub fixed: Option<bool>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive search
    #[arg(short, long, default_value = "")]
    pub filter: String,
    /// Column to sort by
    #[arg(long, value_enum, default_value_t = SortKeyArg::Patch)]
    pub sort: SortKeyArg,
    /// Sort descending
    #[arg(long)]
    pub desc: bool,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Row ordering
    #[arg(long, value_enum, default_value_t = SortModeArg::PatchLoc)]
    pub sort: SortModeArg,
    /// Leave out fixed-installation fixtures
    #[arg(long)]
    pub exclude_fixed: bool,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum LibraryCommand {
    /// List fixture types
    List,
    /// Merge types from a library file
    Import {
        /// Library file
        file: PathBuf,
    },
    /// Export the library
    Export {
        /// Destination file
        file: PathBuf,
    },
    /// Define a custom type
    AddCustom {
        /// Manufacturer
        #[arg(long, default_value = "")]
        manufacturer: String,
        /// Model name
        #[arg(long, default_value = "")]
        name: String,
        /// Mode label
        #[arg(long, default_value = "")]
        mode: String,
        /// Footprint in channels
        #[arg(long, default_value_t = 1)]
        channels: u16,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SortKeyArg {
    Fid,
    Name,
    Type,
    Patch,
    Location,
}

impl SortKeyArg {
    pub fn key(self) -> ListSortKey {
        match self {
            SortKeyArg::Fid => ListSortKey::Fid,
            SortKeyArg::Name => ListSortKey::Name,
            SortKeyArg::Type => ListSortKey::Type,
            SortKeyArg::Patch => ListSortKey::Patch,
            SortKeyArg::Location => ListSortKey::Location,
        }
    }
}

pub fn direction(desc: bool) -> SortDirection {
    if desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SortModeArg {
    FidLoc,
    LocFid,
    PatchLoc,
    LocPatch,
    FidPatch,
    PatchFid,
}

impl From<SortModeArg> for SortMode {
    fn from(arg: SortModeArg) -> Self {
        match arg {
            SortModeArg::FidLoc => SortMode::FidLoc,
            SortModeArg::LocFid => SortMode::LocFid,
            SortModeArg::PatchLoc => SortMode::PatchLoc,
            SortModeArg::LocPatch => SortMode::LocPatch,
            SortModeArg::FidPatch => SortMode::FidPatch,
            SortModeArg::PatchFid => SortMode::PatchFid,
        }
    }
}

/// Parse `UNIVERSE.ADDRESS`
pub fn parse_placement(s: &str) -> Result<Placement, String> {
    let (universe, address) = s
        .split_once('.')
        .ok_or_else(|| format!("expected UNIVERSE.ADDRESS, got {s:?}"))?;
    let universe = universe
        .parse()
        .map_err(|_| format!("invalid universe {universe:?}"))?;
    let address = address
        .parse()
        .map_err(|_| format!("invalid address {address:?}"))?;
    Ok(Placement { universe, address })
}
