//! Subcommand handlers

use crate::cli::{self, AddArgs, BulkArgs, Cli, Command, EditArgs, LibraryCommand, ListArgs};
use anyhow::{anyhow, bail, Context, Result};
use patchflow_core::{
    AddressSuggestion, AllocationRequest, BulkEdit, BulkName, CustomType, FixtureEdit, FixtureId,
    FixtureLibrary, ListSort, Patch, PatchConfig, PatchReport, ReportOptions, SuggestionWarning,
};
use patchflow_io::{export_library, import_library, load_patch, render_text, save_patch};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Patch loaded from disk plus where to write it back
struct Session {
    patch: Patch,
    patch_path: PathBuf,
    library_path: Option<PathBuf>,
}

impl Session {
    fn open(cli: &Cli, config: PatchConfig) -> Result<Self> {
        let mut library = FixtureLibrary::builtin();
        if let Some(path) = cli.library.as_deref().filter(|p| p.exists()) {
            let merged = import_library(&mut library, path)
                .with_context(|| format!("Failed to load library {:?}", path))?;
            debug!("Merged {} fixture types from {:?}", merged, path);
        }

        let mut patch = Patch::new(library, config);
        if cli.patch.exists() {
            load_patch(&mut patch, &cli.patch)
                .with_context(|| format!("Failed to load patch {:?}", cli.patch))?;
        } else {
            info!("No patch at {:?}, starting empty", cli.patch);
        }

        Ok(Self {
            patch,
            patch_path: cli.patch.clone(),
            library_path: cli.library.clone(),
        })
    }

    fn save(&self) -> Result<()> {
        save_patch(&self.patch, &self.patch_path)
            .with_context(|| format!("Failed to save patch {:?}", self.patch_path))
    }

    fn save_library(&self) -> Result<()> {
        match &self.library_path {
            Some(path) => export_library(self.patch.library(), path)
                .with_context(|| format!("Failed to save library {:?}", path)),
            None => {
                warn!("No --library file given; library changes are not saved");
                Ok(())
            }
        }
    }

    fn fixture_id(&self, fid: u32) -> Result<FixtureId> {
        self.patch
            .fixture_by_fid(fid)
            .map(|f| f.id.clone())
            .ok_or_else(|| anyhow!("No fixture with FID {fid}"))
    }
}

/// Run the parsed command line
pub fn run(cli: Cli, config: PatchConfig) -> Result<()> {
    let mut session = Session::open(&cli, config)?;

    match cli.command {
        Command::Add(args) => add(&mut session, args),
        Command::Edit(args) => edit(&mut session, args),
        Command::Bulk(args) => bulk(&mut session, args),
        Command::Remove { fids } => remove(&mut session, &fids),
        Command::List(args) => {
            list(&session.patch, &args);
            Ok(())
        }
        Command::Sheet { universe } => {
            sheet(&session.patch, universe);
            Ok(())
        }
        Command::Free {
            universe,
            type_id,
            quantity,
        } => {
            let suggestion = session
                .patch
                .suggest_address(universe, &type_id, quantity, None)?;
            println!("{}.{}", universe, suggestion.address);
            print_warning(&suggestion);
            Ok(())
        }
        Command::Stats => {
            let stats = session.patch.stats();
            println!("Fixtures:    {}", stats.fixture_count);
            println!("Parameters:  {}", stats.total_parameters);
            println!("Universes:   {}", stats.universes_used);
            for usage in &stats.universes {
                println!(
                    "  Universe {:>3}: {:>3} / 512 slots ({}%)",
                    usage.universe, usage.occupied, usage.percent
                );
            }
            Ok(())
        }
        Command::Report(args) => {
            let options = ReportOptions {
                sort: args.sort.into(),
                include_fixed: !args.exclude_fixed,
            };
            let report = PatchReport::build(
                session.patch.fixtures(),
                session.patch.library(),
                options,
            );
            let text = render_text(&session.patch.show_name, &report);
            match args.out {
                Some(path) => std::fs::write(&path, text)
                    .with_context(|| format!("Failed to write report {:?}", path))?,
                None => print!("{text}"),
            }
            Ok(())
        }
        Command::Import { file } => {
            load_patch(&mut session.patch, &file)
                .with_context(|| format!("Failed to import {:?}", file))?;
            println!("Imported {} fixtures", session.patch.fixtures().len());
            session.save()
        }
        Command::Reset => {
            session.patch.reset();
            session.save()
        }
        Command::Library(command) => library(&mut session, command),
    }
}

fn add(session: &mut Session, args: AddArgs) -> Result<()> {
    let patch = &session.patch;
    let fixture_type = patch
        .library()
        .get(&args.type_id)
        .ok_or_else(|| anyhow!("Unknown fixture type {:?}", args.type_id))?;

    let address = match args.address {
        Some(address) if !args.next_free => address,
        _ => {
            let suggestion =
                patch.suggest_address(args.universe, &args.type_id, args.quantity, None)?;
            print_warning(&suggestion);
            suggestion.address
        }
    };

    let request = AllocationRequest {
        start_fid: args.fid,
        start_universe: args.universe,
        start_address: address,
        quantity: args.quantity,
        type_id: args.type_id.clone(),
        base_name: args.name.unwrap_or_else(|| fixture_type.name.clone()),
        location: args
            .location
            .unwrap_or_else(|| patch.config().default_location.clone()),
        is_fixed: args.fixed,
    };

    let ids = session.patch.add_fixtures(&request)?;
    println!(
        "Patched {} fixture(s) from {}.{}",
        ids.len(),
        args.universe,
        address
    );
    session.save()
}

fn edit(session: &mut Session, args: EditArgs) -> Result<()> {
    let id = session.fixture_id(args.fid)?;
    let current = session
        .patch
        .fixture(&id)
        .ok_or_else(|| anyhow!("No fixture with FID {}", args.fid))?;

    let mut change = FixtureEdit::from_fixture(current);
    if let Some(fid) = args.new_fid {
        change.fid = fid;
    }
    if let Some(name) = args.name {
        change.name = name;
    }
    if let Some(type_id) = args.type_id {
        change.type_id = type_id;
    }
    if let Some(universe) = args.universe {
        change.universe = universe;
    }
    if let Some(address) = args.address {
        change.address = address;
    }
    if args.next_free {
        // Own slots count as free so the fixture can stay or shift in place
        let suggestion =
            session
                .patch
                .suggest_address(change.universe, &change.type_id, 1, Some(&id))?;
        change.address = suggestion.address;
    }
    if let Some(location) = args.location {
        change.location = location;
    }
    if let Some(fixed) = args.fixed {
        change.is_fixed = fixed;
    }

    session.patch.edit_fixture(&id, &change)?;
    println!(
        "Updated FID {} at {}.{}",
        change.fid, change.universe, change.address
    );
    session.save()
}

fn bulk(session: &mut Session, args: BulkArgs) -> Result<()> {
    let patch = &session.patch;
    let selection: HashSet<FixtureId> = if args.fids.is_empty() {
        patch.fixtures().iter().map(|f| f.id.clone()).collect()
    } else {
        args.fids
            .iter()
            .map(|fid| session.fixture_id(*fid))
            .collect::<Result<_>>()?
    };

    // Sequential values follow the displayed order
    let order = ListSort::new(args.order.key(), cli::direction(args.desc));
    let targets: Vec<FixtureId> = order
        .apply(patch.fixtures(), patch.library(), "")
        .into_iter()
        .filter(|f| selection.contains(&f.id))
        .map(|f| f.id.clone())
        .collect();

    let change = BulkEdit {
        name: args.rename.map(|name| {
            if args.numbered {
                BulkName::Numbered(name)
            } else {
                BulkName::Fixed(name)
            }
        }),
        fid_base: args.renumber,
        type_id: args.type_id,
        placement: args.repatch,
        location: args.location,
        is_fixed: args.fixed,
    };
    if change.is_empty() {
        bail!("Nothing to change; pass at least one edit option");
    }

    session.patch.bulk_edit(&targets, &change)?;
    println!("Updated {} fixture(s)", targets.len());
    session.save()
}

fn remove(session: &mut Session, fids: &[u32]) -> Result<()> {
    let mut ids = HashSet::with_capacity(fids.len());
    for fid in fids {
        match session.fixture_id(*fid) {
            Ok(id) => {
                ids.insert(id);
            }
            Err(e) => warn!("{}", e),
        }
    }
    let removed = session.patch.remove_fixtures(&ids);
    println!("Removed {removed} fixture(s)");
    session.save()
}

fn list(patch: &Patch, args: &ListArgs) {
    let order = ListSort::new(args.sort.key(), cli::direction(args.desc));
    let rows = order.apply(patch.fixtures(), patch.library(), &args.filter);
    println!(
        "{:>6}  {:<24}  {:<24}  {:>8}  {:<12}",
        "FID", "Name", "Type", "Patch", "Location"
    );
    for f in &rows {
        let type_label = patch
            .library()
            .get(&f.type_id)
            .map(|t| format!("{} ({})", t.name, t.mode))
            .unwrap_or_else(|| format!("? {}", f.type_id));
        println!(
            "{:>6}  {:<24}  {:<24}  {:>8}  {:<12}{}",
            f.fid,
            f.name,
            type_label,
            f.patch_label(),
            f.location,
            if f.is_fixed { "  [fixed]" } else { "" }
        );
    }
    println!("{} of {} fixture(s)", rows.len(), patch.fixtures().len());
}

fn sheet(patch: &Patch, universe: u16) {
    let index = patch.occupancy_index();
    let occupancy = index.universe(universe);
    println!(
        "Universe {}: {} / 512 slots used ({}%)",
        universe,
        occupancy.occupied_count(),
        occupancy.usage_percent()
    );

    let slots = occupancy.slots();
    let mut start = 0;
    while start < slots.len() {
        let mut end = start;
        while end + 1 < slots.len() && slots[end + 1] == slots[start] {
            end += 1;
        }
        let label = match &slots[start] {
            Some(id) => match index.owner(id) {
                Some(owner) => format!("FID {} {}", owner.fid, owner.name),
                None => id.to_string(),
            },
            None => "free".to_string(),
        };
        println!("{:>3}-{:<3}  {}", start + 1, end + 1, label);
        start = end + 1;
    }
}

fn library(session: &mut Session, command: LibraryCommand) -> Result<()> {
    match command {
        LibraryCommand::List => {
            for (group, modes) in session.patch.library().groups() {
                println!("{group}");
                for t in modes {
                    println!("    {:<24} {:>3} ch  {}", t.mode, t.channels, t.id);
                }
            }
            Ok(())
        }
        LibraryCommand::Import { file } => {
            let applied = import_library(session.patch.library_mut(), &file)
                .with_context(|| format!("Failed to import library {:?}", file))?;
            println!("Applied {applied} fixture type(s)");
            session.save_library()
        }
        LibraryCommand::Export { file } => {
            write_library(session.patch.library(), &file)?;
            println!("Exported {} fixture type(s)", session.patch.library().len());
            Ok(())
        }
        LibraryCommand::AddCustom {
            manufacturer,
            name,
            mode,
            channels,
        } => {
            let id = session.patch.library_mut().add_custom(CustomType {
                manufacturer,
                name,
                mode,
                channels,
            });
            println!("{id}");
            session.save_library()
        }
    }
}

fn write_library(library: &FixtureLibrary, path: &Path) -> Result<()> {
    export_library(library, path).with_context(|| format!("Failed to export library {:?}", path))
}

fn print_warning(suggestion: &AddressSuggestion) {
    if let Some(SuggestionWarning::BatchMayNotFit { quantity }) = suggestion.warning {
        eprintln!(
            "warning: no contiguous room for {quantity} fixtures at {}; the batch may not fit",
            suggestion.address
        );
    }
}
