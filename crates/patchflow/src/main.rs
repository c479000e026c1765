//! PatchFlow - DMX fixture patch manager
//!
//! Command-line front end for the patch engine. Every mutating command
//! loads the patch file, applies one atomic operation and writes it back.

#![warn(missing_docs)]

mod cli;
mod commands;
mod logging_setup;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use patchflow_core::PatchConfig;
use std::path::Path;
use tracing::debug;

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "patchflow.toml";

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    // Dropping the guard flushes buffered file logs
    let _log_guard = logging_setup::init(&config.log)?;
    debug!("Max universes: {}", config.max_universes);

    commands::run(cli, config)
}

fn load_config(path: Option<&Path>) -> Result<PatchConfig> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
        None => return Ok(PatchConfig::default()),
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: PatchConfig =
        toml::from_str(&content).with_context(|| format!("Invalid config {:?}", path))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_partial_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_universes = 4\n\n[log]\nlevel = \"debug\"").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.max_universes, 4);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.default_location, "Stage");
    }

    #[test]
    fn test_reject_zero_universes() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_universes = 0").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }
}
