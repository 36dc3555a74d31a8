//! Config command implementation

use crate::paths::Paths;
use anyhow::{Context, Result};
use pagecast_core::ReadConfig;

/// Print the config file location and the settings in effect
pub fn config(paths: &Paths) -> Result<()> {
    let config = ReadConfig::load(&paths.config_file)
        .with_context(|| format!("Failed to load config {}", paths.config_file.display()))?;

    println!("# {}", paths.config_file.display());
    print!("{}", config.to_toml().context("Failed to render config")?);
    Ok(())
}
