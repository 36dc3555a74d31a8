//! Where the CLI keeps its config, history and artifacts

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Overrides every location with `<dir>/config.toml`, `<dir>/history.json`, ...
pub const HOME_ENV: &str = "PAGECAST_HOME";

pub struct Paths {
    pub config_file: PathBuf,
    pub history_file: PathBuf,
    pub artifacts_dir: PathBuf,
}

impl Paths {
    pub fn resolve(config_override: Option<PathBuf>) -> Result<Self> {
        let mut paths = match std::env::var_os(HOME_ENV) {
            Some(home) => {
                let home = PathBuf::from(home);
                Self {
                    config_file: home.join("config.toml"),
                    history_file: home.join("history.json"),
                    artifacts_dir: home.join("artifacts"),
                }
            }
            None => {
                let dirs = ProjectDirs::from("", "", "pagecast")
                    .context("Could not determine a home directory")?;
                Self {
                    config_file: dirs.config_dir().join("config.toml"),
                    history_file: dirs.data_dir().join("history.json"),
                    artifacts_dir: pagecast_core::convert::temp_artifact_dir(),
                }
            }
        };

        if let Some(config_file) = config_override {
            paths.config_file = config_file;
        }
        Ok(paths)
    }
}
