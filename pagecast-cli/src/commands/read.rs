//! Read command implementation

use crate::paths::Paths;
use crate::ReadArgs;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use pagecast_core::convert::BuiltinConverters;
use pagecast_core::error::HistoryError;
use pagecast_core::history::{HistoryEntry, HistoryStore, JsonHistoryStore};
use pagecast_core::{DirectorySource, Format, Pipeline, ReadConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// How long to wait for the background history save before exiting
const HISTORY_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Signals when a save has finished so the process does not exit mid-write
struct FlushingHistory {
    inner: JsonHistoryStore,
    saved: Notify,
}

#[async_trait]
impl HistoryStore for FlushingHistory {
    async fn save(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let result = self.inner.save(entry).await;
        self.saved.notify_one();
        result
    }
}

/// Read a chapter directory and open it in the configured reader
pub async fn read(paths: &Paths, args: ReadArgs) -> Result<()> {
    let mut config = ReadConfig::load(&paths.config_file)
        .with_context(|| format!("Failed to load config {}", paths.config_file.display()))?;
    apply_overrides(&mut config, &args)?;

    if !args.input.is_dir() {
        bail!("{} is not a directory", args.input.display());
    }
    let dir = args
        .input
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", args.input.display()))?;

    let history = Arc::new(FlushingHistory {
        inner: JsonHistoryStore::new(&paths.history_file),
        saved: Notify::new(),
    });
    let save_history = config.history.save_on_read && !config.reader.read_in_browser;

    let pipeline = Pipeline::new(config)
        .with_converters(Arc::new(BuiltinConverters::new(&paths.artifacts_dir)))
        .with_history(history.clone());

    let source = Arc::new(DirectorySource::new());
    let mut chapter = source.chapter(&dir);

    // Set up progress spinner
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let progress = |msg: &str| pb.set_message(msg.to_string());
    let result = pipeline.read(&mut chapter, &progress).await;

    if let Err(e) = result {
        pb.abandon_with_message("Failed");
        return Err(e).with_context(|| format!("Failed to read {}", dir.display()));
    }

    if save_history
        && tokio::time::timeout(HISTORY_FLUSH_TIMEOUT, history.saved.notified())
            .await
            .is_err()
    {
        tracing::warn!("history was not saved in time");
    }

    pb.finish_with_message(format!("Opened '{}'", chapter.name));
    Ok(())
}

fn apply_overrides(config: &mut ReadConfig, args: &ReadArgs) -> Result<()> {
    if let Some(format) = &args.format {
        format
            .parse::<Format>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Invalid --format {}", format))?;
        config.formats.active = format.clone();
    }

    if let Some(reader) = &args.reader {
        let format: Format = config
            .format()
            .parse()
            .map_err(anyhow::Error::msg)
            .context("--reader needs a known output format")?;
        config.reader.programs.set(format, reader.clone());
    }

    if args.enhance {
        config.enhancer.enabled = true;
    }

    if let Some(browser) = &args.browser {
        config.reader.read_in_browser = true;
        config.reader.browser = browser.clone();
    }

    if args.no_history {
        config.history.save_on_read = false;
    }

    if args.fresh {
        config.downloader.read_downloaded = false;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> ReadArgs {
        ReadArgs {
            input: PathBuf::from("chapter"),
            format: None,
            reader: None,
            enhance: false,
            browser: None,
            no_history: false,
            fresh: false,
        }
    }

    #[test]
    fn test_overrides() {
        let mut config = ReadConfig::default();
        let args = ReadArgs {
            format: Some("zip".to_string()),
            reader: Some("ark".to_string()),
            enhance: true,
            browser: Some(String::new()),
            no_history: true,
            fresh: true,
            ..args()
        };
        apply_overrides(&mut config, &args).unwrap();

        assert_eq!(config.format(), "zip");
        assert_eq!(config.reader_program(), Some("ark"));
        assert!(config.enhancer.enabled);
        assert!(config.reader.read_in_browser);
        assert_eq!(config.reader.browser, "");
        assert!(!config.history.save_on_read);
        assert!(!config.downloader.read_downloaded);
    }

    #[test]
    fn test_invalid_format_rejected() {
        let mut config = ReadConfig::default();
        let args = ReadArgs {
            format: Some("epub".to_string()),
            ..args()
        };
        assert!(apply_overrides(&mut config, &args).is_err());
    }
}
