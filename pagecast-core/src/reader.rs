//! Opening artifacts with the configured reader

use crate::config::ReadConfig;
use crate::error::PresentationError;
use crate::history::{self, HistoryStore};
use crate::process::{self, ProcessRunner};
use crate::types::{Chapter, Progress};
use std::path::Path;
use std::sync::Arc;

/// Hands finished artifacts to an external viewer
#[derive(Clone)]
pub struct ReaderDispatch {
    runner: Arc<dyn ProcessRunner>,
    history: Option<Arc<dyn HistoryStore>>,
}

impl ReaderDispatch {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            history: None,
        }
    }

    /// Store that receives an entry for every opened chapter when history on
    /// read is enabled
    pub fn with_history(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    pub fn history(&self) -> Option<Arc<dyn HistoryStore>> {
        self.history.clone()
    }

    /// Open `path` with the reader configured for the active format.
    ///
    /// Returns once the viewer has started; it is not waited on.
    pub async fn present(
        &self,
        path: &Path,
        chapter: &Chapter,
        config: &ReadConfig,
        progress: Progress<'_>,
    ) -> Result<(), PresentationError> {
        if config.history.save_on_read {
            match &self.history {
                Some(store) => {
                    history::record_async(Arc::clone(store), chapter);
                }
                None => tracing::debug!("history on read enabled but no store is configured"),
            }
        }

        let reader = config.reader_program();
        match reader {
            Some(reader) => {
                tracing::info!("opening with {}", reader);
                progress(&format!("Opening {}", reader));
            }
            None => {
                tracing::info!("no reader specified. opening with default");
                progress("Opening");
            }
        }

        process::open_with(&*self.runner, path, reader)
            .await
            .map_err(|source| PresentationError {
                path: path.to_path_buf(),
                reader: reader.map(str::to_string),
                source,
            })?;

        tracing::info!("opened without errors");
        Ok(())
    }
}
