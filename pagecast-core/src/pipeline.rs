//! Chapter read pipeline.
//!
//! A read runs these stages in order, stopping at the first that applies or
//! fails:
//!
//! 1. open the chapter URL in a browser, when configured, and stop
//! 2. open an existing download, when configured and present
//! 3. list and download the pages
//! 4. upscale every page, when enabled
//! 5. convert the pages to the active format
//! 6. open the artifact with the configured reader
//!
//! Every stage runs on the caller's task. Only the history entry written when
//! the reader opens is saved in the background.

use crate::config::{ReadConfig, SharedConfig};
use crate::convert::{BuiltinConverters, ConverterRegistry};
use crate::enhance::Enhancer;
use crate::error::{EnhancementError, ReadError, Result};
use crate::history::HistoryStore;
use crate::process::{self, ProcessRunner, SystemRunner};
use crate::reader::ReaderDispatch;
use crate::stage::Stager;
use crate::types::{Chapter, Progress};
use std::path::Path;
use std::sync::Arc;

/// Reads chapters: fetch, enhance, convert and open
#[derive(Clone)]
pub struct Pipeline {
    config: SharedConfig,
    runner: Arc<dyn ProcessRunner>,
    converters: Arc<dyn ConverterRegistry>,
    dispatch: ReaderDispatch,
}

impl Pipeline {
    /// Pipeline running real programs with the built-in converters and no
    /// history store
    pub fn new(config: impl Into<SharedConfig>) -> Self {
        let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner::new());
        Self {
            config: config.into(),
            dispatch: ReaderDispatch::new(Arc::clone(&runner)),
            runner,
            converters: Arc::new(BuiltinConverters::default()),
        }
    }

    /// Replace the program runner used for the enhancer, readers and browser
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        let mut dispatch = ReaderDispatch::new(Arc::clone(&runner));
        if let Some(store) = self.dispatch.history() {
            dispatch = dispatch.with_history(store);
        }
        self.dispatch = dispatch;
        self.runner = runner;
        self
    }

    pub fn with_converters(mut self, converters: Arc<dyn ConverterRegistry>) -> Self {
        self.converters = converters;
        self
    }

    pub fn with_history(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.dispatch = self.dispatch.with_history(store);
        self
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Read a chapter and open it in the configured reader.
    ///
    /// Settings are read once at the start; the chapter's pages are replaced
    /// with the fetched (and possibly upscaled) pages.
    pub async fn read(&self, chapter: &mut Chapter, progress: Progress<'_>) -> Result<()> {
        let config = self.config.snapshot();
        let result = self.run(&config, chapter, progress).await;
        if let Err(e) = &result {
            tracing::error!("failed to read {}: {}", chapter.name, e);
        }
        result
    }

    async fn run(
        &self,
        config: &ReadConfig,
        chapter: &mut Chapter,
        progress: Progress<'_>,
    ) -> Result<()> {
        if config.reader.read_in_browser {
            let browser = Some(config.reader.browser.trim()).filter(|b| !b.is_empty());
            tracing::info!("opening {} in browser", chapter.url);
            return process::open_with(&*self.runner, chapter.url.as_str(), browser)
                .await
                .map_err(|source| ReadError::Browser {
                    url: chapter.url.clone(),
                    source,
                });
        }

        if config.downloader.read_downloaded && chapter.is_downloaded(config) {
            match chapter.path(config) {
                Ok(path) => {
                    tracing::info!("reading downloaded {}", path.display());
                    return self.open(&path, chapter, config, progress).await;
                }
                Err(e) => tracing::warn!(
                    "could not resolve download of {}, fetching instead: {}",
                    chapter.name,
                    e
                ),
            }
        }

        tracing::info!(
            "downloading {} for reading. Provider is {}",
            chapter.name,
            chapter.source().id()
        );
        tracing::info!("getting pages of {}", chapter.name);
        progress("Getting pages");
        let source = Arc::clone(chapter.source());
        chapter.pages = source.pages_of(chapter).await?;
        chapter.download_pages(true, progress).await?;

        if config.enhancer.enabled {
            self.enhance_pages(config, chapter, progress).await?;
        }

        let format = config.format();
        tracing::info!("getting {} converter", format);
        let converter = self.converters.get(format)?;

        tracing::info!("converting {}", format);
        progress(&format!(
            "Converting {} pages to {} {}",
            chapter.pages.len(),
            format,
            chapter.size_human()
        ));
        let path = converter.save_temp(chapter)?;

        self.open(&path, chapter, config, progress).await
    }

    async fn open(
        &self,
        path: &Path,
        chapter: &Chapter,
        config: &ReadConfig,
        progress: Progress<'_>,
    ) -> Result<()> {
        self.dispatch.present(path, chapter, config, progress).await?;
        progress("Done");
        Ok(())
    }

    /// Upscale every page in order.
    ///
    /// Contents are only replaced once all pages succeeded; the staged input
    /// and output of each page are removed before the next page starts, and on
    /// any early return.
    async fn enhance_pages(
        &self,
        config: &ReadConfig,
        chapter: &mut Chapter,
        progress: Progress<'_>,
    ) -> Result<()> {
        let stager = Stager::new(config.staging_dir());
        let enhancer = Enhancer::new(Arc::clone(&self.runner));
        let total = chapter.pages.len();
        let mut enhanced = Vec::with_capacity(total);

        for (i, page) in chapter.pages.iter().enumerate() {
            progress(&format!("Upscaling page {}/{}", i + 1, total));

            let input = stager.buffer_to_file(&page.contents, &page.extension)?;
            let _output = stager.track(Enhancer::output_path(&input))?;

            let upscaled = enhancer.enhance(&input).await.map_err(|source| {
                EnhancementError::Upscale {
                    page: page.index,
                    path: input.to_path_buf(),
                    source,
                }
            })?;

            enhanced.push(stager.file_to_buffer(&upscaled)?);
        }

        for (page, contents) in chapter.pages.iter_mut().zip(enhanced) {
            page.contents = contents;
        }

        tracing::info!("upscaled {} pages of {}", total, chapter.name);
        Ok(())
    }
}
