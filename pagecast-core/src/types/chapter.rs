//! Chapter type: an ordered set of pages from one source

use super::Page;
use crate::config::{Format, ReadConfig};
use crate::error::SourceError;
use crate::source::Source;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Sink for human-readable status lines
pub type Progress<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// A single chapter
#[derive(Clone)]
pub struct Chapter {
    /// Chapter title
    pub name: String,

    /// Where the chapter can be viewed online
    pub url: String,

    /// Chapter number within its series (1-based)
    pub index: u32,

    /// Title of the series the chapter belongs to
    pub series: String,

    /// Pages in reading order
    pub pages: Vec<Page>,

    source: Arc<dyn Source>,
}

impl Chapter {
    /// Create a new chapter without pages
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        source: Arc<dyn Source>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            index: 1,
            series: String::new(),
            pages: Vec::new(),
            source,
        }
    }

    /// Set the chapter number
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    /// Set the series title
    pub fn with_series(mut self, series: impl Into<String>) -> Self {
        self.series = series.into();
        self
    }

    /// Add pages
    pub fn with_pages(mut self, pages: Vec<Page>) -> Self {
        self.pages = pages;
        self
    }

    /// The source this chapter comes from
    pub fn source(&self) -> &Arc<dyn Source> {
        &self.source
    }

    /// Total size of the downloaded page contents in bytes
    pub fn size(&self) -> u64 {
        self.pages.iter().map(|p| p.contents.len() as u64).sum()
    }

    pub fn size_human(&self) -> String {
        human_size(self.size())
    }

    /// File-system safe name, e.g. `[0007] The Storm`
    pub fn formatted_name(&self) -> String {
        sanitize(&format!("[{:04}] {}", self.index, self.name))
    }

    /// Directory named after the series
    pub fn series_dir_name(&self) -> String {
        if self.series.is_empty() {
            sanitize(self.source.id())
        } else {
            sanitize(&self.series)
        }
    }

    /// Where a download of this chapter in the configured format would live
    pub fn download_path(&self, config: &ReadConfig) -> Option<PathBuf> {
        let format: Format = config.format().parse().ok()?;
        let mut file_name = self.formatted_name();
        if let Some(ext) = format.extension() {
            file_name.push('.');
            file_name.push_str(ext);
        }
        Some(
            config
                .downloader
                .path
                .join(self.series_dir_name())
                .join(file_name),
        )
    }

    /// Whether the source has a download of this chapter in the configured
    /// format
    pub fn is_downloaded(&self, config: &ReadConfig) -> bool {
        self.source.is_downloaded(self, config)
    }

    /// Resolve the on-disk path of the downloaded chapter
    pub fn path(&self, config: &ReadConfig) -> Result<PathBuf, SourceError> {
        self.source.downloaded_path(self, config)
    }

    /// Fetch the body of every page from the source.
    ///
    /// Pages that already hold contents are skipped unless `force` is set.
    pub async fn download_pages(
        &mut self,
        force: bool,
        progress: Progress<'_>,
    ) -> Result<(), SourceError> {
        let source = Arc::clone(&self.source);
        let total = self.pages.len();

        for (i, page) in self.pages.iter_mut().enumerate() {
            if page.is_loaded() && !force {
                continue;
            }
            progress(&format!("Downloading page {}/{}", i + 1, total));
            let contents = source.download_page(page).await?;
            page.contents = contents;
        }

        tracing::debug!("downloaded {} pages of {}", total, self.name);
        Ok(())
    }
}

impl fmt::Debug for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chapter")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("index", &self.index)
            .field("series", &self.series)
            .field("pages", &self.pages.len())
            .field("source", &self.source.id())
            .finish()
    }
}

/// Format a byte count with SI units, e.g. `1.2 MB`
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["kB", "MB", "GB", "TB", "PB", "EB"];

    if bytes < 10 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        // 999.6 kB prints as 1.0 MB, not 1000 kB
        if value.round() < 1000.0 {
            break;
        }
        value /= 1000.0;
        unit = next;
    }

    if (value * 10.0).round() < 100.0 {
        format!("{:.1} {}", value, unit)
    } else {
        format!("{:.0} {}", value, unit)
    }
}

/// Single path component safe to join under another directory: separators
/// and reserved characters are replaced and leading dots dropped, so the
/// result is never empty, `.` or `..`
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').trim_start();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DirectorySource;
    use std::path::Path;

    fn chapter() -> Chapter {
        Chapter::new("The Storm", "file:///tmp/x", Arc::new(DirectorySource::new()))
            .with_index(7)
            .with_series("Sea: Tales")
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(9), "9 B");
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(1234), "1.2 kB");
        assert_eq!(human_size(82_854_982), "83 MB");
        assert_eq!(human_size(9_960), "10 kB");
        assert_eq!(human_size(999_499), "999 kB");
        assert_eq!(human_size(999_500), "1.0 MB");
        assert_eq!(human_size(999_999), "1.0 MB");
    }

    #[test]
    fn test_formatted_name() {
        let chapter = chapter();
        assert_eq!(chapter.formatted_name(), "[0007] The Storm");
        assert_eq!(chapter.series_dir_name(), "Sea_ Tales");
    }

    #[test]
    fn test_series_dir_name_stays_one_component() {
        for series in ["..", ".", " .. ", "../..", ".hidden"] {
            let name = chapter().with_series(series).series_dir_name();
            assert!(!name.is_empty());
            assert!(!name.starts_with('.'), "{series:?} gave {name:?}");
            assert!(!name.contains('/'));
        }
        assert_eq!(chapter().with_series("..").series_dir_name(), "_");
        assert_eq!(chapter().with_series(".hidden").series_dir_name(), "hidden");
    }

    #[test]
    fn test_download_path_stays_in_downloads_dir() {
        let mut config = ReadConfig::default();
        config.downloader.path = PathBuf::from("/downloads");
        let path = chapter()
            .with_series("..")
            .download_path(&config)
            .unwrap();
        assert_eq!(path, Path::new("/downloads/_/[0007] The Storm.cbz"));
    }

    #[test]
    fn test_size() {
        let chapter = chapter().with_pages(vec![
            Page::new(0, "a", "jpg").with_contents(vec![0; 600]),
            Page::new(1, "b", "jpg").with_contents(vec![0; 900]),
        ]);
        assert_eq!(chapter.size(), 1500);
        assert_eq!(chapter.size_human(), "1.5 kB");
    }

    #[test]
    fn test_download_path_and_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ReadConfig::default();
        config.downloader.path = dir.path().to_path_buf();

        let chapter = chapter();
        let expected = dir.path().join("Sea_ Tales").join("[0007] The Storm.cbz");
        assert_eq!(chapter.download_path(&config), Some(expected.clone()));
        assert!(!chapter.is_downloaded(&config));
        assert!(chapter.path(&config).is_err());

        std::fs::create_dir_all(expected.parent().unwrap()).unwrap();
        std::fs::write(&expected, b"cbz").unwrap();
        assert!(chapter.is_downloaded(&config));
        assert_eq!(
            chapter.path(&config).unwrap(),
            std::fs::canonicalize(&expected).unwrap()
        );
    }

    #[test]
    fn test_unknown_format_is_never_downloaded() {
        let mut config = ReadConfig::default();
        config.formats.active = "epub".to_string();
        assert_eq!(chapter().download_path(&config), None);
        assert!(!chapter().is_downloaded(&config));
    }
}
