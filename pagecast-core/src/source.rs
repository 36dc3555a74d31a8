//! Page sources.
//!
//! A [`Source`] lists the pages of a chapter and downloads their bodies.
//! Remote sources live outside this crate; [`DirectorySource`] reads a chapter
//! from a local directory of images.

use crate::config::ReadConfig;
use crate::error::SourceError;
use crate::types::{Chapter, Page};
use async_trait::async_trait;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Provider of chapter pages
#[async_trait]
pub trait Source: Send + Sync {
    /// Identifier of this source, used in logs and as a fallback series name
    fn id(&self) -> &str;

    /// List the pages of a chapter, in reading order, without their contents
    async fn pages_of(&self, chapter: &Chapter) -> Result<Vec<Page>, SourceError>;

    /// Download the body of a single page
    async fn download_page(&self, page: &Page) -> Result<Vec<u8>, SourceError>;

    /// Whether a download of `chapter` in the configured format exists
    fn is_downloaded(&self, chapter: &Chapter, config: &ReadConfig) -> bool {
        chapter
            .download_path(config)
            .is_some_and(|path| path.exists())
    }

    /// Resolve the on-disk path of a downloaded chapter
    fn downloaded_path(
        &self,
        chapter: &Chapter,
        config: &ReadConfig,
    ) -> Result<PathBuf, SourceError> {
        let path = chapter
            .download_path(config)
            .ok_or_else(|| SourceError::NotDownloaded(chapter.name.clone()))?;
        Ok(std::fs::canonicalize(path)?)
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "avif", "bmp"];

/// Chapters stored as a directory of image files, read in file-name order
#[derive(Debug, Default)]
pub struct DirectorySource;

impl DirectorySource {
    pub fn new() -> Self {
        Self
    }

    /// Build a chapter for a directory; the parent directory names the series
    pub fn chapter(self: &Arc<Self>, dir: &Path) -> Chapter {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        let series = dir
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let index = leading_number(&name).unwrap_or(1);

        Chapter::new(name, file_url(dir), self.clone())
            .with_index(index)
            .with_series(series)
    }
}

/// `file://` URL of a local path. Each component is percent-encoded byte by
/// byte so names that are not valid UTF-8 survive [`url_path`].
fn file_url(path: &Path) -> String {
    let bytes = path_bytes(path);
    let components: Vec<Cow<'_, str>> = bytes
        .split(|b| *b == b'/')
        .map(urlencoding::encode_binary)
        .collect();
    format!("file://{}", components.join("/"))
}

fn url_path(url: &str) -> PathBuf {
    let encoded = url.strip_prefix("file://").unwrap_or(url);
    path_from_bytes(urlencoding::decode_binary(encoded.as_bytes()).into_owned())
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(std::ffi::OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    match path.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
}

fn leading_number(name: &str) -> Option<u32> {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn image_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

#[async_trait]
impl Source for DirectorySource {
    fn id(&self) -> &str {
        "local"
    }

    async fn pages_of(&self, chapter: &Chapter) -> Result<Vec<Page>, SourceError> {
        let dir = url_path(&chapter.url);
        let mut read_dir = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| SourceError::Pages {
                chapter: chapter.name.clone(),
                message: format!("{}: {}", dir.display(), e),
            })?;

        let mut files = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if let Some(ext) = image_extension(&path) {
                files.push((path, ext));
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(SourceError::Pages {
                chapter: chapter.name.clone(),
                message: format!("no images in {}", dir.display()),
            });
        }

        Ok(files
            .into_iter()
            .enumerate()
            .map(|(i, (path, ext))| Page::new(i, file_url(&path), ext))
            .collect())
    }

    async fn download_page(&self, page: &Page) -> Result<Vec<u8>, SourceError> {
        let path = url_path(&page.url);
        tokio::fs::read(&path)
            .await
            .map_err(|e| SourceError::Download {
                index: page.index,
                message: format!("{}: {}", path.display(), e),
            })
    }
}
