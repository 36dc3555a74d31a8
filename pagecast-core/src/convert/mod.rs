//! Converters packaging a chapter's pages into an artifact the reader opens

mod archive;
mod plain;

pub use archive::ArchiveConverter;
pub use plain::PlainConverter;

use crate::config::Format;
use crate::error::ConversionError;
use crate::types::Chapter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Trait for writing a chapter to an output format
pub trait Converter: Send + Sync {
    /// Format this converter produces
    fn format(&self) -> Format;

    /// Write the chapter under `dir`, returning the artifact path
    fn save(&self, chapter: &Chapter, dir: &Path) -> Result<PathBuf, ConversionError>;

    /// Write the chapter to the temporary artifact directory
    fn save_temp(&self, chapter: &Chapter) -> Result<PathBuf, ConversionError>;
}

/// Looks up converters by format name
pub trait ConverterRegistry: Send + Sync {
    fn get(&self, format: &str) -> Result<Arc<dyn Converter>, ConversionError>;
}

/// Default directory for temporary artifacts
pub fn temp_artifact_dir() -> PathBuf {
    std::env::temp_dir().join("pagecast")
}

/// Get a converter by format name, writing temporary artifacts under `temp_dir`
pub fn converter_for_format(
    format: &str,
    temp_dir: impl Into<PathBuf>,
) -> Result<Arc<dyn Converter>, ConversionError> {
    let parsed: Format = format
        .parse()
        .map_err(|_| ConversionError::UnknownFormat(format.to_string()))?;

    match parsed {
        Format::Cbz | Format::Zip => Ok(Arc::new(ArchiveConverter::new(parsed, temp_dir))),
        Format::Plain => Ok(Arc::new(PlainConverter::new(temp_dir))),
        Format::Pdf => Err(ConversionError::NoConverter(parsed.to_string())),
    }
}

/// The converters shipped with this crate
#[derive(Debug, Clone)]
pub struct BuiltinConverters {
    temp_dir: PathBuf,
}

impl Default for BuiltinConverters {
    fn default() -> Self {
        Self::new(temp_artifact_dir())
    }
}

impl BuiltinConverters {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
        }
    }
}

impl ConverterRegistry for BuiltinConverters {
    fn get(&self, format: &str) -> Result<Arc<dyn Converter>, ConversionError> {
        converter_for_format(format, self.temp_dir.clone())
    }
}

/// `<dir>/<series>/<chapter><ext>`, creating the series directory
pub(crate) fn artifact_path(
    chapter: &Chapter,
    dir: &Path,
    extension: Option<&str>,
) -> Result<PathBuf, ConversionError> {
    if chapter.pages.is_empty() {
        return Err(ConversionError::EncodingFailed(format!(
            "{} has no pages",
            chapter.name
        )));
    }

    let parent = dir.join(chapter.series_dir_name());
    std::fs::create_dir_all(&parent)?;

    let mut file_name = chapter.formatted_name();
    if let Some(ext) = extension {
        file_name.push('.');
        file_name.push_str(ext);
    }
    Ok(parent.join(file_name))
}
