//! Read configuration.
//!
//! Settings are loaded from a TOML file; every section is optional and falls
//! back to defaults. A read takes one [`ReadConfig`] snapshot from
//! [`SharedConfig`] at its start and passes it through every stage, so edits
//! made while a read is running only affect the next read.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, RwLock};

/// Output container formats a chapter can be converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Pdf,
    Cbz,
    Zip,
    Plain,
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Cbz => "cbz",
            Format::Zip => "zip",
            Format::Plain => "plain",
        }
    }

    /// Extension of the artifact on disk, `None` for directory output
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Format::Pdf => Some("pdf"),
            Format::Cbz => Some("cbz"),
            Format::Zip => Some("zip"),
            Format::Plain => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(Format::Pdf),
            "cbz" => Ok(Format::Cbz),
            "zip" => Ok(Format::Zip),
            "plain" => Ok(Format::Plain),
            other => Err(format!("unknown format '{}'", other)),
        }
    }
}

/// Viewer program per output format. Empty means the platform opener.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Readers {
    pub pdf: String,
    pub cbz: String,
    pub zip: String,
    pub plain: String,
}

impl Readers {
    pub fn get(&self, format: Format) -> &str {
        match format {
            Format::Pdf => &self.pdf,
            Format::Cbz => &self.cbz,
            Format::Zip => &self.zip,
            Format::Plain => &self.plain,
        }
    }

    pub fn set(&mut self, format: Format, program: impl Into<String>) {
        let slot = match format {
            Format::Pdf => &mut self.pdf,
            Format::Cbz => &mut self.cbz,
            Format::Zip => &mut self.zip,
            Format::Plain => &mut self.plain,
        };
        *slot = program.into();
    }

    /// Reader configured for a format name.
    ///
    /// An unrecognised format or an empty entry yields `None`, which callers
    /// treat as "use the default opener" rather than an error.
    pub fn for_format(&self, format: &str) -> Option<&str> {
        let format = format.parse::<Format>().ok()?;
        let program = self.get(format).trim();
        (!program.is_empty()).then_some(program)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatsSection {
    /// Active output format name
    #[serde(rename = "use")]
    pub active: String,
}

impl Default for FormatsSection {
    fn default() -> Self {
        Self {
            active: Format::Cbz.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSection {
    pub read_in_browser: bool,
    pub browser: String,
    #[serde(flatten)]
    pub programs: Readers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderSection {
    pub read_downloaded: bool,
    pub path: PathBuf,
}

impl Default for DownloaderSection {
    fn default() -> Self {
        Self {
            read_downloaded: true,
            path: std::env::temp_dir().join("pagecast").join("downloads"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancerSection {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySection {
    pub save_on_read: bool,
}

impl Default for HistorySection {
    fn default() -> Self {
        Self { save_on_read: true }
    }
}

/// Everything a chapter read consults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    /// Where page files are staged for external programs (system temp dir if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,

    pub formats: FormatsSection,
    pub reader: ReaderSection,
    pub downloader: DownloaderSection,
    pub enhancer: EnhancerSection,
    pub history: HistorySection,
}

impl ReadConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(data) => Self::from_toml(&data).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Active output format name as configured
    pub fn format(&self) -> &str {
        &self.formats.active
    }

    /// Reader for the active format, if one is configured
    pub fn reader_program(&self) -> Option<&str> {
        self.reader.programs.for_format(self.format())
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Process-wide config that may be edited while reads are in flight
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<ReadConfig>>,
}

impl SharedConfig {
    pub fn new(config: ReadConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Consistent copy of the current settings
    pub fn snapshot(&self) -> ReadConfig {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut ReadConfig)) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut *guard);
    }
}

impl From<ReadConfig> for SharedConfig {
    fn from(config: ReadConfig) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReadConfig::default();
        assert_eq!(config.format(), "cbz");
        assert!(!config.reader.read_in_browser);
        assert!(config.downloader.read_downloaded);
        assert!(!config.enhancer.enabled);
        assert!(config.history.save_on_read);
        assert_eq!(config.reader_program(), None);
    }

    #[test]
    fn test_parse_toml() {
        let config = ReadConfig::from_toml(
            r#"
            [formats]
            use = "zip"

            [reader]
            read_in_browser = true
            browser = "firefox"
            zip = "ark"

            [enhancer]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.format(), "zip");
        assert!(config.reader.read_in_browser);
        assert_eq!(config.reader.browser, "firefox");
        assert_eq!(config.reader_program(), Some("ark"));
        assert!(config.enhancer.enabled);
        // untouched sections keep their defaults
        assert!(config.history.save_on_read);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ReadConfig::default();
        config.reader.programs.set(Format::Pdf, "zathura");
        config.enhancer.enabled = true;
        let text = config.to_toml().unwrap();
        assert!(text.contains("pdf = \"zathura\""));
        assert_eq!(ReadConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_reader_for_unknown_format_is_none() {
        let mut readers = Readers::default();
        readers.set(Format::Cbz, "foo");
        assert_eq!(readers.for_format("cbz"), Some("foo"));
        assert_eq!(readers.for_format("CBZ"), Some("foo"));
        assert_eq!(readers.for_format("epub"), None);
        assert_eq!(readers.for_format("pdf"), None);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReadConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ReadConfig::default());
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "formats = 3").unwrap();
        assert!(matches!(
            ReadConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_snapshot_is_isolated() {
        let shared = SharedConfig::default();
        let before = shared.snapshot();
        shared.update(|c| c.formats.active = "zip".to_string());
        assert_eq!(before.format(), "cbz");
        assert_eq!(shared.snapshot().format(), "zip");
    }
}
