//! Error types for Pagecast Core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ReadError
pub type Result<T> = std::result::Result<T, ReadError>;

/// Top-level error returned by a chapter read
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Could not open {url} in browser: {source}")]
    Browser {
        url: String,
        #[source]
        source: ProcessError,
    },

    #[error("Source error: {0}")]
    SourceFetch(#[from] SourceError),

    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("Enhancement error: {0}")]
    Enhancement(#[from] EnhancementError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Presentation error: {0}")]
    Presentation(#[from] PresentationError),
}

/// Errors raised while listing or downloading pages
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to list pages of {chapter}: {message}")]
    Pages { chapter: String, message: String },

    #[error("Failed to download page {index}: {message}")]
    Download { index: usize, message: String },

    #[error("Chapter {0} is not downloaded")]
    NotDownloaded(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors moving page bytes to and from temporary files
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to create temp file in {dir}: {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to track {path}: {source}")]
    Track {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from running external programs
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Errors from the image enhancer
#[derive(Debug, Error)]
pub enum EnhancementError {
    #[error("Failed to upscale page {page} ({path}): {source}")]
    Upscale {
        page: usize,
        path: PathBuf,
        #[source]
        source: ProcessError,
    },
}

/// Errors that occur during converter lookup or artifact creation
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("No converter available for {0} format")]
    NoConverter(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reader launch failure, with the artifact and the reader that was tried
#[derive(Debug, Error)]
#[error("could not open {} with {}: {source}", .path.display(), reader_label(.reader))]
pub struct PresentationError {
    pub path: PathBuf,
    pub reader: Option<String>,
    #[source]
    pub source: ProcessError,
}

fn reader_label(reader: &Option<String>) -> &str {
    reader.as_deref().unwrap_or("default opener")
}

/// History persistence failures. Logged, never returned from a read.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors loading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
