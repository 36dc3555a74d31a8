//! Staging store: page bytes to temporary files and back.
//!
//! External programs only work on files, so page buffers are materialised in
//! the staging directory for the duration of a call. Staged files are handed
//! out as [`TempPath`] guards and removed when the guard is dropped.

use crate::error::StagingError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Prefix of every staged page file
pub const PAGE_PREFIX: &str = "page-";

/// Writes and reads staged files in one directory
#[derive(Debug, Clone)]
pub struct Stager {
    dir: PathBuf,
}

impl Default for Stager {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl Stager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to a new uniquely named `page-XXXXXX.<extension>` file
    pub fn buffer_to_file(&self, bytes: &[u8], extension: &str) -> Result<TempPath, StagingError> {
        let extension = extension.trim_start_matches('.');
        let suffix = if extension.is_empty() {
            String::new()
        } else {
            format!(".{}", extension)
        };

        let mut file = tempfile::Builder::new()
            .prefix(PAGE_PREFIX)
            .suffix(&suffix)
            .tempfile_in(&self.dir)
            .map_err(|source| StagingError::Create {
                dir: self.dir.clone(),
                source,
            })?;

        if let Err(source) = file.write_all(bytes).and_then(|_| file.flush()) {
            return Err(StagingError::Write {
                path: file.path().to_path_buf(),
                source,
            });
        }

        Ok(file.into_temp_path())
    }

    /// Read a whole file back into memory
    pub fn file_to_buffer(&self, path: &Path) -> Result<Vec<u8>, StagingError> {
        file_to_buffer(path)
    }

    /// Guard for a file another program is about to write. The file is
    /// removed when the guard drops, if it was created at all.
    pub fn track(&self, path: impl Into<PathBuf>) -> Result<TempPath, StagingError> {
        let path = path.into();
        TempPath::try_from_path(&path).map_err(|source| StagingError::Track { path, source })
    }
}

/// Read a whole file back into memory
pub fn file_to_buffer(path: &Path) -> Result<Vec<u8>, StagingError> {
    std::fs::read(path).map_err(|source| StagingError::Read {
        path: path.to_path_buf(),
        source,
    })
}
