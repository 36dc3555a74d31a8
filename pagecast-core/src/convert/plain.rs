//! Plain converter: a directory of numbered page files

use super::{artifact_path, Converter};
use crate::config::Format;
use crate::error::ConversionError;
use crate::types::Chapter;
use std::path::{Path, PathBuf};

pub struct PlainConverter {
    temp_dir: PathBuf,
}

impl PlainConverter {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
        }
    }
}

impl Converter for PlainConverter {
    fn format(&self) -> Format {
        Format::Plain
    }

    fn save(&self, chapter: &Chapter, dir: &Path) -> Result<PathBuf, ConversionError> {
        let path = artifact_path(chapter, dir, None)?;
        if path.exists() {
            std::fs::remove_dir_all(&path)?;
        }
        std::fs::create_dir_all(&path)?;

        for page in &chapter.pages {
            std::fs::write(path.join(page.file_name()), &page.contents)?;
        }

        Ok(path)
    }

    fn save_temp(&self, chapter: &Chapter) -> Result<PathBuf, ConversionError> {
        self.save(chapter, &self.temp_dir)
    }
}
