//! CBZ and ZIP converters

use super::{artifact_path, Converter};
use crate::config::Format;
use crate::error::ConversionError;
use crate::types::Chapter;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

/// Writes the pages into a zip archive; CBZ archives also carry `ComicInfo.xml`
pub struct ArchiveConverter {
    format: Format,
    temp_dir: PathBuf,
}

impl ArchiveConverter {
    pub fn new(format: Format, temp_dir: impl Into<PathBuf>) -> Self {
        debug_assert!(matches!(format, Format::Cbz | Format::Zip));
        Self {
            format,
            temp_dir: temp_dir.into(),
        }
    }

    fn write_archive(
        &self,
        chapter: &Chapter,
        writer: impl Write + Seek,
    ) -> zip::result::ZipResult<()> {
        let mut zip = zip::ZipWriter::new(writer);
        // page images are already compressed
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);

        for page in &chapter.pages {
            zip.start_file(page.file_name(), options)?;
            zip.write_all(&page.contents)?;
        }

        if self.format == Format::Cbz {
            let options = zip::write::FileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            zip.start_file("ComicInfo.xml", options)?;
            zip.write_all(comic_info(chapter).as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }
}

impl Converter for ArchiveConverter {
    fn format(&self) -> Format {
        self.format
    }

    fn save(&self, chapter: &Chapter, dir: &Path) -> Result<PathBuf, ConversionError> {
        let path = artifact_path(chapter, dir, self.format.extension())?;
        let file = File::create(&path)?;

        self.write_archive(chapter, BufWriter::new(file))
            .map_err(|e| ConversionError::EncodingFailed(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("wrote {} pages to {}", chapter.pages.len(), path.display());
        Ok(path)
    }

    fn save_temp(&self, chapter: &Chapter) -> Result<PathBuf, ConversionError> {
        self.save(chapter, &self.temp_dir)
    }
}

/// ComicInfo metadata understood by most comic readers
fn comic_info(chapter: &Chapter) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<ComicInfo xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <Title>{}</Title>
  <Series>{}</Series>
  <Number>{}</Number>
  <PageCount>{}</PageCount>
  <Web>{}</Web>
  <Manga>Yes</Manga>
</ComicInfo>
"#,
        escape_xml(&chapter.name),
        escape_xml(&chapter.series),
        chapter.index,
        chapter.pages.len(),
        escape_xml(&chapter.url),
    )
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DirectorySource;
    use crate::types::Page;
    use std::io::Read;
    use std::sync::Arc;

    fn chapter() -> Chapter {
        Chapter::new("Rock & Roll", "https://example.com/c/3", Arc::new(DirectorySource::new()))
            .with_index(3)
            .with_series("Band")
            .with_pages(vec![
                Page::new(0, "a", "jpg").with_contents(b"first".to_vec()),
                Page::new(1, "b", "png").with_contents(b"second".to_vec()),
            ])
    }

    fn entries(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                (file.name().to_string(), data)
            })
            .collect()
    }

    #[test]
    fn test_cbz_contains_pages_and_comic_info() {
        let dir = tempfile::tempdir().unwrap();
        let converter = ArchiveConverter::new(Format::Cbz, dir.path());

        let path = converter.save_temp(&chapter()).unwrap();
        assert_eq!(path, dir.path().join("Band").join("[0003] Rock & Roll.cbz"));

        let entries = entries(&path);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], ("0001.jpg".to_string(), b"first".to_vec()));
        assert_eq!(entries[1], ("0002.png".to_string(), b"second".to_vec()));
        assert_eq!(entries[2].0, "ComicInfo.xml");

        let info = String::from_utf8(entries[2].1.clone()).unwrap();
        assert!(info.contains("<Title>Rock &amp; Roll</Title>"));
        assert!(info.contains("<PageCount>2</PageCount>"));
    }

    #[test]
    fn test_zip_has_pages_only() {
        let dir = tempfile::tempdir().unwrap();
        let converter = ArchiveConverter::new(Format::Zip, dir.path());

        let path = converter.save_temp(&chapter()).unwrap();
        assert_eq!(path.extension().unwrap(), "zip");

        let names: Vec<_> = entries(&path).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["0001.jpg", "0002.png"]);
    }

    #[test]
    fn test_empty_chapter_fails() {
        let dir = tempfile::tempdir().unwrap();
        let converter = ArchiveConverter::new(Format::Cbz, dir.path());
        let empty = chapter().with_pages(Vec::new());
        assert!(matches!(
            converter.save_temp(&empty),
            Err(ConversionError::EncodingFailed(_))
        ));
    }
}
