//! Page type representing a single image of a chapter

/// A single page image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Position within the chapter (0-based)
    pub index: usize,

    /// Where the source fetches the page from
    pub url: String,

    /// File extension hint without the leading dot (e.g., "jpg")
    pub extension: String,

    /// Raw image bytes, empty until downloaded
    pub contents: Vec<u8>,
}

impl Page {
    /// Create a new page that has not been downloaded yet
    pub fn new(index: usize, url: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
            extension: extension.into(),
            contents: Vec::new(),
        }
    }

    /// Set the page contents
    pub fn with_contents(mut self, contents: Vec<u8>) -> Self {
        self.contents = contents;
        self
    }

    /// Whether the page body has been fetched
    pub fn is_loaded(&self) -> bool {
        !self.contents.is_empty()
    }

    /// Numbered file name used inside archives, e.g. `0003.png`
    pub fn file_name(&self) -> String {
        let extension = self.extension.trim_start_matches('.');
        if extension.is_empty() {
            format!("{:04}", self.index + 1)
        } else {
            format!("{:04}.{}", self.index + 1, extension)
        }
    }
}
