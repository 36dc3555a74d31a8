//! Reading history.
//!
//! Entries are written by a detached task after a chapter is opened. Failures
//! are logged and never reach the reader.

use crate::error::HistoryError;
use crate::types::Chapter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// A record that a chapter was read
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub series: String,
    pub chapter: String,
    pub index: u32,
    pub url: String,
    pub source: String,
    pub pages: usize,
    pub read_at: chrono::DateTime<chrono::Utc>,
}

impl HistoryEntry {
    pub fn from_chapter(chapter: &Chapter) -> Self {
        Self {
            series: chapter.series.clone(),
            chapter: chapter.name.clone(),
            index: chapter.index,
            url: chapter.url.clone(),
            source: chapter.source().id().to_string(),
            pages: chapter.pages.len(),
            read_at: chrono::Utc::now(),
        }
    }

    /// One entry is kept per series; reading a later chapter replaces it
    pub fn key(&self) -> String {
        format!("{}:{}", self.source, self.series)
    }
}

/// Persistence for history entries
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn save(&self, entry: HistoryEntry) -> Result<(), HistoryError>;
}

/// History kept in a JSON file
pub struct JsonHistoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All saved entries keyed by [`HistoryEntry::key`]. A missing file is an
    /// empty history.
    pub async fn load(&self) -> Result<BTreeMap<String, HistoryEntry>, HistoryError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl HistoryStore for JsonHistoryStore {
    async fn save(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let _guard = self.lock.lock().await;

        let mut entries = self.load().await?;
        entries.insert(entry.key(), entry);
        let data = serde_json::to_string_pretty(&entries)?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        tokio::fs::create_dir_all(parent).await?;

        // unique temp file next to the target, renamed over it
        let (file, temp_path) = tempfile::Builder::new()
            .prefix(".history-")
            .suffix(".tmp")
            .tempfile_in(parent)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);
        file.write_all(data.as_bytes()).await?;
        file.flush().await?;
        drop(file);
        temp_path.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Save a history entry for `chapter` on a detached task.
///
/// The returned handle may be dropped; the task keeps running and logs its
/// own outcome.
pub fn record_async(store: Arc<dyn HistoryStore>, chapter: &Chapter) -> JoinHandle<()> {
    let entry = HistoryEntry::from_chapter(chapter);
    tokio::spawn(async move {
        match store.save(entry).await {
            Ok(()) => tracing::info!("history saved"),
            Err(e) => tracing::warn!("failed to save history: {}", e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DirectorySource;

    fn chapter(name: &str, index: u32) -> Chapter {
        Chapter::new(name, "https://example.com", Arc::new(DirectorySource::new()))
            .with_index(index)
            .with_series("Series")
    }

    #[tokio::test]
    async fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("nested").join("history.json"));
        assert!(store.load().await.unwrap().is_empty());

        store
            .save(HistoryEntry::from_chapter(&chapter("One", 1)))
            .await
            .unwrap();
        store
            .save(HistoryEntry::from_chapter(&chapter("Two", 2)))
            .await
            .unwrap();

        let entries = store.load().await.unwrap();
        assert_eq!(entries.len(), 1);
        let entry = entries.get("local:Series").unwrap();
        assert_eq!(entry.chapter, "Two");
        assert_eq!(entry.index, 2);
        let files: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(files, ["history.json"]);
    }

#[cfg(unix)]
        #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_separate_stores_save_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        // each store has its own lock, like two pagecast processes
        let tasks: Vec<_> = (0..4)
            .map(|n| {
                let store = JsonHistoryStore::new(&path);
                tokio::spawn(async move {
                    for i in 0..10 {
                        let entry = HistoryEntry::from_chapter(&chapter("One", n * 10 + i));
                        store.save(entry).await.unwrap();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let store = JsonHistoryStore::new(&path);
        assert_eq!(store.load().await.unwrap().len(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonHistoryStore::new(&path);
        assert!(matches!(
            store.load().await,
            Err(HistoryError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_record_async_saves() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonHistoryStore::new(dir.path().join("history.json")));

        record_async(store.clone(), &chapter("One", 1)).await.unwrap();

        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_async_swallows_errors() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be makes every write fail
        let path = dir.path().join("history.json");
        std::fs::create_dir(&path).unwrap();
        let store = Arc::new(JsonHistoryStore::new(&path));

        let handle = record_async(store, &chapter("One", 1));
        assert!(handle.await.is_ok());
    }
}
