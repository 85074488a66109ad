//! Mock implementation of the BlobStore trait for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::mirror::{BlobStore, MirrorError, RemoteFile};

/// In-memory mirror with an offline switch, used to exercise the sync engine
/// without a network.
pub struct MockBlobStore {
    label: String,
    // path -> (content, revision counter)
    files: Mutex<HashMap<String, (Vec<u8>, u64)>>,
    offline: AtomicBool,
}

impl MockBlobStore {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            files: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Seed a file directly, bypassing `put` (and the offline switch).
    pub fn insert(&self, path: &str, content: &[u8]) {
        let mut files = self.files.lock().unwrap();
        let revision = files.get(path).map(|(_, rev)| rev + 1).unwrap_or(1);
        files.insert(path.to_string(), (content.to_vec(), revision));
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn content_of(&self, path: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|(content, _)| content.clone())
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    /// Simulate the mirror being unreachable; all calls fail until cleared.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), MirrorError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(MirrorError::Unavailable(format!(
                "mock mirror {} is offline",
                self.label
            )));
        }
        Ok(())
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new("mock")
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    fn label(&self) -> &str {
        &self.label
    }

    async fn get(&self, path: &str) -> Result<Option<RemoteFile>, MirrorError> {
        self.check_online()?;
        let files = self.files.lock().unwrap();
        Ok(files.get(path).map(|(content, revision)| RemoteFile {
            content: content.clone(),
            revision: Some(revision.to_string()),
        }))
    }

    async fn put(&self, path: &str, content: &[u8], _message: &str) -> Result<(), MirrorError> {
        self.check_online()?;
        self.insert(path, content);
        Ok(())
    }
}
