use super::ContentStore;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// In-memory content store for tests and harnesses.
#[derive(Clone)]
pub struct MockContentStore {
    files: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    reported_sizes: Arc<Mutex<HashMap<String, u64>>>,
    active_file: Arc<Mutex<Option<String>>>,
    read_count: Arc<Mutex<usize>>,
}

impl MockContentStore {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(BTreeMap::new())),
            reported_sizes: Arc::new(Mutex::new(HashMap::new())),
            active_file: Arc::new(Mutex::new(None)),
            read_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_file(self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), data.into());
        self
    }

    /// Reports `size` bytes for `path` regardless of its stored content.
    pub fn with_reported_size(self, path: &str, size: u64) -> Self {
        self.reported_sizes
            .lock()
            .unwrap()
            .insert(path.to_string(), size);
        self
    }

    pub fn with_active_file(self, path: &str) -> Self {
        *self.active_file.lock().unwrap() = Some(path.to_string());
        self
    }

    pub fn get_read_count(&self) -> usize {
        *self.read_count.lock().unwrap()
    }
}

impl Default for MockContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MockContentStore {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        *self.read_count.lock().unwrap() += 1;

        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::Media(format!("File not found: {}", path)))
    }

    async fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.files.lock().unwrap().keys().cloned().collect())
    }

    async fn file_size(&self, path: &str) -> Result<Option<u64>> {
        let files = self.files.lock().unwrap();
        let Some(data) = files.get(path) else {
            return Ok(None);
        };

        let reported = self.reported_sizes.lock().unwrap().get(path).copied();
        Ok(Some(reported.unwrap_or(data.len() as u64)))
    }

    async fn active_file(&self) -> Result<Option<String>> {
        Ok(self.active_file.lock().unwrap().clone())
    }
}
