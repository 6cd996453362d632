use super::ContentStore;
use crate::{Error, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Content store backed by a vault directory on disk.
pub struct FsContentStore {
    root: PathBuf,
    active_file: Option<String>,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            active_file: None,
        }
    }

    pub fn with_active_file(mut self, path: Option<String>) -> Self {
        self.active_file = path;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(Error::Media(format!("Path escapes the vault: {}", path)));
        }
        Ok(self.root.join(relative))
    }

    fn index_sync(root: PathBuf) -> Result<Vec<String>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = entry.map_err(|e| Error::Media(format!("Failed to index vault: {}", e)))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&root) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                files.push(parts.join("/"));
            }
        }

        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path)?;
        Ok(tokio::fs::read(full_path).await?)
    }

    async fn list_files(&self) -> Result<Vec<String>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || Self::index_sync(root))
            .await
            .map_err(|e| Error::Generic(format!("Vault indexing task join error: {}", e)))?
    }

    async fn file_size(&self, path: &str) -> Result<Option<u64>> {
        let full_path = match self.full_path(path) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("{}", e);
                return Ok(None);
            }
        };

        match tokio::fs::metadata(&full_path).await {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn active_file(&self) -> Result<Option<String>> {
        Ok(self.active_file.clone())
    }
}
