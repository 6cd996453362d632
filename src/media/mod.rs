//! Media resolution for notes
//!
//! Finds images and PDFs embedded in note text, locates them in the content
//! store, checks them against the configured limits, and encodes them for
//! attachment to a completion request.

pub mod mime;
pub mod mock;
pub mod resolver;
pub mod store;

pub use mime::MimeType;
pub use mock::MockContentStore;
pub use resolver::{find_embeds, resolve_file, resolve_media, strip_media_embeds, EmbedReference};
pub use store::FsContentStore;

use crate::Result;
use async_trait::async_trait;

/// Read-only view of the note vault.
///
/// Paths are vault-relative and use `/` as the separator.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    async fn list_files(&self) -> Result<Vec<String>>;
    /// Size in bytes, or `None` when no file exists at `path`.
    async fn file_size(&self, path: &str) -> Result<Option<u64>>;
    async fn active_file(&self) -> Result<Option<String>>;
}

/// A media file ready to be attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Vault path the reference resolved to.
    pub source_path: String,
    /// Standard base64 of the file's bytes.
    pub encoded_content: String,
    pub mime_type: MimeType,
    pub alt_text: Option<String>,
}

impl MediaItem {
    pub fn data_uri(&self) -> String {
        mime::data_uri(self.mime_type, &self.encoded_content)
    }

    pub fn file_name(&self) -> &str {
        self.source_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.source_path)
    }
}
