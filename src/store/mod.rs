//! Content-addressed file storage

mod ipfs;

use async_trait::async_trait;

pub use ipfs::IpfsStore;

use crate::types::Result;

/// Narrow contract against the content store: submit bytes, get back a
/// content-derived identifier; derive public URLs for stored content.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store raw file bytes, returning the content identifier
    async fn add(&self, bytes: Vec<u8>) -> Result<String>;

    /// Public gateway URL for a stored content identifier
    fn public_url(&self, content_id: &str) -> String;
}
