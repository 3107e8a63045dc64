//! Blob storage abstraction and backends for depot.
//!
//! This crate provides:
//! - Append-only blob storage keyed by file id
//! - Durable-length queries that back resumable uploads
//! - A local filesystem backend with path traversal protection
//! - Live free-space queries for admission control

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemStore;
pub use error::{StorageError, StorageResult};
pub use traits::{BlobAppend, BlobStore, ByteStream};

use depot_core::config::StorageConfig;
use std::sync::Arc;

/// Create a blob store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn BlobStore>> {
    let store = FilesystemStore::new(&config.root).await?;
    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn from_config_creates_root_directory() {
        let temp = tempdir().unwrap();
        let config = StorageConfig {
            root: temp.path().join("files"),
        };

        let store = from_config(&config).await.unwrap();
        store.health_check().await.unwrap();
        assert!(temp.path().join("files").is_dir());
    }
}
