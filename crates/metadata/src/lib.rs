//! Metadata store abstraction and SQLite implementation for depot.
//!
//! This crate provides the control-plane data model: one record per file,
//! carrying the declared size and the completion timestamp. Upload progress
//! is deliberately absent from the schema; the blob's on-disk length is the
//! source of truth for bytes received.

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use repos::FileRepo;
pub use store::{MetadataStore, SqliteStore};

use depot_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    let store = SqliteStore::new(&config.path).await?;
    Ok(Arc::new(store) as Arc<dyn MetadataStore>)
}
