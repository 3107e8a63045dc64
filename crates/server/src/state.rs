//! Application state shared across handlers.

use crate::admission::AdmissionController;
use crate::engine::UploadEngine;
use depot_core::config::AppConfig;
use depot_metadata::MetadataStore;
use depot_storage::BlobStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Blob storage backend.
    pub storage: Arc<dyn BlobStore>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Upload engine (owns the per-file lock table).
    pub engine: Arc<UploadEngine>,
    /// Admission controller.
    pub admission: Arc<AdmissionController>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Panics
    ///
    /// Panics if the limits configuration is invalid; the server must not
    /// start with an unenforceable admission policy.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        if let Err(error) = config.limits.validate() {
            panic!("Invalid limits configuration: {error}");
        }

        let engine = Arc::new(UploadEngine::new(metadata.clone(), storage.clone()));
        let admission = Arc::new(AdmissionController::new(
            config.limits.clone(),
            storage.clone(),
        ));

        Self {
            config: Arc::new(config),
            storage,
            metadata,
            engine,
            admission,
        }
    }
}
