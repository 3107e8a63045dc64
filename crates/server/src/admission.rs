//! Storage admission control.

use crate::error::{ApiError, ApiResult};
use depot_core::config::LimitsConfig;
use depot_storage::BlobStore;
use std::sync::Arc;

/// Pre-flight check deciding whether a declared size may be accepted.
///
/// The free-space check is advisory, not a reservation: concurrent uploads
/// can still consume space between the check and the writes. It exists to
/// turn away obviously oversized requests before any record is created.
pub struct AdmissionController {
    limits: LimitsConfig,
    storage: Arc<dyn BlobStore>,
}

impl AdmissionController {
    /// Create a new admission controller.
    pub fn new(limits: LimitsConfig, storage: Arc<dyn BlobStore>) -> Self {
        Self { limits, storage }
    }

    /// Check a declared size against the configured ceiling and live free
    /// space minus the reserved margin. Pure check; no space is reserved.
    pub async fn admit(&self, declared_size: u64) -> ApiResult<()> {
        if declared_size > self.limits.max_file_size_bytes {
            return Err(ApiError::CapacityRejected(format!(
                "declared size {} exceeds maximum file size {}",
                declared_size, self.limits.max_file_size_bytes
            )));
        }

        let available = self.storage.available_space().await?;
        let headroom = available.saturating_sub(self.limits.reserved_margin_bytes);
        if declared_size > headroom {
            return Err(ApiError::CapacityRejected(format!(
                "declared size {declared_size} exceeds available space {available} minus reserved margin {}",
                self.limits.reserved_margin_bytes
            )));
        }

        Ok(())
    }
}
