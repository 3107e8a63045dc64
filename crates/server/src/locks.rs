//! Per-file upload locks.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock table serializing writes per file id.
///
/// Two concurrent appenders against the same blob would interleave their
/// writes and corrupt the byte sequence, so at most one append (or delete)
/// may be in flight per id. Distinct ids never contend.
#[derive(Clone, Default)]
pub struct UploadLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl UploadLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a file id, waiting if another holder is active.
    pub async fn acquire(&self, file_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.inner.lock().await;
            table
                .entry(file_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drop the table entry for a file id.
    ///
    /// Called after deletion so the table stays bounded by the number of
    /// live files. A guard already cloned out keeps its own Arc alive.
    pub async fn remove(&self, file_id: &str) {
        self.inner.lock().await.remove(file_id);
    }
}
