use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::CacheStore;

/// A one-shot task removing a cache key once its TTL has elapsed.
pub struct ExpiryTimer {
    handle: JoinHandle<()>,
}

impl ExpiryTimer {
    /// Schedules removal of `key` after `after`.
    ///
    /// Returns `None` outside a tokio runtime; the row's own expiry time
    /// still hides it from reads.
    pub fn schedule(store: Arc<dyn CacheStore>, key: String, after: Duration) -> Option<Self> {
        let runtime = Handle::try_current().ok()?;

        let handle = runtime.spawn(async move {
            tokio::time::sleep(after).await;
            match store.remove(&key) {
                Ok(true) => debug!("Cache entry {} expired", key),
                Ok(false) => {}
                Err(e) => warn!("Failed to expire cache entry {}: {}", key, e),
            }
        });

        Some(Self { handle })
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
