//! Cache Invalidator
//!
//! Drops snapshots that a mutation has made stale.

use std::sync::Arc;

use tracing::info;

use crate::store::{KvStore, StoreError};

// == Invalidator ==
/// Deletes cache entries ahead of their TTL.
///
/// Callers await the deletion before answering the mutating request, so a
/// client that saw the mutation succeed can no longer read the old snapshot.
#[derive(Clone)]
pub struct Invalidator {
    store: Arc<dyn KvStore>,
}

impl Invalidator {
    /// Creates an invalidator over the shared store.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Deletes `key`. Idempotent: an absent key is not an error.
    pub async fn invalidate(&self, key: &str) -> Result<(), StoreError> {
        let existed = self.store.del(key).await?;
        info!(key, existed, "Cache invalidated");
        Ok(())
    }
}
