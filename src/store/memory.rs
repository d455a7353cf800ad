//! In-Memory Store Module
//!
//! A process-local [`KvStore`] with Redis-compatible semantics for the
//! operations this service uses. Backs the test suite and lets the server
//! run without a Redis instance.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KeyTtl, KvStore, StoreError, StoredValue};

// == Memory Store ==
/// Shared TTL map guarded by a single async lock.
///
/// Every operation takes the lock for its whole read-modify-write, which is
/// what makes `incr` atomic here.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, StoredValue>>>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Cleanup Expired ==
    /// Removes all expired values.
    ///
    /// Returns the number of values removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, value| !value.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of values held, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds nothing.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut entries = self.entries.write().await;

        let live = entries.get_mut(key).filter(|value| !value.is_expired());
        match live {
            Some(stored) => {
                let current: i64 = stored.value.parse().map_err(|_| {
                    StoreError::new("INCR", key, "value is not an integer or out of range")
                })?;
                let next = current.checked_add(1).ok_or_else(|| {
                    StoreError::new("INCR", key, "increment or decrement would overflow")
                })?;
                // Deadline is kept as is
                stored.value = next.to_string();
                Ok(next)
            }
            None => {
                entries.insert(key.to_string(), StoredValue::new("1".to_string(), None));
                Ok(1)
            }
        }
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;

        match entries.get_mut(key).filter(|value| !value.is_expired()) {
            Some(stored) => {
                stored.expire_in(seconds);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        let entries = self.entries.read().await;

        let ttl = match entries.get(key).filter(|value| !value.is_expired()) {
            None => KeyTtl::Missing,
            Some(stored) => match stored.ttl_remaining() {
                None => KeyTtl::Persistent,
                Some(seconds) => KeyTtl::Expires(seconds),
            },
        };
        Ok(ttl)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;

        Ok(entries
            .get(key)
            .filter(|value| !value.is_expired())
            .map(|stored| stored.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, seconds: u64) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            StoredValue::new(value.to_string(), Some(seconds)),
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;

        Ok(entries
            .remove(key)
            .map(|stored| !stored.is_expired())
            .unwrap_or(false))
    }
}
