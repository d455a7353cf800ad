//! Cache Gate
//!
//! Reads a snapshot before the real fetch runs and writes one after it
//! succeeds.

use std::sync::Arc;

use serde::de::IgnoredAny;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::store::KvStore;

// == Cache Lookup ==
/// Result of a gate check.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// A complete snapshot was found; holds the stored text unchanged
    Hit(String),
    /// Nothing cached; the real handler must run
    Miss,
}

impl CacheLookup {
    /// Header-facing status for this lookup.
    pub fn status(&self) -> CacheStatus {
        match self {
            CacheLookup::Hit(_) => CacheStatus::Hit,
            CacheLookup::Miss => CacheStatus::Miss,
        }
    }
}

/// Whether a response was served from cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from a stored snapshot
    Hit,
    /// Served by the real handler
    Miss,
}

impl CacheStatus {
    /// Value for the cache status response header.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

// == Cache Gate ==
/// Stateless gate over the injected store.
#[derive(Clone)]
pub struct CacheGate {
    store: Arc<dyn KvStore>,
}

impl CacheGate {
    /// Creates a gate over the shared store.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Looks up a resource cached under a fixed key.
    ///
    /// A store failure is an error, never a miss. A value that does not
    /// parse as JSON is reported as [`AppError::CorruptSnapshot`]. A hit
    /// carries the stored bytes as they are, so it can be served verbatim.
    pub async fn check_named(&self, key: &str) -> Result<CacheLookup> {
        let Some(raw) = self.store.get(key).await? else {
            info!(key, "Cache miss");
            return Ok(CacheLookup::Miss);
        };

        serde_json::from_str::<IgnoredAny>(&raw).map_err(|source| AppError::CorruptSnapshot {
            key: key.to_string(),
            source,
        })?;
        info!(key, "Cache hit");
        Ok(CacheLookup::Hit(raw))
    }

    /// Looks up a resource whose key is derived from request parameters.
    ///
    /// Returns the derived key alongside the lookup so the caller can
    /// report it. Fails with [`AppError::Internal`] if no key can be derived.
    pub async fn check_parametric<P, F>(&self, derive: F, params: &P) -> Result<(String, CacheLookup)>
    where
        P: ?Sized,
        F: FnOnce(&P) -> Option<String>,
    {
        let key = derive(params)
            .ok_or_else(|| AppError::Internal("cache key could not be derived".to_string()))?;
        let lookup = self.check_named(&key).await?;
        Ok((key, lookup))
    }

    /// Stores `value` under `key` for `ttl_secs`.
    ///
    /// Best effort: a failure is logged and otherwise ignored, so the
    /// response built from freshly fetched data still goes out.
    pub async fn populate<T>(&self, key: &str, value: &T, ttl_secs: u64)
    where
        T: Serialize + ?Sized + Sync,
    {
        let snapshot = match serde_json::to_string(value) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(key, error = %err, "Failed to serialize snapshot, skipping cache");
                return;
            }
        };

        match self.store.set_ex(key, &snapshot, ttl_secs).await {
            Ok(()) => info!(key, ttl_secs, "Cache populated"),
            Err(err) => warn!(
                key,
                operation = err.operation,
                error = %err.message,
                "Failed to populate cache"
            ),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys::product_key;
    use crate::models::Product;
    use crate::store::testing::UnreachableStore;
    use crate::store::MemoryStore;
    use std::collections::HashMap;

    fn gate() -> (CacheGate, MemoryStore) {
        let store = MemoryStore::new();
        (CacheGate::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_absent_key_is_miss() {
        let (gate, _) = gate();

        let lookup = gate.check_named("products").await.unwrap();
        assert_eq!(lookup, CacheLookup::Miss);
        assert_eq!(lookup.status().as_str(), "MISS");
    }

    #[tokio::test]
    async fn test_populated_key_is_hit() {
        let (gate, store) = gate();
        let products = vec![Product::new(1, "Keyboard", "peripherals", 89.99, 4)];

        gate.populate("products", &products, 20).await;

        let stored = store.get("products").await.unwrap().unwrap();
        assert_eq!(stored, serde_json::to_string(&products).unwrap());

        match gate.check_named("products").await.unwrap() {
            CacheLookup::Hit(raw) => assert_eq!(raw, stored),
            CacheLookup::Miss => panic!("expected hit"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_lookups_before_population_both_miss() {
        let (gate, _) = gate();

        let (a, b) = tokio::join!(gate.check_named("products"), gate.check_named("products"));

        assert_eq!(a.unwrap(), CacheLookup::Miss);
        assert_eq!(b.unwrap(), CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_parametric_key_derivation() {
        let (gate, _) = gate();
        let product = Product::new(3, "Monitor", "displays", 249.0, 15);
        gate.populate(&product_key("3"), &product, 20).await;

        let mut params = HashMap::new();
        params.insert("id".to_string(), "3".to_string());

        let (key, lookup) = gate
            .check_parametric(|p: &HashMap<String, String>| p.get("id").map(|id| product_key(id)), &params)
            .await
            .unwrap();

        assert_eq!(key, "product:3");
        assert_eq!(lookup.status(), CacheStatus::Hit);
    }

    #[tokio::test]
    async fn test_parametric_without_key_is_error() {
        let (gate, _) = gate();
        let params: HashMap<String, String> = HashMap::new();

        let result = gate
            .check_parametric(|p: &HashMap<String, String>| p.get("id").cloned(), &params)
            .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_store_read_failure_is_not_a_miss() {
        let gate = CacheGate::new(Arc::new(UnreachableStore));

        let result = gate.check_named("products").await;
        match result {
            Err(AppError::Store(err)) => {
                assert_eq!(err.operation, "GET");
                assert_eq!(err.key, "products");
            }
            other => panic!("expected store error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_reported() {
        let (gate, store) = gate();
        store.set_ex("products", "{not json", 20).await.unwrap();

        let result = gate.check_named("products").await;
        assert!(matches!(result, Err(AppError::CorruptSnapshot { .. })));
    }

    #[tokio::test]
    async fn test_hit_keeps_stored_field_order() {
        let (gate, store) = gate();
        let raw = r#"{"id":5,"name":"Headphones","category":"audio","price":199.0,"stock":25}"#;
        store.set_ex("product:5", raw, 20).await.unwrap();

        assert_eq!(
            gate.check_named("product:5").await.unwrap(),
            CacheLookup::Hit(raw.to_string())
        );
    }

    #[tokio::test]
    async fn test_populate_failure_is_swallowed() {
        let gate = CacheGate::new(Arc::new(UnreachableStore));

        // Must return normally
        gate.populate("products", &vec![1, 2, 3], 20).await;
    }

    #[tokio::test]
    async fn test_snapshot_expires_with_ttl() {
        let (gate, _) = gate();

        gate.populate("products", &vec!["a"], 1).await;
        assert_eq!(gate.check_named("products").await.unwrap().status(), CacheStatus::Hit);

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

        assert_eq!(gate.check_named("products").await.unwrap(), CacheLookup::Miss);
    }
}
