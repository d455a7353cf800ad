//! Key-Value Store Module
//!
//! The shared store that owns every rate-limit counter and cache snapshot.
//! Components never hold counter or snapshot state between requests; each
//! decision is a round trip through a [`KvStore`].

mod entry;
mod memory;
mod redis_store;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use entry::StoredValue;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

// == Store Error ==
/// Infrastructure fault on a single store operation.
///
/// Carries the operation and key so the failure can be logged with context
/// wherever it finally surfaces.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("store {operation} failed for key `{key}`: {message}")]
pub struct StoreError {
    /// Command name, e.g. `INCR` or `GET`
    pub operation: &'static str,
    /// Key the command targeted
    pub key: String,
    /// Underlying failure description
    pub message: String,
}

impl StoreError {
    /// Creates a new StoreError.
    pub fn new(operation: &'static str, key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            operation,
            key: key.into(),
            message: message.to_string(),
        }
    }
}

// == Key TTL ==
/// Remaining lifetime of a key as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key does not exist
    Missing,
    /// The key exists without an expiry
    Persistent,
    /// The key expires in this many seconds
    Expires(u64),
}

impl KeyTtl {
    /// Maps a Redis-style TTL reply (-2 missing, -1 persistent) to a KeyTtl.
    pub fn from_reply(reply: i64) -> Self {
        match reply {
            -2 => KeyTtl::Missing,
            r if r < 0 => KeyTtl::Persistent,
            r => KeyTtl::Expires(r as u64),
        }
    }
}

// == KvStore Trait ==
/// Operations the rate limiter and cache layers need from the shared store.
///
/// Every call is a suspension point; implementations must be safe to share
/// across concurrently running requests.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Atomically increments the integer at `key`, creating it at 1.
    ///
    /// An existing expiry is left untouched.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Sets the expiry of `key`. Returns false if the key does not exist.
    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, StoreError>;

    /// Reads the remaining lifetime of `key`.
    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError>;

    /// Reads the value stored at `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` at `key` with an expiry, replacing any previous value.
    async fn set_ex(&self, key: &str, value: &str, seconds: u64) -> Result<(), StoreError>;

    /// Removes `key`. Returns true if something was removed.
    async fn del(&self, key: &str) -> Result<bool, StoreError>;
}
