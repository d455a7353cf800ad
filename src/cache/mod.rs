//! Cache Module
//!
//! Check-before-fetch response caching over the shared store.
//!
//! Snapshots are whole JSON documents written in a single `SETEX`, so a
//! reader sees either nothing or a complete snapshot.

mod gate;
mod invalidator;
pub mod keys;


// Re-export public types
pub use gate::{CacheGate, CacheLookup, CacheStatus};
pub use invalidator::Invalidator;
pub use keys::{product_key, PRODUCTS_KEY};
