//! Throttle Cache - rate limiting and response caching for a slow catalog
//!
//! Fixed-window rate limiting per caller and endpoint, check-before-fetch
//! response caching with TTL, and invalidation on mutation, all backed by a
//! shared key-value store (Redis, or an in-memory stand-in).

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod limiter;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
