//! Rate Limiter Module
//!
//! Fixed-window request counting per (caller identity, endpoint label).
//!
//! Each window is a single counter in the shared store. The first request of
//! a window creates the counter and arms its expiry; later requests only
//! increment it. When the store drops the expired counter the next request
//! starts a fresh window.
//!
//! Two callers creating the same counter at the same instant may both try to
//! arm the expiry. The last write wins and the window can run slightly long;
//! that drift is inherent to fixed-window counting over INCR + EXPIRE.


use std::sync::Arc;

use tracing::{info, warn};

use crate::store::{KeyTtl, KvStore, StoreError};

/// Suffix marking a key as a request counter.
pub const COUNTER_SUFFIX: &str = "request_count";

/// Builds the store key for a counter: `<identity>:<label>:request_count`.
pub fn counter_key(identity: &str, label: &str) -> String {
    format!("{}:{}:{}", identity, label, COUNTER_SUFFIX)
}

// == Rate Limit Rule ==
/// Per-route limiter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Endpoint label, part of the counter key
    pub label: &'static str,
    /// Requests allowed per window
    pub limit: u64,
    /// Window length in seconds
    pub window_secs: u64,
}

impl RateLimitRule {
    /// Creates a new rule.
    pub const fn new(label: &'static str, limit: u64, window_secs: u64) -> Self {
        Self {
            label,
            limit,
            window_secs,
        }
    }
}

// == Rate Limit Decision ==
/// Outcome of one limiter check.
///
/// Produced for allowed and denied requests alike so the metadata can be
/// surfaced on every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Configured limit
    pub limit: u64,
    /// Counter value after this request
    pub current: u64,
    /// Requests left in the window, never below zero
    pub remaining: u64,
    /// Seconds until the window resets
    pub reset_secs: u64,
}

// == Rate Limiter ==
/// Stateless limiter; all state lives in the injected store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KvStore>,
}

impl RateLimiter {
    /// Creates a limiter over the shared store.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Counts this request against `identity`'s window for `rule.label`.
    ///
    /// Store failures propagate; the limiter never guesses an outcome
    /// without a counter value.
    pub async fn check(
        &self,
        identity: &str,
        rule: &RateLimitRule,
    ) -> Result<RateLimitDecision, StoreError> {
        let key = counter_key(identity, rule.label);

        let current = self.store.incr(&key).await?.max(0) as u64;

        let reset_secs = if current == 1 {
            self.store.expire(&key, rule.window_secs).await?;
            rule.window_secs
        } else {
            match self.store.ttl(&key).await? {
                // TTL rounds to the nearest second; a live window is never 0
                KeyTtl::Expires(seconds) => seconds.clamp(1, rule.window_secs.max(1)),
                KeyTtl::Missing => 0,
                KeyTtl::Persistent => {
                    // Expiry was never armed for this window
                    warn!(key = %key, "Counter has no expiry, arming window");
                    self.store.expire(&key, rule.window_secs).await?;
                    rule.window_secs
                }
            }
        };

        let decision = RateLimitDecision {
            allowed: current <= rule.limit,
            limit: rule.limit,
            current,
            remaining: rule.limit.saturating_sub(current),
            reset_secs,
        };

        if decision.allowed {
            info!(
                identity,
                endpoint = rule.label,
                "Rate limit allowed: {}/{}",
                current,
                rule.limit
            );
        } else {
            info!(
                identity,
                endpoint = rule.label,
                "Rate limit blocked: {}/{}",
                current,
                rule.limit
            );
        }

        Ok(decision)
    }
}
