//! Stored Value Module
//!
//! A single value held by the in-memory store, with an optional deadline.

use std::time::{SystemTime, UNIX_EPOCH};

// == Stored Value ==
/// A whole value plus its expiry deadline.
#[derive(Debug, Clone)]
pub struct StoredValue {
    /// The stored value
    pub value: String,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoredValue {
    // == Constructor ==
    /// Creates a value that expires after `ttl_seconds`, or never if None.
    pub fn new(value: String, ttl_seconds: Option<u64>) -> Self {
        Self {
            value,
            expires_at: ttl_seconds.map(deadline_after),
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its deadline.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    /// Replaces the deadline so the value expires `ttl_seconds` from now.
    pub fn expire_in(&mut self, ttl_seconds: u64) {
        self.expires_at = Some(deadline_after(ttl_seconds));
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }

    /// Returns remaining TTL in whole seconds, rounded up.
    ///
    /// A live value never reports zero, so callers can tell "expires within
    /// the next second" apart from "already gone".
    pub fn ttl_remaining(&self) -> Option<u64> {
        self.ttl_remaining_ms().map(|ms| ms.div_ceil(1000))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn deadline_after(ttl_seconds: u64) -> u64 {
    current_timestamp_ms().saturating_add(ttl_seconds.saturating_mul(1000))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_value_without_ttl_never_expires() {
        let entry = StoredValue::new("test_value".to_string(), None);

        assert_eq!(entry.value, "test_value");
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining().is_none());
    }

    #[test]
    fn test_value_expiration() {
        let entry = StoredValue::new("test_value".to_string(), Some(1));

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(1100));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(), Some(0));
    }

    #[test]
    fn test_ttl_remaining_rounds_up() {
        let entry = StoredValue::new("test_value".to_string(), Some(10));

        let remaining = entry.ttl_remaining().unwrap();
        assert_eq!(remaining, 10);
    }

    #[test]
    fn test_expire_in_sets_deadline() {
        let mut entry = StoredValue::new("1".to_string(), None);
        entry.expire_in(5);

        let remaining_ms = entry.ttl_remaining_ms().unwrap();
        assert!(remaining_ms <= 5_000);
        assert!(remaining_ms >= 4_000);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = StoredValue {
            value: "test".to_string(),
            expires_at: Some(now),
        };

        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }
}
