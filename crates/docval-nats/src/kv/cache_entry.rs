use std::time::Duration;

use bytes::Bytes;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

/// A cached value together with the instant it stops being visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: Bytes,
    pub expires_at: Timestamp,
}

impl CacheEntry {
    /// Creates an entry expiring `ttl` after `now`.
    pub fn new(value: Bytes, ttl: Duration, now: Timestamp) -> Self {
        let ttl = SignedDuration::try_from(ttl).unwrap_or(SignedDuration::MAX);
        let expires_at = now.saturating_add(ttl).unwrap_or(Timestamp::MAX);
        Self { value, expires_at }
    }

    /// Returns true once `now` has reached the expiry.
    #[inline]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Returns the value if the entry is still live at `now`.
    pub fn into_live_value(self, now: Timestamp) -> Option<Bytes> {
        (!self.is_expired(now)).then_some(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> Timestamp {
        Timestamp::from_second(seconds).unwrap()
    }

    #[test]
    fn test_live_before_expiry() {
        let entry = CacheEntry::new(Bytes::from_static(b"1"), Duration::from_secs(300), at(1_000));
        assert_eq!(entry.expires_at, at(1_300));
        assert!(!entry.is_expired(at(1_299)));
        assert_eq!(entry.into_live_value(at(1_299)), Some(Bytes::from_static(b"1")));
    }

    #[test]
    fn test_expired_at_deadline() {
        let entry = CacheEntry::new(Bytes::from_static(b"1"), Duration::from_secs(300), at(1_000));
        assert!(entry.is_expired(at(1_300)));
        assert_eq!(entry.into_live_value(at(5_000)), None);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = CacheEntry::new(Bytes::new(), Duration::MAX, at(0));
        assert_eq!(entry.expires_at, Timestamp::MAX);
    }

    #[test]
    fn test_envelope_roundtrips_through_json() {
        let entry = CacheEntry::new(Bytes::from_static(b"1"), Duration::from_secs(60), at(0));
        let json = serde_json::to_vec(&entry).unwrap();
        let decoded: CacheEntry = serde_json::from_slice(&json).unwrap();
        assert_eq!(decoded, entry);
    }
}
