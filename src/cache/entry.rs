//! Persisted cache entry record.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single cached LLM response, serialized one-per-file as
/// `llm_responses/{cache_key}.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached response payload. Opaque to the cache.
    pub response: Value,
    /// The key this entry was stored under (also its filename stem).
    pub cache_key: String,
    /// Provider the response came from (openai, anthropic, ...).
    pub provider: String,
    /// Model name.
    pub model: String,
    /// Short diagnostic digest of the prompt; never used for lookup.
    pub prompt_hash: String,
    /// Unix timestamp when the entry was created.
    pub created_at: u64,
    /// Unix timestamp when the entry was last returned on a hit.
    pub accessed_at: u64,
    /// Number of times the entry has been returned, including the initial
    /// write (starts at 1).
    pub access_count: u64,
    /// Time-to-live in seconds, measured from `created_at`.
    /// `None` means the entry never expires.
    pub ttl_seconds: Option<u64>,
    /// Original request parameters, kept for debugging.
    pub request_metadata: BTreeMap<String, Value>,
}

impl CacheEntry {
    /// Whether the entry's TTL has elapsed at time `now`.
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.ttl_seconds {
            Some(ttl) => now.saturating_sub(self.created_at) > ttl,
            None => false,
        }
    }

    /// Whether the entry's TTL has elapsed right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_secs())
    }

    /// Record a hit: bump `accessed_at` and `access_count`.
    pub fn touch(&mut self, now: u64) {
        self.accessed_at = now;
        self.access_count = self.access_count.saturating_add(1);
    }
}

/// Current unix time in whole seconds.
pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(created_at: u64, ttl_seconds: Option<u64>) -> CacheEntry {
        CacheEntry {
            response: json!({"content": "hi"}),
            cache_key: "k".into(),
            provider: "openai".into(),
            model: "gpt-4o".into(),
            prompt_hash: "abcd".into(),
            created_at,
            accessed_at: created_at,
            access_count: 1,
            ttl_seconds,
            request_metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let e = entry(0, None);
        assert!(!e.is_expired_at(u64::MAX));
    }

    #[test]
    fn test_ttl_boundary_is_exclusive() {
        // now - created_at must be strictly greater than ttl
        let e = entry(100, Some(10));
        assert!(!e.is_expired_at(110));
        assert!(e.is_expired_at(111));
    }

    #[test]
    fn test_touch_bumps_bookkeeping() {
        let mut e = entry(100, None);
        e.touch(250);
        assert_eq!(e.accessed_at, 250);
        assert_eq!(e.access_count, 2);
    }

    #[test]
    fn test_serde_field_names() {
        let e = entry(100, Some(60));
        let v = serde_json::to_value(&e).unwrap();
        for field in [
            "response",
            "cache_key",
            "provider",
            "model",
            "prompt_hash",
            "created_at",
            "accessed_at",
            "access_count",
            "ttl_seconds",
            "request_metadata",
        ] {
            assert!(v.get(field).is_some(), "missing field {field}");
        }
    }
}
