//! Deterministic cache-key derivation.
//!
//! The cache key is the SHA-256 hex digest of a canonical JSON serialization
//! of the request parameters. Canonicalization sorts parameter names
//! lexicographically, so insertion order of extension parameters never
//! affects the key. The key doubles as the on-disk entry filename.
//!
//! A second, shorter digest — the *prompt fingerprint* — is derived from the
//! prompt text alone and carried purely for log lines. It must never be used
//! for lookup.

use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex length of the prompt fingerprint.
const FINGERPRINT_LEN: usize = 16;

/// Typed request parameters for key derivation.
///
/// The fixed fields cover every request shape the gateway produces; anything
/// provider-specific goes in the sorted `extras` map so that two callers
/// supplying the same extras in different orders still derive the same key.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParams {
    pub provider: String,
    pub model: String,
    pub prompt: String,
    pub temperature: Option<f64>,
    /// Extension parameters folded into the key (e.g. `max_tokens`).
    /// Sorted by construction; insertion order is irrelevant.
    pub extras: BTreeMap<String, Value>,
}

impl RequestParams {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            prompt: prompt.into(),
            temperature: None,
            extras: BTreeMap::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Add an extension parameter.
    ///
    /// The names `provider`, `model`, `prompt`, and `temperature` are
    /// reserved; an extra using one of them shadows the fixed field in the
    /// canonical form.
    pub fn with_extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extras.insert(name.into(), value);
        self
    }

    /// Canonical JSON form hashed into the cache key: one flat object with
    /// lexicographically sorted keys.
    pub fn canonical_json(&self) -> String {
        let mut map: BTreeMap<&str, Value> = BTreeMap::new();
        map.insert("provider", Value::from(self.provider.as_str()));
        map.insert("model", Value::from(self.model.as_str()));
        map.insert("prompt", Value::from(self.prompt.as_str()));
        map.insert(
            "temperature",
            self.temperature.map(Value::from).unwrap_or(Value::Null),
        );
        for (k, v) in &self.extras {
            map.insert(k.as_str(), v.clone());
        }
        // BTreeMap serialization is infallible: keys are strings, values JSON.
        serde_json::to_string(&map).unwrap_or_default()
    }

    /// Derive the cache key: full SHA-256 hex digest of the canonical form.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_json().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Request parameters persisted alongside the entry for debugging.
    pub fn metadata(&self) -> BTreeMap<String, Value> {
        let mut map = self.extras.clone();
        map.insert(
            "temperature".to_string(),
            self.temperature.map(Value::from).unwrap_or(Value::Null),
        );
        map
    }
}

/// Short diagnostic digest of the prompt text alone.
///
/// Logged on hits and misses so operators can correlate requests without
/// dumping prompt contents. Sixteen hex chars — far too short to be a safe
/// lookup key, which is exactly why no lookup path accepts it.
pub fn prompt_fingerprint(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..FINGERPRINT_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_deterministic() {
        let a = RequestParams::new("openai", "gpt-4o", "hello").with_temperature(Some(0.7));
        let b = RequestParams::new("openai", "gpt-4o", "hello").with_temperature(Some(0.7));
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_key_extras_order_independent() {
        let a = RequestParams::new("openai", "gpt-4o", "hello")
            .with_extra("max_tokens", json!(4096))
            .with_extra("top_p", json!(0.9));
        let b = RequestParams::new("openai", "gpt-4o", "hello")
            .with_extra("top_p", json!(0.9))
            .with_extra("max_tokens", json!(4096));
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_key_temperature_sensitive() {
        let a = RequestParams::new("openai", "gpt-4o", "hello").with_temperature(Some(0.7));
        let b = RequestParams::new("openai", "gpt-4o", "hello").with_temperature(Some(0.9));
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_key_provider_model_prompt_sensitive() {
        let base = RequestParams::new("openai", "gpt-4o", "hello");
        assert_ne!(
            base.cache_key(),
            RequestParams::new("anthropic", "gpt-4o", "hello").cache_key()
        );
        assert_ne!(
            base.cache_key(),
            RequestParams::new("openai", "gpt-4o-mini", "hello").cache_key()
        );
        assert_ne!(
            base.cache_key(),
            RequestParams::new("openai", "gpt-4o", "goodbye").cache_key()
        );
    }

    #[test]
    fn test_key_extra_value_sensitive() {
        let a = RequestParams::new("openai", "gpt-4o", "hello").with_extra("max_tokens", json!(100));
        let b = RequestParams::new("openai", "gpt-4o", "hello").with_extra("max_tokens", json!(200));
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_key_is_full_sha256_hex() {
        let key = RequestParams::new("p", "m", "x").cache_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_is_not_the_key() {
        let params = RequestParams::new("openai", "gpt-4o", "hello");
        let fp = prompt_fingerprint(&params.prompt);
        assert_eq!(fp.len(), 16);
        assert_ne!(fp, params.cache_key());
        assert!(!params.cache_key().starts_with(&fp));
    }

    #[test]
    fn test_canonical_json_sorted() {
        let params = RequestParams::new("p", "m", "x")
            .with_extra("zz", json!(1))
            .with_extra("aa", json!(2));
        let canon = params.canonical_json();
        let aa = canon.find("\"aa\"").unwrap();
        let zz = canon.find("\"zz\"").unwrap();
        let model = canon.find("\"model\"").unwrap();
        assert!(aa < model && model < zz, "keys must be lexicographic: {canon}");
    }
}
