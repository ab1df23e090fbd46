//! Transparent caching decorator for any [`LlmGateway`].
//!
//! Wraps a gateway and serves repeated non-streaming calls from the
//! project's response cache. Streaming calls and health checks pass straight
//! through; the cache plays no role in either.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::cache::key::prompt_fingerprint;
use crate::cache::store::CacheStats;
use crate::cache::{RequestParams, ResponseCache};
use crate::error::Result;
use crate::gateway::{LlmGateway, LlmResponse, PromptBundle, ResponseStream};

/// Caching wrapper around a model gateway.
///
/// Implements [`LlmGateway`] itself, so callers use it exactly like the
/// gateway it wraps. A disabled instance delegates every call unconditionally.
pub struct CachedGateway {
    inner: Arc<dyn LlmGateway>,
    cache: Arc<ResponseCache>,
    enabled: bool,
}

impl CachedGateway {
    pub fn new(inner: Arc<dyn LlmGateway>, cache: Arc<ResponseCache>, enabled: bool) -> Self {
        info!(
            provider = %inner.provider(),
            model = %inner.model(),
            project = %cache.project_id(),
            enabled,
            "Initialized cached gateway"
        );
        Self {
            inner,
            cache,
            enabled,
        }
    }

    /// Canonicalize a bundle into the cache's parameter shape.
    ///
    /// The whole bundle (messages + sampling parameters) becomes the prompt
    /// text; `max_tokens` additionally rides along as an extension parameter,
    /// mirroring what the key derivation hashes.
    pub(crate) fn request_params(&self, bundle: &PromptBundle) -> RequestParams {
        RequestParams::new(
            self.inner.provider(),
            self.inner.model(),
            bundle.canonical_string(),
        )
        .with_temperature(bundle.temperature)
        .with_extra("max_tokens", json!(bundle.max_tokens))
    }

    /// Reconstruct a response object from a cached payload.
    ///
    /// Missing usage/latency/raw fields deserialize to safe defaults, so
    /// entries written by older versions still round-trip.
    fn response_from_cached(payload: Value) -> Result<LlmResponse> {
        Ok(serde_json::from_value(payload)?)
    }

    /// Cache statistics for the wrapped project namespace.
    pub fn cache_stats(&self) -> Result<CacheStats> {
        self.cache.stats()
    }

    /// Delete every cached response for the project. Returns the count.
    pub fn clear_cache(&self) -> Result<u64> {
        let count = self.cache.clear_all()?;
        info!(project = %self.cache.project_id(), count, "Cleared cache entries");
        Ok(count)
    }

    /// Sweep expired cache entries. Returns the count removed.
    pub fn clear_expired_cache(&self) -> Result<u64> {
        let count = self.cache.clear_expired()?;
        info!(project = %self.cache.project_id(), count, "Cleared expired cache entries");
        Ok(count)
    }
}

#[async_trait]
impl LlmGateway for CachedGateway {
    fn provider(&self) -> &str {
        self.inner.provider()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn call(&self, bundle: &PromptBundle) -> Result<LlmResponse> {
        if !self.enabled {
            return self.inner.call(bundle).await;
        }

        let params = self.request_params(bundle);
        let fp = prompt_fingerprint(&params.prompt);

        if let Some(payload) = self.cache.get(&params)? {
            match Self::response_from_cached(payload) {
                Ok(response) => {
                    info!(
                        provider = %self.inner.provider(),
                        model = %self.inner.model(),
                        prompt_fp = %fp,
                        "Cache HIT"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    // Payload shape is unusable; fall through to a fresh call
                    // which overwrites the entry.
                    warn!(prompt_fp = %fp, error = %e, "Cached payload unusable, refetching");
                }
            }
        } else {
            info!(
                provider = %self.inner.provider(),
                model = %self.inner.model(),
                prompt_fp = %fp,
                "Cache MISS"
            );
        }

        // Gateway failures propagate unmodified; nothing is cached for them.
        let response = self.inner.call(bundle).await?;

        match serde_json::to_value(&response) {
            Ok(payload) => {
                if let Err(e) = self.cache.set(&params, payload, None) {
                    warn!(prompt_fp = %fp, error = %e, "Failed to write cache entry");
                } else {
                    debug!(prompt_fp = %fp, "Stored fresh response in cache");
                }
            }
            Err(e) => warn!(prompt_fp = %fp, error = %e, "Response not serializable for cache"),
        }

        Ok(response)
    }

    async fn stream(&self, bundle: &PromptBundle) -> Result<ResponseStream> {
        // Streaming always bypasses the cache.
        debug!(
            provider = %self.inner.provider(),
            model = %self.inner.model(),
            "Streaming call, bypassing cache"
        );
        self.inner.stream(bundle).await
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }
}
