//! Project-scoped LLM response caching.
//!
//! Reduces cost and latency for model-provider calls by transparently
//! caching successful responses, keyed by the full semantic content of the
//! request. Entries live one-per-file under each project's storage subtree
//! and expire lazily by TTL.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use promptcache::cache::CacheRegistry;
//! use promptcache::gateway::{CachedGateway, LlmGateway};
//!
//! # fn wrap(base: Arc<dyn LlmGateway>) -> promptcache::error::Result<()> {
//! let registry = CacheRegistry::new("/var/lib/myapp");
//! let store = registry.get_or_create("project-uuid", None)?;
//! let gateway = CachedGateway::new(base, store, true);
//! // gateway.call(...) now serves repeats from the cache
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;

pub use cache::{CacheRegistry, CacheStats, RequestParams, ResponseCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use gateway::{CachedGateway, LlmGateway, LlmResponse, PromptBundle, TokenUsage};
