//! Project-scoped LLM response caching: key derivation, persisted entries
//! with TTL, lazy eviction, statistics, and the per-process store registry.

pub mod entry;
pub mod key;
pub mod registry;
pub mod store;

pub use entry::CacheEntry;
pub use key::{prompt_fingerprint, RequestParams};
pub use registry::CacheRegistry;
pub use store::{CacheStats, EntryStatus, ResponseCache};
