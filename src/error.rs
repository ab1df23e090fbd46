//! Crate-wide error type and `Result` alias.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors surfaced by the cache store, registry, and gateway decorator.
///
/// Corrupt persisted entries are deliberately *not* surfaced from the read
/// path — they are evicted and treated as a miss. Callers that need to tell
/// corruption apart from expiry probe with
/// [`ResponseCache::inspect`](crate::cache::ResponseCache::inspect).
#[derive(Debug, Error)]
pub enum CacheError {
    /// Underlying filesystem failure (permissions, disk full, ...).
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized for persistence or key derivation.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error bubbled up from the wrapped gateway. Never produced by the
    /// cache itself; the decorator propagates provider failures unmodified.
    #[error("provider error: {0}")]
    Provider(String),
}
