//! Cache configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default entry TTL: 30 days.
pub const DEFAULT_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Response-cache configuration, typically embedded in an application's
/// config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether the gateway decorator consults the cache at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Default TTL applied to new entries, in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Root directory holding `projects/{id}/cache/` subtrees.
    /// `None` resolves to the platform default at startup.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_enabled() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_TTL_SECS,
            data_dir: None,
        }
    }
}

impl CacheConfig {
    /// Resolve the storage root: configured dir, else `~/.promptcache`,
    /// else `./.promptcache` when no home directory exists.
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".promptcache")
        })
    }
}
