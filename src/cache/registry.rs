//! Process-wide registry of per-project cache stores.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::cache::store::ResponseCache;
use crate::config::DEFAULT_TTL_SECS;
use crate::error::Result;

/// Maps project ids to their [`ResponseCache`] so repeated requests for the
/// same project reuse one store instead of re-opening storage.
///
/// Owned by the composition root and shared by handle; there is no global
/// instance and no explicit shutdown — dropped handles are recreated on the
/// next `get_or_create`.
pub struct CacheRegistry {
    /// Root directory holding `projects/{id}/cache/` subtrees.
    root: PathBuf,
    default_ttl_secs: u64,
    stores: DashMap<String, Arc<ResponseCache>>,
}

impl CacheRegistry {
    /// Create a registry rooted at `root`, with the standard 30-day TTL.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_default_ttl(root, DEFAULT_TTL_SECS)
    }

    /// Create a registry with a custom default TTL for new stores.
    pub fn with_default_ttl(root: impl Into<PathBuf>, default_ttl_secs: u64) -> Self {
        Self {
            root: root.into(),
            default_ttl_secs,
            stores: DashMap::new(),
        }
    }

    /// Return the store for `project_id`, opening it (and ensuring its
    /// storage subtree exists) on first access.
    ///
    /// `ttl_override` only applies when the store is first created; an
    /// already-registered store keeps its TTL.
    pub fn get_or_create(
        &self,
        project_id: &str,
        ttl_override: Option<u64>,
    ) -> Result<Arc<ResponseCache>> {
        if let Some(store) = self.stores.get(project_id) {
            return Ok(Arc::clone(&store));
        }
        let cache_dir = self.project_cache_dir(project_id);
        let store = Arc::new(ResponseCache::open(
            cache_dir,
            project_id,
            ttl_override.unwrap_or(self.default_ttl_secs),
        )?);
        debug!(project = %project_id, "Opened cache store");
        // Two callers can race here; entry() keeps whichever registered
        // first so both end up sharing one store.
        let store = self
            .stores
            .entry(project_id.to_string())
            .or_insert(store)
            .clone();
        Ok(store)
    }

    /// Drop the in-process store handle for a project.
    ///
    /// Persisted cache files are untouched; use
    /// [`ResponseCache::clear_all`] first if they should go too.
    /// Returns whether a handle was registered.
    pub fn remove(&self, project_id: &str) -> bool {
        self.stores.remove(project_id).is_some()
    }

    /// Number of currently registered stores.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Whether no stores are registered.
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Cache directory for one project: `<root>/projects/{id}/cache`.
    fn project_cache_dir(&self, project_id: &str) -> PathBuf {
        self.root.join("projects").join(project_id).join("cache")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::RequestParams;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_get_or_create_reuses_instance() {
        let dir = TempDir::new().unwrap();
        let registry = CacheRegistry::new(dir.path());
        let a = registry.get_or_create("proj-1", None).unwrap();
        let b = registry.get_or_create("proj-1", None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_projects_are_isolated() {
        let dir = TempDir::new().unwrap();
        let registry = CacheRegistry::new(dir.path());
        let a = registry.get_or_create("proj-a", None).unwrap();
        let b = registry.get_or_create("proj-b", None).unwrap();

        let p = RequestParams::new("openai", "gpt-4o", "shared prompt");
        a.set(&p, json!({"content": "from a"}), None).unwrap();
        assert!(
            b.get(&p).unwrap().is_none(),
            "entries must not leak across project namespaces"
        );
    }

    #[test]
    fn test_remove_drops_handle_but_keeps_files() {
        let dir = TempDir::new().unwrap();
        let registry = CacheRegistry::new(dir.path());
        let store = registry.get_or_create("proj-x", None).unwrap();
        let p = RequestParams::new("openai", "gpt-4o", "persist me");
        store.set(&p, json!({"content": "kept"}), None).unwrap();

        assert!(registry.remove("proj-x"));
        assert!(!registry.remove("proj-x"));
        assert!(registry.is_empty());

        // Re-created store sees the files the old handle wrote.
        let store = registry.get_or_create("proj-x", None).unwrap();
        assert_eq!(store.get(&p).unwrap(), Some(json!({"content": "kept"})));
    }

    #[test]
    fn test_ttl_override_applies_at_creation() {
        let dir = TempDir::new().unwrap();
        let registry = CacheRegistry::new(dir.path());
        let store = registry.get_or_create("proj-ttl", Some(60)).unwrap();
        assert_eq!(store.default_ttl_secs(), 60);
        // Override on an existing store is ignored.
        let again = registry.get_or_create("proj-ttl", Some(999)).unwrap();
        assert_eq!(again.default_ttl_secs(), 60);
    }
}
