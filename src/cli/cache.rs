//! Cache admin command handlers.

use std::path::Path;

use anyhow::Result;

use promptcache::cache::CacheRegistry;

/// Handle `promptcache stats`.
pub(crate) fn cmd_stats(data_dir: &Path, project: &str, json: bool) -> Result<()> {
    let registry = CacheRegistry::new(data_dir);
    let store = registry.get_or_create(project, None)?;
    let stats = store.stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Cache statistics for project: {}", project);
    println!("{}", "-".repeat(44));
    println!("{:<28} {}", "Total entries", stats.total_entries);
    println!("{:<28} {}", "Active entries", stats.active_entries);
    println!("{:<28} {}", "Expired (unswept)", stats.expired_entries);
    println!(
        "{:<28} {} ({} MB)",
        "Size on disk", stats.total_size_bytes, stats.total_size_mb
    );
    println!("{:<28} {}", "Total accesses", stats.total_accesses);
    println!("{:<28} {}", "Avg accesses/entry", stats.avg_accesses_per_entry);
    println!(
        "{:<28} {} days",
        "Oldest entry age", stats.oldest_entry_age_days
    );
    println!(
        "{:<28} {} days",
        "Newest entry age", stats.newest_entry_age_days
    );
    Ok(())
}

/// Handle `promptcache clear`.
pub(crate) fn cmd_clear(data_dir: &Path, project: &str) -> Result<()> {
    let registry = CacheRegistry::new(data_dir);
    let store = registry.get_or_create(project, None)?;
    let count = store.clear_all()?;
    println!("Deleted {} cache entries for project {}.", count, project);
    Ok(())
}

/// Handle `promptcache clear-expired`.
pub(crate) fn cmd_clear_expired(data_dir: &Path, project: &str) -> Result<()> {
    let registry = CacheRegistry::new(data_dir);
    let store = registry.get_or_create(project, None)?;
    let count = store.clear_expired()?;
    println!("Deleted {} expired cache entries.", count);
    Ok(())
}

/// Handle `promptcache invalidate`.
pub(crate) fn cmd_invalidate(data_dir: &Path, project: &str, key: &str) -> Result<()> {
    let registry = CacheRegistry::new(data_dir);
    let store = registry.get_or_create(project, None)?;
    if store.invalidate(key)? {
        println!("Invalidated entry {}.", key);
    } else {
        println!("No entry found for key {}.", key);
    }
    Ok(())
}
