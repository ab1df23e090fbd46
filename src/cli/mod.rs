//! Command-line interface for the cache admin surface.

pub(crate) mod cache;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Administer project-scoped LLM response caches.
#[derive(Debug, Parser)]
#[command(name = "promptcache", version, about)]
pub(crate) struct Cli {
    /// Storage root holding projects/{id}/cache/ subtrees.
    /// Defaults to ~/.promptcache.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Show cache statistics for a project.
    Stats {
        /// Project identifier.
        #[arg(long)]
        project: String,
        /// Emit machine-readable JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Delete every cache entry for a project.
    Clear {
        #[arg(long)]
        project: String,
    },
    /// Delete expired and unparsable cache entries for a project.
    ClearExpired {
        #[arg(long)]
        project: String,
    },
    /// Delete a single cache entry by key.
    Invalidate {
        #[arg(long)]
        project: String,
        /// Full hex cache key (the entry's filename stem).
        key: String,
    },
}

/// Dispatch a parsed command.
pub(crate) fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| {
        promptcache::config::CacheConfig::default().resolve_data_dir()
    });

    match cli.command {
        Command::Stats { project, json } => cache::cmd_stats(&data_dir, &project, json),
        Command::Clear { project } => cache::cmd_clear(&data_dir, &project),
        Command::ClearExpired { project } => cache::cmd_clear_expired(&data_dir, &project),
        Command::Invalidate { project, key } => cache::cmd_invalidate(&data_dir, &project, &key),
    }
}
