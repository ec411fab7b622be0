use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "webstash", version, about = "Fetch remote resources and cache them on disk")]
pub struct CliArgs {
    /// Root directory for the disk cache (defaults to a temp-dir stash)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a URL, serving from cache when a fresh entry exists
    Fetch {
        /// The URL to fetch
        url: String,

        /// Write the payload to this file instead of summarizing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Treat the payload as text and print it
        #[arg(long)]
        text: bool,

        /// Bypass the cache for this request
        #[arg(long)]
        no_cache: bool,

        /// TTL in hours before the cached entry is revalidated
        #[arg(long, default_value_t = 72)]
        ttl: u32,

        /// Force a re-download even if a fresh entry exists
        #[arg(long)]
        refresh: bool,
    },

    /// Remove a single cached entry, or everything with --all
    Clear {
        /// The URL whose entry should be removed
        url: Option<String>,

        /// Remove every cached entry
        #[arg(long)]
        all: bool,
    },

    /// Check whether a URL has a cached entry
    Status {
        /// The URL to check
        url: String,
    },
}
