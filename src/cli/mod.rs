pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feedfs")]
#[command(about = "Browse RSS/Atom feeds as a read-only file tree", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/feedfs/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of parallel workers for fetching feeds
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Keep the feed cache in memory instead of on disk
    #[arg(long, global = true)]
    pub no_persist: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the whole tree with inodes
    Tree,
    /// List a directory
    Ls {
        /// Directory to list
        #[arg(default_value = "/")]
        path: String,
    },
    /// Write the contents of a file to stdout
    Cat {
        /// File to read
        path: String,

        /// Byte offset to start reading at
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Maximum number of bytes to read
        #[arg(long)]
        length: Option<usize>,
    },
    /// Show the attributes of a path
    Stat {
        /// Path to inspect
        path: String,
    },
    /// Manage the feed cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Drop every cached feed
    Clear,
}

impl Commands {
    /// Whether the command reads the projected tree.
    pub fn needs_tree(&self) -> bool {
        !matches!(self, Commands::Cache { .. })
    }
}
