//! CLI argument parsing for kvstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ks")]
#[command(author, version, about = "Inspect the PromptVault key-value store", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the store directory
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List stored keys with their sizes
    List,

    /// Print the value stored under a key
    Get {
        /// Key to read
        #[arg(required = true)]
        key: String,

        /// Print raw bytes instead of pretty-printed JSON
        #[arg(short, long)]
        raw: bool,
    },

    /// Remove a key
    Rm {
        /// Key to remove
        #[arg(required = true)]
        key: String,
    },

    /// Remove every key
    Clear {
        /// Skip the confirmation guard
        #[arg(short, long)]
        yes: bool,
    },

    /// Check that the store is writable
    Check,
}
