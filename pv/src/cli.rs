//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::MAX_RATING;

/// PromptVault - local prompt library
#[derive(Parser)]
#[command(name = "pv", about = "Browse, fill and curate a local prompt library", version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List prompts using the saved view settings
    ///
    /// Filter flags are remembered for the next listing.
    List {
        /// Only show this category
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive text search
        #[arg(short, long)]
        search: Option<String>,

        /// Only show favorites
        #[arg(short, long)]
        favorites: bool,

        /// Forget saved filters first
        #[arg(short, long)]
        all: bool,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one prompt with its fillable fields
    Show {
        /// Prompt ID
        id: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a prompt
    Add {
        /// Prompt title
        title: String,

        /// Template text
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,

        /// Read the template text from a file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Category ID
        #[arg(long)]
        category: Option<String>,

        /// Short description
        #[arg(short, long)]
        description: Option<String>,

        /// Tags (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Edit fields of an existing prompt
    Edit {
        /// Prompt ID
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Replace tags (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },

    /// Delete a prompt and its favorite, rating and history entries
    Delete {
        /// Prompt ID
        id: String,
    },

    /// Toggle a favorite, or list favorites when no ID is given
    Fav {
        /// Prompt ID
        id: Option<String>,
    },

    /// Rate a prompt from 0 (clear) to 5
    Rate {
        /// Prompt ID
        id: String,

        /// Rating value
        #[arg(value_parser = clap::value_parser!(u8).range(0..=MAX_RATING as i64))]
        value: u8,

        /// Optional comment
        #[arg(long)]
        comment: Option<String>,

        /// Mark as liked
        #[arg(long)]
        liked: bool,
    },

    /// Show recently used prompts
    History,

    /// List categories with prompt counts
    Categories,

    /// Fill a prompt's placeholders
    ///
    /// Without values the fields are listed; with values the filled text is printed.
    Fill {
        /// Prompt ID
        id: String,

        /// Field value as FIELD=VALUE (repeatable)
        #[arg(short = 'v', long = "value", value_name = "FIELD=VALUE")]
        values: Vec<String>,
    },

    /// Export prompts, favorites, ratings and history
    Export {
        /// Directory to write the export file into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Replace the library with an export file
    Import {
        /// Export file to read
        file: PathBuf,
    },

    /// Remove all prompts, favorites, ratings and history
    Clear {
        /// Skip the confirmation guard
        #[arg(short, long)]
        yes: bool,
    },

    /// Restore the built-in catalog and default settings
    Reset {
        /// Skip the confirmation guard
        #[arg(short, long)]
        yes: bool,
    },

    /// Repair dangling references and out-of-range values
    Repair,

    /// Refresh the catalog from the remote source
    Refresh {
        /// Only refresh when the catalog is stale
        #[arg(long)]
        if_stale: bool,

        /// Set the background refresh interval in minutes
        #[arg(long)]
        interval: Option<u32>,

        /// Enable background refresh
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        /// Disable background refresh
        #[arg(long)]
        disable: bool,
    },

    /// Run the background refresh scheduler and print changes until Ctrl-C
    Watch,

    /// Set the theme, or toggle light/dark when no name is given
    Theme {
        /// Theme name
        name: Option<String>,
    },

    /// Set the list sort order (newest, oldest, title, rating, usage)
    Sort {
        /// Sort mode
        mode: String,
    },
}

/// Output format for list/show commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

/// Split `FIELD=VALUE` arguments into pairs
pub fn parse_field_values(raw: &[String]) -> Result<Vec<(String, String)>, String> {
    raw.iter()
        .map(|item| {
            item.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| format!("Expected FIELD=VALUE, got '{}'", item))
        })
        .collect()
}

/// Log file location under `log_dir`
pub fn get_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join("promptvault.log")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_rate_range() {
        assert!(Cli::try_parse_from(["pv", "rate", "abc", "5"]).is_ok());
        assert!(Cli::try_parse_from(["pv", "rate", "abc", "6"]).is_err());
    }

    #[test]
    fn test_parse_tags_delimited() {
        let cli = Cli::try_parse_from(["pv", "add", "Title", "--content", "Body", "-t", "a,b"]).unwrap();
        match cli.command {
            Command::Add { tags, .. } => assert_eq!(tags, vec!["a", "b"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_output_format() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_parse_field_values() {
        let pairs = parse_field_values(&["name=Ada".to_string(), "note=a=b".to_string()]).unwrap();
        assert_eq!(pairs[0], ("name".to_string(), "Ada".to_string()));
        assert_eq!(pairs[1].1, "a=b");
        assert!(parse_field_values(&["novalue".to_string()]).is_err());
        assert!(parse_field_values(&["=x".to_string()]).is_err());
    }
}
