use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;

use kvstore::cli::{Cli, Command};
use kvstore::config::Config;
use kvstore::{ByteStore, FileStore};

const PROBE_KEY: &str = "ks-availability-probe";

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store_path = cli.store.unwrap_or(config.store_path);

    info!("kvstore starting");

    let store = FileStore::open(&store_path).context("Failed to open store")?;

    match cli.command {
        Command::List => {
            let keys = store.keys()?;
            if keys.is_empty() {
                println!("No keys found in {}", store_path.display());
            } else {
                for key in keys {
                    let size = store.get(&key)?.map(|v| v.len()).unwrap_or(0);
                    println!("{} {}", key.cyan(), format!("{} bytes", size).dimmed());
                }
            }
        }
        Command::Get { key, raw } => {
            let bytes = store.get(&key)?.ok_or_else(|| eyre!("Key not found: {}", key))?;
            let text = String::from_utf8_lossy(&bytes);
            if raw {
                println!("{}", text);
            } else {
                match serde_json::from_slice::<serde_json::Value>(&bytes) {
                    Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
                    Err(_) => println!("{}", text),
                }
            }
        }
        Command::Rm { key } => {
            store.delete(&key)?;
            println!("{} Removed key: {}", "✓".green(), key);
        }
        Command::Clear { yes } => {
            if !yes {
                return Err(eyre!("Refusing to clear {} without --yes", store_path.display()));
            }
            store.clear()?;
            println!("{} Cleared store: {}", "✓".green(), store_path.display());
        }
        Command::Check => {
            store.put(PROBE_KEY, b"ok")?;
            let read_back = store.get(PROBE_KEY)?;
            store.delete(PROBE_KEY)?;
            if read_back.as_deref() == Some(b"ok".as_slice()) {
                println!("{} Store is available: {}", "✓".green(), store_path.display());
            } else {
                return Err(eyre!("Store at {} did not return the probe value", store_path.display()));
            }
        }
    }

    Ok(())
}
