//! PromptVault CLI
//!
//! Thin consumer of the promptvault core: every command initializes the
//! StateManager, performs one operation, and shuts it down so pending view
//! settings reach the store.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

use kvstore::FileStore;
use promptvault::catalog::{CatalogFetcher, EmbeddedDefaults, HttpFetcher, RemoteCatalog, SeedSource};
use promptvault::cli::{Cli, Command, OutputFormat, get_log_path, parse_field_values};
use promptvault::config::Config;
use promptvault::domain::{ALL_CATEGORY, Prompt, PromptDraft, UserRating};
use promptvault::effects::{PlatformEffects, ToastLevel};
use promptvault::query::SortMode;
use promptvault::refresh::{RefreshConfig, RefreshScheduler, TickOutcome};
use promptvault::state::{ManagerOptions, StateManager};
use promptvault::store::PersistentStore;
use promptvault::template;

fn setup_logging(cli_log_level: Option<&str>, config: &Config) -> Result<()> {
    fs::create_dir_all(&config.log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config.log_level.as_deref()) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(get_log_path(&config.log_dir))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Terminal rendition of the platform effects
struct CliEffects {
    download_dir: PathBuf,
}

impl PlatformEffects for CliEffects {
    fn apply_theme(&self, theme: &str) {
        println!("{} Theme: {}", "✓".green(), theme.cyan());
    }

    fn download_file(&self, filename: &str, content: &str) {
        let path = self.download_dir.join(filename);
        match fs::write(&path, content) {
            Ok(()) => println!("{} Wrote {}", "✓".green(), path.display()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "download_file: write failed");
                eprintln!("{} Could not write {}: {}", "✗".red(), path.display(), e);
            }
        }
    }

    fn notify(&self, message: &str, level: ToastLevel) {
        match level {
            ToastLevel::Info => eprintln!("{} {}", "ℹ".blue(), message),
            ToastLevel::Success => eprintln!("{} {}", "✓".green(), message),
            ToastLevel::Warning => eprintln!("{} {}", "!".yellow(), message.yellow()),
            ToastLevel::Error => eprintln!("{} {}", "✗".red(), message.red()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), &config).context("Failed to setup logging")?;

    let download_dir = match &cli.command {
        Command::Export { output } => output.clone(),
        _ => PathBuf::from("."),
    };
    let effects: Arc<dyn PlatformEffects> = Arc::new(CliEffects { download_dir });

    let backend = FileStore::open(&config.storage.path).context("Failed to open store")?;
    let store = PersistentStore::new(Arc::new(backend));

    let fetcher: Arc<dyn CatalogFetcher> = Arc::new(
        HttpFetcher::new(&config.refresh.url, config.refresh.timeout()).context("Failed to build catalog client")?,
    );
    let seed: Arc<dyn SeedSource> = if config.refresh.seed_from_remote {
        Arc::new(RemoteCatalog::new(fetcher.clone()))
    } else {
        Arc::new(EmbeddedDefaults)
    };

    let options = ManagerOptions::default()
        .with_state_key(config.storage.state_key.clone())
        .with_effects(effects.clone())
        .with_seed(seed);
    let manager = StateManager::spawn(store, options);
    let report = manager.initialize().await?;
    debug!(?report, "main: state initialized");

    debug!(command = ?cli.command, "main: dispatching command");
    let result = match cli.command {
        Command::List {
            category,
            search,
            favorites,
            all,
            format,
        } => cmd_list(&manager, category, search, favorites, all, format).await,
        Command::Show { id, format } => cmd_show(&manager, &id, format).await,
        Command::Add {
            title,
            content,
            file,
            category,
            description,
            tags,
        } => cmd_add(&manager, title, content, file, category, description, tags).await,
        Command::Edit {
            id,
            title,
            content,
            category,
            description,
            tags,
        } => cmd_edit(&manager, &id, title, content, category, description, tags).await,
        Command::Delete { id } => cmd_delete(&manager, &id).await,
        Command::Fav { id } => cmd_fav(&manager, id.as_deref()).await,
        Command::Rate {
            id,
            value,
            comment,
            liked,
        } => cmd_rate(&manager, &id, value, comment, liked).await,
        Command::History => cmd_history(&manager).await,
        Command::Categories => cmd_categories(&manager).await,
        Command::Fill { id, values } => cmd_fill(&manager, &id, &values).await,
        Command::Export { .. } => cmd_export(&manager).await,
        Command::Import { file } => cmd_import(&manager, &file).await,
        Command::Clear { yes } => cmd_clear(&manager, yes).await,
        Command::Reset { yes } => cmd_reset(&manager, yes).await,
        Command::Repair => cmd_repair(&manager).await,
        Command::Refresh {
            if_stale,
            interval,
            enable,
            disable,
        } => {
            let scheduler = scheduler(&manager, fetcher, effects);
            cmd_refresh(&manager, &scheduler, if_stale, interval, enable, disable).await
        }
        Command::Watch => {
            let scheduler = scheduler(&manager, fetcher, effects);
            cmd_watch(&manager, &scheduler, &config).await
        }
        Command::Theme { name } => cmd_theme(&manager, name.as_deref()).await,
        Command::Sort { mode } => cmd_sort(&manager, &mode).await,
    };

    if let Err(e) = manager.shutdown().await {
        warn!(error = %e, "main: shutdown failed");
    }
    result
}

fn scheduler(manager: &StateManager, fetcher: Arc<dyn CatalogFetcher>, effects: Arc<dyn PlatformEffects>) -> RefreshScheduler {
    RefreshScheduler::new(manager.clone(), fetcher, effects, RefreshConfig::default())
}

fn print_prompt_line(prompt: &Prompt, favorite: bool) {
    let star = if favorite { "★".yellow() } else { " ".normal() };
    let rating = if prompt.average_rating > 0.0 {
        format!("{:.1}", prompt.average_rating).yellow()
    } else {
        "-".dimmed()
    };
    println!(
        "{} {} {} {} {}",
        star,
        prompt.id.dimmed(),
        prompt.title.bold(),
        format!("[{}]", prompt.category).cyan(),
        rating
    );
}

async fn find_prompt(manager: &StateManager, id: &str) -> Result<Prompt> {
    manager
        .get_prompt(id)
        .await?
        .ok_or_else(|| eyre!("Prompt not found: {}", id))
}

async fn cmd_list(
    manager: &StateManager,
    category: Option<String>,
    search: Option<String>,
    favorites: bool,
    all: bool,
    format: OutputFormat,
) -> Result<()> {
    debug!(?category, ?search, favorites, all, "cmd_list: called");
    if all {
        manager
            .set_filters(Some(ALL_CATEGORY.to_string()), Some(String::new()))
            .await?;
        manager.set_show_favorites_only(false).await?;
    }
    if category.is_some() || search.is_some() {
        manager.set_filters(category, search).await?;
    }
    if favorites {
        manager.set_show_favorites_only(true).await?;
    }

    let state = manager.snapshot().await?;
    let view = manager.filtered_view().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Text => {
            if view.is_empty() {
                println!("No prompts match the current view");
            }
            for prompt in &view {
                print_prompt_line(prompt, state.is_favorite(&prompt.id));
            }
            println!(
                "{}",
                format!(
                    "{} of {} prompts (category: {}, search: '{}', sort: {})",
                    view.len(),
                    state.prompts.len(),
                    state.selected_category,
                    state.search_query,
                    state.sort_by
                )
                .dimmed()
            );
        }
    }
    Ok(())
}

async fn cmd_show(manager: &StateManager, id: &str, format: OutputFormat) -> Result<()> {
    debug!(%id, "cmd_show: called");
    let prompt = find_prompt(manager, id).await?;
    let parsed = template::parse(&prompt.content);

    if format == OutputFormat::Json {
        let doc = serde_json::json!({ "prompt": prompt, "fields": parsed.fields });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("{}", prompt.title.bold());
    println!("{} {}", "id:".dimmed(), prompt.id);
    println!("{} {}", "category:".dimmed(), prompt.category.cyan());
    if !prompt.tags.is_empty() {
        println!("{} {}", "tags:".dimmed(), prompt.tags.join(", "));
    }
    if !prompt.description.is_empty() {
        println!("{} {}", "description:".dimmed(), prompt.description);
    }
    println!("{} {}", "author:".dimmed(), prompt.author);
    println!("{} {:.1}", "rating:".dimmed(), prompt.average_rating);
    println!();
    println!("{}", prompt.content);
    if !parsed.fields.is_empty() {
        println!();
        println!("{}", "Fields:".bold());
        for field in &parsed.fields {
            print_field(field);
        }
    }
    Ok(())
}

fn print_field(field: &template::PlaceholderField) {
    let options = field
        .options
        .as_ref()
        .map(|o| format!(" ({})", o.join(" / ")))
        .unwrap_or_default();
    println!(
        "  {} {} {}{}",
        field.id.cyan(),
        format!("<{}>", field.field_type).dimmed(),
        field.label,
        options.dimmed()
    );
}

async fn cmd_add(
    manager: &StateManager,
    title: String,
    content: Option<String>,
    file: Option<PathBuf>,
    category: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
) -> Result<()> {
    debug!(%title, "cmd_add: called");
    let content = match (content, file) {
        (Some(content), _) => content,
        (None, Some(path)) => {
            fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))?
        }
        (None, None) => return Err(eyre!("Provide --content or --file")),
    };

    let draft = PromptDraft::new(title, content)
        .with_category(category.unwrap_or_default())
        .with_description(description.unwrap_or_default())
        .with_tags(tags);
    let id = manager.add_prompt(draft).await?;
    println!("{} Added prompt: {}", "✓".green(), id);
    Ok(())
}

async fn cmd_edit(
    manager: &StateManager,
    id: &str,
    title: Option<String>,
    content: Option<String>,
    category: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
) -> Result<()> {
    debug!(%id, "cmd_edit: called");
    let mut prompt = find_prompt(manager, id).await?;
    if let Some(title) = title {
        prompt.title = title;
    }
    if let Some(content) = content {
        prompt.content = content;
    }
    if let Some(category) = category {
        prompt.category = category;
    }
    if let Some(description) = description {
        prompt.description = description;
    }
    if let Some(tags) = tags {
        prompt.tags = tags;
    }

    if !manager.update_prompt(prompt).await? {
        return Err(eyre!("Prompt not found: {}", id));
    }
    println!("{} Updated prompt: {}", "✓".green(), id);
    Ok(())
}

async fn cmd_delete(manager: &StateManager, id: &str) -> Result<()> {
    debug!(%id, "cmd_delete: called");
    if !manager.delete_prompt(id).await? {
        return Err(eyre!("Prompt not found: {}", id));
    }
    println!("{} Deleted prompt: {}", "✓".green(), id);
    Ok(())
}

async fn cmd_fav(manager: &StateManager, id: Option<&str>) -> Result<()> {
    debug!(?id, "cmd_fav: called");
    let Some(id) = id else {
        let favorites = manager.favorites().await?;
        if favorites.is_empty() {
            println!("No favorites yet");
        }
        for prompt in &favorites {
            print_prompt_line(prompt, true);
        }
        return Ok(());
    };

    match manager.toggle_favorite(id).await? {
        Some(true) => println!("{} Added to favorites: {}", "★".yellow(), id),
        Some(false) => println!("{} Removed from favorites: {}", "✓".green(), id),
        None => return Err(eyre!("Prompt not found: {}", id)),
    }
    Ok(())
}

async fn cmd_rate(manager: &StateManager, id: &str, value: u8, comment: Option<String>, liked: bool) -> Result<()> {
    debug!(%id, value, "cmd_rate: called");
    let mut rating = UserRating::new(id, value, chrono::Utc::now());
    rating.comment = comment;
    rating.liked = liked;

    let average = manager
        .rate(id, rating)
        .await?
        .ok_or_else(|| eyre!("Prompt not found: {}", id))?;
    println!("{} Rated {} ({}/5), average {:.1}", "✓".green(), id, value, average);
    Ok(())
}

async fn cmd_history(manager: &StateManager) -> Result<()> {
    debug!("cmd_history: called");
    let state = manager.snapshot().await?;
    let history = manager.history().await?;
    if history.is_empty() {
        println!("No history yet");
    }
    for prompt in &history {
        print_prompt_line(prompt, state.is_favorite(&prompt.id));
    }
    Ok(())
}

async fn cmd_categories(manager: &StateManager) -> Result<()> {
    debug!("cmd_categories: called");
    for category in manager.categories().await? {
        println!(
            "{:>4} {} {}",
            category.prompt_count,
            category.id.cyan(),
            category.name.dimmed()
        );
    }
    Ok(())
}

async fn cmd_fill(manager: &StateManager, id: &str, raw_values: &[String]) -> Result<()> {
    debug!(%id, values = raw_values.len(), "cmd_fill: called");
    let prompt = find_prompt(manager, id).await?;
    let parsed = template::parse(&prompt.content);

    if raw_values.is_empty() {
        if parsed.fields.is_empty() {
            println!("{}", prompt.content);
        } else {
            println!("{}", "Fields:".bold());
            for field in &parsed.fields {
                print_field(field);
            }
        }
        return Ok(());
    }

    let values: HashMap<String, String> = parse_field_values(raw_values)
        .map_err(|e| eyre!(e))?
        .into_iter()
        .map(|(key, value)| (template::field_id(&key), value))
        .collect();

    let missing = parsed.missing_required(&values);
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.id.as_str()).collect();
        return Err(eyre!("Missing values for: {}", names.join(", ")));
    }

    println!("{}", template::substitute(&parsed.processed, &values));
    manager.add_to_history(id).await?;
    Ok(())
}

async fn cmd_export(manager: &StateManager) -> Result<()> {
    debug!("cmd_export: called");
    manager.export_json().await?;
    Ok(())
}

async fn cmd_import(manager: &StateManager, file: &Path) -> Result<()> {
    debug!(file = %file.display(), "cmd_import: called");
    let raw = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let count = manager.import_json(&raw).await?;
    println!("{} Imported {} prompts", "✓".green(), count);
    Ok(())
}

async fn cmd_clear(manager: &StateManager, yes: bool) -> Result<()> {
    debug!(yes, "cmd_clear: called");
    if !yes {
        return Err(eyre!("Refusing to clear the library without --yes"));
    }
    manager.clear_all().await?;
    println!("{} Cleared all prompts, favorites, ratings and history", "✓".green());
    Ok(())
}

async fn cmd_reset(manager: &StateManager, yes: bool) -> Result<()> {
    debug!(yes, "cmd_reset: called");
    if !yes {
        return Err(eyre!("Refusing to reset the library without --yes"));
    }
    let count = manager.reset_to_defaults().await?;
    println!("{} Reset to defaults ({} prompts)", "✓".green(), count);
    Ok(())
}

async fn cmd_repair(manager: &StateManager) -> Result<()> {
    debug!("cmd_repair: called");
    if manager.validate_and_repair().await? {
        println!("{} Repaired stored state", "✓".green());
    } else {
        println!("{} Nothing to repair", "✓".green());
    }
    Ok(())
}

async fn cmd_refresh(
    manager: &StateManager,
    scheduler: &RefreshScheduler,
    if_stale: bool,
    interval: Option<u32>,
    enable: bool,
    disable: bool,
) -> Result<()> {
    debug!(if_stale, ?interval, enable, disable, "cmd_refresh: called");
    let enabled = (enable || disable).then_some(enable);
    if interval.is_some() || enabled.is_some() {
        // Settings only; the timer runs under `watch`
        let meta = manager.update_refresh_settings(interval, enabled).await?;
        if interval.is_some() {
            println!("{} Refresh interval: {} minutes", "✓".green(), meta.refresh_interval_minutes);
        }
        if enabled.is_some() {
            println!("{} Background refresh enabled: {}", "✓".green(), meta.enabled);
        }
        if !if_stale {
            return Ok(());
        }
    }

    let outcome = if if_stale {
        scheduler.tick().await
    } else {
        scheduler.refresh_now().await
    };
    match outcome {
        TickOutcome::Refreshed(count) => {
            println!("{} Catalog refreshed ({} prompts)", "✓".green(), count);
            Ok(())
        }
        TickOutcome::Fresh => {
            println!("Catalog is fresh, nothing to do");
            Ok(())
        }
        TickOutcome::Disabled => {
            println!("Background refresh is disabled");
            Ok(())
        }
        TickOutcome::Skipped => {
            println!("A refresh is already running");
            Ok(())
        }
        TickOutcome::Failed => Err(eyre!("Refresh failed; the catalog was left unchanged (see log)")),
    }
}

async fn cmd_watch(manager: &StateManager, scheduler: &RefreshScheduler, config: &Config) -> Result<()> {
    debug!("cmd_watch: called");
    if let Some(minutes) = config.refresh.interval_minutes {
        scheduler.set_interval(minutes).await?;
    }
    if let Some(enabled) = config.refresh.enabled {
        scheduler.set_enabled(enabled).await?;
    }

    let mut events = manager.notifier().receiver();
    scheduler.start().await?;
    println!("Watching for catalog changes (phase: {:?}). Press Ctrl-C to stop.", scheduler.phase());

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => println!("{} {}", "•".cyan(), serde_json::to_string(&event)?),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    debug!(n, "cmd_watch: lagged behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, stopping watch");
                break;
            }
        }
    }

    scheduler.stop();
    Ok(())
}

async fn cmd_theme(manager: &StateManager, name: Option<&str>) -> Result<()> {
    debug!(?name, "cmd_theme: called");
    match name {
        Some(name) => manager.set_theme(name).await?,
        None => {
            manager.toggle_theme().await?;
        }
    }
    Ok(())
}

async fn cmd_sort(manager: &StateManager, mode: &str) -> Result<()> {
    debug!(%mode, "cmd_sort: called");
    let normalized = mode.trim().to_lowercase();
    let parsed = SortMode::parse(&normalized);
    if parsed == SortMode::Newest && !matches!(normalized.as_str(), "newest" | "date") {
        return Err(eyre!("Unknown sort mode: {}. Use newest, oldest, title, rating or usage", mode));
    }
    manager.set_sort_mode(parsed).await?;
    println!("{} Sort: {}", "✓".green(), parsed);
    Ok(())
}
