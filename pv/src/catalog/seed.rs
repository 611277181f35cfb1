use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::defaults::default_prompts;
use super::fetch::CatalogFetcher;
use super::parse::{CatalogError, backfill_all, parse_catalog};
use crate::domain::Prompt;

/// Fetch, parse and backfill a remote catalog
pub async fn fetch_catalog(fetcher: &dyn CatalogFetcher) -> Result<Vec<Prompt>, CatalogError> {
    debug!("fetch_catalog: called");
    let bytes = fetcher.fetch().await?;
    let (strategy, mut prompts) = parse_catalog(&bytes)?;
    backfill_all(&mut prompts, Utc::now());
    info!(?strategy, count = prompts.len(), "fetched remote catalog");
    Ok(prompts)
}

/// Where an empty library gets its first prompts
#[async_trait]
pub trait SeedSource: Send + Sync {
    async fn seed(&self) -> Vec<Prompt>;
}

/// The compiled-in catalog
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedDefaults;

#[async_trait]
impl SeedSource for EmbeddedDefaults {
    async fn seed(&self) -> Vec<Prompt> {
        debug!("EmbeddedDefaults::seed: called");
        default_prompts()
    }
}

/// The remote catalog, falling back to the embedded one
pub struct RemoteCatalog {
    fetcher: Arc<dyn CatalogFetcher>,
}

impl RemoteCatalog {
    pub fn new(fetcher: Arc<dyn CatalogFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl SeedSource for RemoteCatalog {
    async fn seed(&self) -> Vec<Prompt> {
        debug!("RemoteCatalog::seed: called");
        match fetch_catalog(self.fetcher.as_ref()).await {
            Ok(prompts) => prompts,
            Err(e) => {
                warn!(error = %e, "remote seed failed, using embedded defaults");
                default_prompts()
            }
        }
    }
}
