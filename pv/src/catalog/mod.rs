//! Catalog sources
//!
//! The remote catalog is a JSON document in one of four shapes. `parse`
//! tries them in order and keeps the first that yields prompts; `fetch`
//! issues the HTTP GET; `seed` decides where an empty library gets its
//! first prompts from.

mod defaults;
mod fetch;
mod parse;
mod seed;

pub use defaults::{DEFAULTS_JSON, default_prompts};
pub use fetch::{CatalogFetcher, DEFAULT_CATALOG_URL, FetchError, HttpFetcher, MAX_CATALOG_BYTES};
pub use parse::{CatalogError, ParseStrategy, backfill_all, ensure_unique_ids, parse_catalog};
pub use seed::{EmbeddedDefaults, RemoteCatalog, SeedSource, fetch_catalog};

#[cfg(test)]
pub(crate) use fetch::mock;
