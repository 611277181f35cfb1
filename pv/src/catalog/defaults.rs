//! Embedded default catalog
//!
//! Compiled in from `catalog/defaults.json` so a fresh library has prompts
//! even when the remote catalog is unreachable.

use tracing::{debug, warn};

use super::parse::parse_catalog;
use crate::domain::Prompt;

pub const DEFAULTS_JSON: &str = include_str!("../../catalog/defaults.json");

/// The built-in prompts
pub fn default_prompts() -> Vec<Prompt> {
    debug!("default_prompts: called");
    match parse_catalog(DEFAULTS_JSON.as_bytes()) {
        Ok((_, prompts)) => prompts,
        Err(e) => {
            warn!(error = %e, "default_prompts: embedded catalog unreadable");
            Vec::new()
        }
    }
}
