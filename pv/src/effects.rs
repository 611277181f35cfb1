//! Platform effects
//!
//! One-way side effects the state layer triggers on its host: applying a
//! theme, offering a file download and showing a toast. They return nothing;
//! an implementation that fails must swallow the failure itself.

use std::fmt;

use tracing::{debug, info, warn};

/// Severity of a toast notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for ToastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToastLevel::Info => "info",
            ToastLevel::Success => "success",
            ToastLevel::Warning => "warning",
            ToastLevel::Error => "error",
        };
        f.write_str(name)
    }
}

pub trait PlatformEffects: Send + Sync {
    fn apply_theme(&self, theme: &str);

    fn download_file(&self, filename: &str, content: &str);

    fn notify(&self, message: &str, level: ToastLevel);
}

/// Routes every effect to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEffects;

impl PlatformEffects for LogEffects {
    fn apply_theme(&self, theme: &str) {
        info!(%theme, "theme applied");
    }

    fn download_file(&self, filename: &str, content: &str) {
        info!(%filename, bytes = content.len(), "download offered");
    }

    fn notify(&self, message: &str, level: ToastLevel) {
        match level {
            ToastLevel::Warning | ToastLevel::Error => warn!(%level, "{message}"),
            _ => info!(%level, "{message}"),
        }
    }
}

/// Discards every effect
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEffects;

impl PlatformEffects for NoopEffects {
    fn apply_theme(&self, theme: &str) {
        debug!(%theme, "NoopEffects::apply_theme");
    }

    fn download_file(&self, filename: &str, _content: &str) {
        debug!(%filename, "NoopEffects::download_file");
    }

    fn notify(&self, _message: &str, level: ToastLevel) {
        debug!(%level, "NoopEffects::notify");
    }
}
