//! Command implementations

pub mod backoff;
pub mod demo;
pub mod intervene;
pub mod presets;

use anyhow::{Context, Result};
use camino::Utf8Path;
use rebound_core::{ConfigLoader, RecoveryConfig};

/// Load strategies from `path`, or from the default location when absent
pub(crate) fn load_config(path: Option<&Utf8Path>) -> Result<RecoveryConfig> {
    let loader = ConfigLoader::new().context("Failed to locate config directory")?;

    match path {
        Some(path) => loader
            .load_from(path)
            .with_context(|| format!("Failed to load strategies from {}", path)),
        None => loader.load().context("Failed to load strategies"),
    }
}
