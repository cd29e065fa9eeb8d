//! CLI configuration: thin wrapper around `devcap_config`.
//!
//! Loads the layered config and applies `GlobalOpts` flag overrides
//! (--repository, --mode) before anything is built from it.

use std::path::PathBuf;
use std::sync::Arc;

use devcap_core::{Engine, MatchMode};

use crate::cli::{GlobalOpts, ModeArg};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use devcap_config::{Config, config_path, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file in effect: `--config` / `DEVCAP_CONFIG`, else the platform path.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load config from file + environment, then apply flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut config = devcap_config::load_config_from(&active_config_path(global))?;

    if let Some(ref path) = global.repository {
        config.repository.path = Some(path.clone());
    }
    if let Some(mode) = global.mode {
        config.match_mode = match mode {
            ModeArg::Accuracy => MatchMode::Accuracy,
            ModeArg::Performance => MatchMode::Performance,
        };
    }
    Ok(config)
}

/// Build the engine the configuration describes.
pub fn build_engine(config: &Config) -> Result<Engine, CliError> {
    let repository = config.repository()?;
    let storage = config.storage()?;
    tracing::debug!(
        repository = %repository.path().display(),
        mode = %config.match_mode,
        "building engine"
    );
    Ok(Engine::build(
        config.engine_config(),
        Arc::new(repository),
        Some(storage),
    )?)
}
