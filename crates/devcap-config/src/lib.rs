//! Shared configuration for devcap tools.
//!
//! TOML file + `DEVCAP_` environment layering, validation, and translation
//! into the runtime types `devcap_core` consumes (`EngineConfig`, a
//! repository loader, an optional index store). Core never reads config
//! files; the CLI builds everything through this crate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use devcap_core::capability;
use devcap_core::{
    CapabilityFilter, EngineConfig, FileStorage, JsonRepository, MatchMode, MatchPolicy,
    MemoryStorage, ReductionFloor, Storage,
};

const QUALIFIER: &str = "io";
const ORGANIZATION: &str = "devcap";
const APPLICATION: &str = "devcap";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub match_mode: MatchMode,

    #[serde(default)]
    pub reduction_floor: ReductionFloor,

    #[serde(default)]
    pub allow_reload: bool,

    /// Capabilities to keep when loading the repository. Empty keeps all.
    #[serde(default)]
    pub capability_filter: Vec<String>,

    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepositoryConfig {
    /// Main repository file.
    pub path: Option<PathBuf>,

    /// Patch files, applied in order.
    #[serde(default)]
    pub patches: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceProvider {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub provider: PersistenceProvider,

    /// Index directory; required for the `file` provider.
    pub dir: Option<PathBuf>,

    /// Reuse stored indices instead of rebuilding them.
    #[serde(default = "default_reuse")]
    pub reuse: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            provider: PersistenceProvider::Memory,
            dir: None,
            reuse: default_reuse(),
        }
    }
}

fn default_reuse() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    /// Enables daily-rolling file logs when set.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}

fn default_level() -> String {
    "warn".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default directory for file-persisted indices.
pub fn default_index_dir() -> PathBuf {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).map_or_else(
        || dirs_fallback().join("indices"),
        |dirs| dirs.data_dir().join("indices"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push(APPLICATION);
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from an explicit file + environment. A missing file is not an
/// error; the defaults and environment still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DEVCAP_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, cfg.to_toml()?)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks that hold regardless of what the caller goes on to build.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.persistence.provider == PersistenceProvider::File && self.persistence.dir.is_none()
        {
            return Err(ConfigError::Validation {
                field: "persistence.dir".into(),
                reason: "required when persistence.provider is \"file\"".into(),
            });
        }
        if tracing_level_is_unknown(&self.logging.level) {
            return Err(ConfigError::Validation {
                field: "logging.level".into(),
                reason: format!(
                    "expected one of error, warn, info, debug, trace; got '{}'",
                    self.logging.level
                ),
            });
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            policy: MatchPolicy {
                mode: self.match_mode,
                reduction_floor: self.reduction_floor,
            },
            allow_reload: self.allow_reload,
            reuse_indices: self.persistence.reuse,
        }
    }

    /// JSON repository loader with patches and the capability filter.
    pub fn repository(&self) -> Result<JsonRepository, ConfigError> {
        let path = self
            .repository
            .path
            .clone()
            .ok_or_else(|| ConfigError::Validation {
                field: "repository.path".into(),
                reason: "a repository file is required to build an engine".into(),
            })?;

        let mut repository =
            JsonRepository::new(path).with_patches(self.repository.patches.iter().cloned());
        if !self.capability_filter.is_empty() {
            repository = repository.with_filter(CapabilityFilter::new(
                self.capability_filter.iter().cloned(),
                capability::required_capabilities(),
            ));
        }
        Ok(repository)
    }

    /// Index store for the configured provider.
    pub fn storage(&self) -> Result<Arc<dyn Storage>, ConfigError> {
        match self.persistence.provider {
            PersistenceProvider::Memory => Ok(Arc::new(MemoryStorage::new())),
            PersistenceProvider::File => {
                let dir = self
                    .persistence
                    .dir
                    .clone()
                    .unwrap_or_else(default_index_dir);
                let storage = FileStorage::new(&dir).map_err(|e| ConfigError::Validation {
                    field: "persistence.dir".into(),
                    reason: e.to_string(),
                })?;
                Ok(Arc::new(storage))
            }
        }
    }
}

fn tracing_level_is_unknown(level: &str) -> bool {
    !matches!(
        level.to_ascii_lowercase().as_str(),
        "error" | "warn" | "info" | "debug" | "trace" | "off"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|jail| {
            let config = load_config_from(&jail.directory().join("missing.toml")).unwrap();
            assert_eq!(config, Config::default());
            assert!(config.persistence.reuse);
            assert_eq!(config.engine_config(), EngineConfig {
                reuse_indices: true,
                ..EngineConfig::default()
            });
            Ok(())
        });
    }

    #[test]
    fn file_then_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "devcap.toml",
                r#"
                    match_mode = "performance"
                    capability_filter = ["brand_name"]

                    [repository]
                    path = "devices.json"
                    patches = ["patch.json"]

                    [persistence]
                    provider = "file"
                    dir = "indices"
                "#,
            )?;
            jail.set_env("DEVCAP_REDUCTION_FLOOR", "tolerance");
            jail.set_env("DEVCAP_PERSISTENCE__REUSE", "false");

            let config = load_config_from(&jail.directory().join("devcap.toml")).unwrap();
            assert_eq!(config.match_mode, MatchMode::Performance);
            assert_eq!(config.reduction_floor, ReductionFloor::Tolerance);
            assert_eq!(config.persistence.provider, PersistenceProvider::File);
            assert!(!config.persistence.reuse);
            assert_eq!(config.repository.patches, vec![PathBuf::from("patch.json")]);
            assert_eq!(config.capability_filter, vec!["brand_name".to_owned()]);
            Ok(())
        });
    }

    #[test]
    fn file_provider_needs_a_directory() {
        Jail::expect_with(|jail| {
            jail.create_file("devcap.toml", "[persistence]\nprovider = \"file\"\n")?;
            let err = load_config_from(&jail.directory().join("devcap.toml")).unwrap_err();
            assert!(
                matches!(err, ConfigError::Validation { ref field, .. } if field == "persistence.dir")
            );
            Ok(())
        });
    }

    #[test]
    fn unknown_mode_is_a_figment_error() {
        Jail::expect_with(|jail| {
            jail.create_file("devcap.toml", "match_mode = \"turbo\"\n")?;
            let err = load_config_from(&jail.directory().join("devcap.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::Figment(_)));
            Ok(())
        });
    }

    #[test]
    fn repository_requires_a_path() {
        let err = Config::default().repository().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref field, .. } if field == "repository.path")
        );
    }

    #[test]
    fn save_round_trips_through_the_loader() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("nested").join("config.toml");
            let config = Config {
                allow_reload: true,
                repository: RepositoryConfig {
                    path: Some("wurfl.json".into()),
                    patches: Vec::new(),
                },
                ..Config::default()
            };
            save_config(&config, &path).unwrap();
            assert_eq!(load_config_from(&path).unwrap(), config);
            Ok(())
        });
    }

    #[test]
    fn file_storage_is_created_on_demand() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            persistence: PersistenceConfig {
                provider: PersistenceProvider::File,
                dir: Some(tmp.path().join("idx")),
                reuse: true,
            },
            ..Config::default()
        };
        config.storage().unwrap();
        assert!(tmp.path().join("idx").is_dir());
    }
}
