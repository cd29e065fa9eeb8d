//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use devcap_config::ConfigError;
use devcap_core::CoreError;

/// Process exit codes. Success is 0.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFIG: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Lookups ──────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(devcap::not_found), help("{hint}"))]
    NotFound {
        resource_type: String,
        identifier: String,
        hint: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(devcap::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No device repository configured")]
    #[diagnostic(
        code(devcap::no_repository),
        help(
            "Pass --repository <FILE>, set DEVCAP_REPOSITORY__PATH, or add\n\
             [repository] path = \"...\" to {path}"
        )
    )]
    NoRepository { path: String },

    #[error("Device repository is invalid: {message}")]
    #[diagnostic(
        code(devcap::invalid_repository),
        help("Every device must reach exactly one root, and the root must define every capability.")
    )]
    InvalidRepository { message: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(devcap::config))]
    Config { message: String },

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(code(devcap::config_exists), help("Use --force to overwrite it."))]
    ConfigExists { path: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    #[diagnostic(code(devcap::internal))]
    Internal { message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            Self::NoRepository { .. } | Self::InvalidRepository { .. } | Self::Config { .. } => {
                exit_code::CONFIG
            }
            Self::ConfigExists { .. } | Self::Io(_) | Self::Internal { .. } => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownDevice { id } => CliError::NotFound {
                resource_type: "device".into(),
                identifier: id,
                hint: "Run: devcap classify <UA> to find a device id".into(),
            },

            CoreError::UnknownCapability { name } => CliError::NotFound {
                resource_type: "capability".into(),
                identifier: name,
                hint: "Run: devcap device generic to list every capability".into(),
            },

            CoreError::UnknownVirtualCapability { name } => CliError::NotFound {
                resource_type: "virtual capability".into(),
                identifier: name,
                hint: "Run: devcap virtual <UA> to list every virtual capability".into(),
            },

            CoreError::MissingRoot
            | CoreError::MultipleRoots { .. }
            | CoreError::DuplicateDevice { .. }
            | CoreError::MissingParent { .. }
            | CoreError::Cycle { .. }
            | CoreError::UndefinedAtRoot { .. }
            | CoreError::AmbiguousCapability { .. }
            | CoreError::MissingRequiredCapability { .. }
            | CoreError::Repository { .. } => CliError::InvalidRepository {
                message: err.to_string(),
            },

            CoreError::Io(e) => CliError::Io(e),

            CoreError::Storage { .. } | CoreError::ReloadDisabled => CliError::Internal {
                message: err.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, .. } if field == "repository.path" => {
                CliError::NoRepository {
                    path: devcap_config::config_path().display().to_string(),
                }
            }
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
