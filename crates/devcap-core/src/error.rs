// ── Core error types ──
//
// Classification itself never fails; these cover repository integrity
// (fatal at build time), lookups by unknown id or name, and the
// persistence/loader collaborators.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup errors ────────────────────────────────────────────────
    #[error("Unknown device: {id}")]
    UnknownDevice { id: String },

    #[error("Unknown capability: {name}")]
    UnknownCapability { name: String },

    #[error("Unknown virtual capability: {name}")]
    UnknownVirtualCapability { name: String },

    // ── Repository integrity errors ──────────────────────────────────
    #[error("Repository has no root device")]
    MissingRoot,

    #[error("Repository has more than one root device: {first} and {second}")]
    MultipleRoots { first: String, second: String },

    #[error("Duplicate device id: {id}")]
    DuplicateDevice { id: String },

    #[error("Device {id} falls back to unknown device {parent}")]
    MissingParent { id: String, parent: String },

    #[error("Fall-back cycle detected at device {id}")]
    Cycle { id: String },

    #[error("Capability {group}/{name} used by {id} is not defined at root")]
    UndefinedAtRoot {
        id: String,
        group: String,
        name: String,
    },

    #[error("Capability {name} is defined in both group {first} and group {second}")]
    AmbiguousCapability {
        name: String,
        first: String,
        second: String,
    },

    #[error("Capability {name} required by virtual capabilities is not defined at root")]
    MissingRequiredCapability { name: String },

    // ── Collaborator errors ──────────────────────────────────────────
    #[error("Repository error: {message}")]
    Repository { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Reload is disabled by configuration")]
    ReloadDisabled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Repository {
            message: err.to_string(),
        }
    }
}
