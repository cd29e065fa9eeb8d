//! Device classification and capability resolution.
//!
//! This crate turns a raw identification string (plus optional request
//! headers) into a concrete device id, then answers capability questions
//! about that device:
//!
//! - **[`Engine`]**: Facade owning the published snapshot. [`Engine::build`]
//!   loads a [`Repository`], validates the [`DeviceTree`] and builds (or
//!   loads from [`Storage`]) the per-family indices. Classification never
//!   fails; the worst outcome is a generic sentinel id.
//!
//! - **[`ClassifierChain`]**: Ordered [`Family`] classifiers. The first
//!   family that owns a string runs the exact → conclusive → recovery →
//!   recovery-catchall cascade and reports what happened in a
//!   [`MatchContext`].
//!
//! - **[`DeviceTree`]**: Devices linked by fall-back. Capability lookups
//!   walk toward the root, which defines every capability.
//!
//! - **[`VirtualCapabilityProvider`]**: Per-request derived values such as
//!   `is_smartphone` or `advertised_browser`, with per-device control
//!   overrides.

pub mod capability;
pub mod classifier;
pub mod constants;
pub mod device;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod normalizer;
pub mod request;
pub mod storage;

mod text;

// ── Primary re-exports ──────────────────────────────────────────────
pub use capability::{VirtualCapability, VirtualCapabilityProvider, VirtualValue};
pub use classifier::{
    ClassifierChain, ClassifierIndex, Family, MatchContext, MatchMode, MatchPolicy, MatchTier,
    ReductionFloor,
};
pub use device::{
    CapabilityFilter, Device, DeviceTree, InMemoryRepository, JsonRepository, Repository,
    ResolvedDevice,
};
pub use engine::{Classification, Engine, EngineConfig, IndexStats};
pub use error::CoreError;
pub use normalizer::Normalizer;
pub use request::Request;
pub use storage::{FileStorage, MemoryStorage, Storage};
