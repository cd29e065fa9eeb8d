//! Family classifier chain.
//!
//! A request's identification string is normalized once, handed to the
//! first [`Family`] that owns it, and run through that family's
//! exact → conclusive → recovery → recovery-catchall cascade.

mod catalog;
mod chain;
mod context;
mod family;
pub mod heuristics;
mod index;

pub use chain::{
    ClassifierChain, HIGH_PERFORMANCE, MatchMode, MatchPolicy, ReductionFloor, is_blank_or_generic,
};
pub use context::{MatchContext, MatchTier, TrailStep};
pub use family::{Conclusive, Family};
pub use index::ClassifierIndex;
