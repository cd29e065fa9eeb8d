//! Approximate string matchers used by the conclusive tier.

mod distance;
mod prefix;

pub use distance::edit_distance_match;
pub use prefix::{SortedKeys, prefix_reduction, prefix_reduction_with_floor};
