//! Fund and LP profiles (read-only snapshots consumed by the pipeline).

mod funds_model;
mod funds_traits;

pub use funds_model::*;
pub use funds_traits::*;
