//! ECS systems for the map core.
//!
//! Systems contain the per-frame logic that operates on the grid.
//!
//! - `tiberium_growth_system` - scans a slice of the grid each frame and
//!   grows or spreads Tiberium when a sweep completes
//!
//! Snapshot serialization helpers live alongside them.

pub mod growth;
pub mod serialization;

pub use growth::{tiberium_growth_system, IncrementalScanner, TiberiumGrowth};
pub use serialization::*;
