//! Runtime: outline state, section generation, outline planning, version tracking.
//!
//! Generation is sequential by construction: `SectionGenerator::generate_all`
//! walks a queue of section ids in outline order and commits each result to
//! the shared `OutlineState` before the next request reads its neighbors.

pub mod cache;
pub mod orchestrator;
pub mod outline;
pub mod planner;
pub mod types;
pub mod versions;

#[cfg(test)]
mod testing;

pub use cache::{outline_cache_key, TtlCache};
pub use orchestrator::SectionGenerator;
pub use outline::{BatchGuard, OutlineState, OwnedBatchGuard};
pub use planner::{OutlinePlanner, PlannedOutline};
pub use types::*;
pub use versions::{PerformanceReport, VersionComparison, VersionSide, VersionTracker};
