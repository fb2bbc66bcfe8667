//! Budgeted chunk streaming shared by the terrain and scatter pipelines.
//!
//! # Invariants
//! - No frame exceeds its millisecond budget by more than one work unit.
//! - A chunk is only observable by consumers once fully built; cancelling
//!   a queued or building chunk leaks nothing.
//! - Demand is recomputed only when the observer crosses a chunk
//!   boundary, never per frame.

mod budget;
mod demand;
mod scheduler;

pub use budget::FrameBudget;
pub use demand::{keys_in_radius, DemandTracker};
pub use scheduler::{BuildJob, ChunkBuilder, ChunkState, JobProgress, Scheduler, SchedulerStats};

pub fn crate_info() -> &'static str {
    "farfield-stream v0.1.0"
}
