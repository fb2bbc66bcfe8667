//! World streaming facade.
//!
//! Owns the two streaming pipelines (heightfield terrain, scatter props)
//! and exposes the per-frame surface the host loop and the movement
//! controller consume: `update`, `height_at`, `colliders`,
//! `scatter_items`, `progress`/`is_ready`, `warmup`, and carve overlay
//! registration.
//!
//! # Invariants
//! - Within one `update`: demand reconcile → build ticks → despawn ticks
//!   → collider rebuild. Consumers reading between frames never observe
//!   a chunk as both ready and despawning.
//! - The carve overlay must be registered before anything builds; late
//!   registration is rejected rather than producing terrain that
//!   disagrees across chunks.

mod config;
mod world;

pub use config::WorldConfig;
pub use world::{WorldError, WorldStream};

pub fn crate_info() -> &'static str {
    "farfield-world v0.1.0"
}
