//! Procedurally placed scatter (vegetation, rocks, landmarks) with
//! matching collision proxies.
//!
//! # Invariants
//! - Placement is deterministic per chunk key: the per-chunk RNG stream
//!   is seeded from the chunk coordinates and consumed in a fixed order,
//!   so re-streaming a chunk reproduces it bit for bit.
//! - Every emitted collider has a positive, bounded radius and a
//!   non-inverted vertical range; degenerate prototypes lose their
//!   collider (logged), never their visual.

mod chunk;
mod collider;
mod kinds;
mod rng;
mod stream;

pub use chunk::{ScatterBuildJob, ScatterBuilder, ScatterChunk};
pub use collider::{resolve_collisions, ColliderProxy, ColliderTemplate, TemplateError};
pub use kinds::{PropId, PropInstance, PropKind, Prototype, PrototypeBounds, PrototypeTable};
pub use rng::ChunkRng;
pub use stream::{ScatterConfig, ScatterStream};
