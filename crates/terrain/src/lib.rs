//! Streamed heightfield terrain.
//!
//! # Invariants
//! - A chunk's height grid is only queryable once the chunk is fully
//!   built (normals included); partial grids live inside build jobs.
//! - Adjacent ready chunks agree exactly at shared boundaries because
//!   both evaluate the same pure height function at the same world
//!   coordinates — there is no stitching step to get wrong.

mod chunk;
mod stream;

pub use chunk::{HeightChunk, TerrainBuildJob, TerrainBuilder};
pub use stream::{TerrainConfig, TerrainStream};
