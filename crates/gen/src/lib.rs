//! Procedural generation for the farfield terrain.
//!
//! # Invariants
//! - Every function here is pure and deterministic for a fixed seed and
//!   tuning; chunk boundary continuity falls out of that (adjacent chunks
//!   evaluate the same functions at the same world coordinates).
//! - Noise is continuous at every lattice scale; no seams.

pub mod carve;
pub mod height;
pub mod noise;

pub use carve::{Basin, CarveOverlay, Channel};
pub use height::{HeightField, HeightTuning};
pub use noise::{fbm, ridged, value_noise2, NoiseParams};
