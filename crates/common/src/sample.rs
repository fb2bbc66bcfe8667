/// A source of terrain heights.
///
/// Implemented by the procedural height function (always available) and
/// by the terrain pipeline (cache fast path with procedural fallback).
/// Consumers take this explicitly instead of reaching for a global
/// terrain instance.
pub trait HeightSampler {
    fn height_at(&self, x: f32, z: f32) -> f32;
}
