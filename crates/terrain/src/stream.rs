use std::sync::Arc;

use serde::{Deserialize, Serialize};

use farfield_common::{ChunkGrid, ChunkKey, HeightSampler};
use farfield_gen::HeightField;
use farfield_stream::{ChunkState, DemandTracker, FrameBudget, Scheduler};

use crate::chunk::TerrainBuilder;

/// Terrain streaming tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// World-space side length of one terrain tile.
    pub chunk_size: f32,
    /// Grid subdivisions per tile; the height grid is (segments+1)².
    pub segments: u32,
    /// Tiles resident in every direction around the observer.
    pub load_radius: i32,
    /// Per-frame build budget, milliseconds.
    pub build_budget_ms: f64,
    /// Per-frame despawn budget, milliseconds. Smaller than the build
    /// budget: unload is never urgent.
    pub despawn_budget_ms: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunk_size: 80.0,
            segments: 80,
            load_radius: 3,
            build_budget_ms: 2.3,
            despawn_budget_ms: 0.8,
        }
    }
}

/// The terrain pipeline: demand tracking, budgeted chunk streaming, and
/// the height sample cache.
pub struct TerrainStream {
    grid: ChunkGrid,
    segments: u32,
    field: Arc<HeightField>,
    demand: DemandTracker,
    scheduler: Scheduler<TerrainBuilder>,
    build_budget_ms: f64,
    despawn_budget_ms: f64,
}

impl TerrainStream {
    pub fn new(config: &TerrainConfig, field: Arc<HeightField>) -> Self {
        let grid = ChunkGrid::new(config.chunk_size);
        let builder = TerrainBuilder::new(grid, config.segments, Arc::clone(&field));
        Self {
            grid,
            segments: config.segments,
            field,
            demand: DemandTracker::new(config.load_radius),
            scheduler: Scheduler::new(builder),
            build_budget_ms: config.build_budget_ms,
            despawn_budget_ms: config.despawn_budget_ms,
        }
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    /// Per-frame drive: recompute demand if the observer crossed a chunk
    /// boundary, then run the budgeted build and despawn ticks.
    pub fn update(&mut self, observer_x: f32, observer_z: f32) {
        let center = self.grid.key_at(observer_x, observer_z);
        if let Some(want) = self.demand.update(center) {
            tracing::debug!(?center, chunks = want.len(), "terrain demand recomputed");
            self.scheduler.apply_demand(center, want);
        }
        self.scheduler
            .build_tick(&(), FrameBudget::millis(self.build_budget_ms));
        self.scheduler
            .despawn_tick(FrameBudget::millis(self.despawn_budget_ms));
    }

    /// One warmup iteration: unbounded budgets, no demand recompute.
    pub fn drain_tick(&mut self) {
        self.scheduler.build_tick(&(), FrameBudget::unlimited());
        self.scheduler.despawn_tick(FrameBudget::unlimited());
    }

    /// Forget the cached observer cell so the next `update` recomputes
    /// demand even if the observer has not moved.
    pub fn reset_demand(&mut self) {
        self.demand.reset();
    }

    /// Fast path: bilinear interpolation over the owning ready chunk.
    /// `None` when that chunk is absent or still building; callers fall
    /// back to the procedural function.
    pub fn cached_height(&self, x: f32, z: f32) -> Option<f32> {
        let key = self.grid.key_at(x, z);
        let chunk = self.scheduler.get(key)?;

        let cell = self.grid.cell_size();
        let (origin_x, origin_z) = self.grid.origin(key);
        let u = ((x - origin_x) / cell).clamp(0.0, 1.0);
        let v = ((z - origin_z) / cell).clamp(0.0, 1.0);

        let seg = self.segments as f32;
        let gx = u * seg;
        let gz = v * seg;

        let x0 = gx.floor() as u32;
        let z0 = gz.floor() as u32;
        let x1 = (x0 + 1).min(self.segments);
        let z1 = (z0 + 1).min(self.segments);

        let tx = gx - x0 as f32;
        let tz = gz - z0 as f32;

        let h00 = chunk.height_at_vertex(x0, z0);
        let h10 = chunk.height_at_vertex(x1, z0);
        let h01 = chunk.height_at_vertex(x0, z1);
        let h11 = chunk.height_at_vertex(x1, z1);

        let a = h00 + (h10 - h00) * tx;
        let b = h01 + (h11 - h01) * tx;
        Some(a + (b - a) * tz)
    }

    /// Always-succeeding height query: cache fast path, direct
    /// procedural evaluation otherwise (teleports, unstreamed areas).
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.cached_height(x, z)
            .unwrap_or_else(|| self.field.height_at(x, z))
    }

    pub fn state(&self, key: ChunkKey) -> ChunkState {
        self.scheduler.state(key)
    }

    pub fn ready_count(&self) -> usize {
        self.scheduler.ready_count()
    }

    pub fn demanded(&self) -> usize {
        self.scheduler.want().len()
    }

    pub fn progress(&self) -> f32 {
        self.scheduler.progress()
    }

    pub fn is_ready(&self) -> bool {
        self.scheduler.is_ready()
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }
}

impl HeightSampler for TerrainStream {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        TerrainStream::height_at(self, x, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farfield_gen::HeightTuning;

    fn small_stream() -> TerrainStream {
        let config = TerrainConfig {
            chunk_size: 80.0,
            segments: 16,
            load_radius: 1,
            ..TerrainConfig::default()
        };
        TerrainStream::new(
            &config,
            Arc::new(HeightField::new(HeightTuning::default())),
        )
    }

    fn warm(stream: &mut TerrainStream, x: f32, z: f32) {
        stream.update(x, z);
        while !(stream.is_ready() && stream.is_idle()) {
            stream.drain_tick();
        }
    }

    #[test]
    fn streams_demand_around_observer() {
        let mut stream = small_stream();
        warm(&mut stream, 0.0, 0.0);
        assert_eq!(stream.ready_count(), 9);
        assert_eq!(stream.progress(), 1.0);
    }

    #[test]
    fn cache_unavailable_before_streaming() {
        let stream = small_stream();
        assert!(stream.cached_height(0.0, 0.0).is_none());
        // Fallback still answers.
        let h = stream.height_at(0.0, 0.0);
        assert!(h.is_finite());
    }

    #[test]
    fn cache_is_exact_at_grid_vertices() {
        let mut stream = small_stream();
        warm(&mut stream, 0.0, 0.0);
        let step = 80.0 / 16.0;
        for i in 0..=16u32 {
            let x = i as f32 * step;
            let z = (i % 8) as f32 * step;
            let cached = stream.cached_height(x, z).unwrap();
            let direct = stream.field().height_at(x, z);
            assert!(
                (cached - direct).abs() < 1e-4,
                "vertex ({x},{z}): cached {cached} vs direct {direct}"
            );
        }
    }

    #[test]
    fn cache_agrees_with_procedural_within_bilinear_bound() {
        let mut stream = small_stream();
        warm(&mut stream, 0.0, 0.0);
        // Cell size is 5m here; the interpolation error bound scales
        // with cell² times surface curvature, comfortably under 1m for
        // this tuning.
        for i in 0..40 {
            let x = -60.0 + i as f32 * 3.3;
            let z = 55.0 - i as f32 * 2.7;
            let cached = stream.cached_height(x, z).unwrap();
            let direct = stream.field().height_at(x, z);
            assert!(
                (cached - direct).abs() < 1.0,
                "({x},{z}): cached {cached} vs direct {direct}"
            );
        }
    }

    #[test]
    fn boundary_samples_agree_across_chunks() {
        let mut stream = small_stream();
        warm(&mut stream, 0.0, 0.0);
        // Points a hair on either side of the x=0 chunk seam.
        for i in 0..20 {
            let z = i as f32 * 3.7 - 30.0;
            let left = stream.height_at(-1e-3, z);
            let right = stream.height_at(1e-3, z);
            assert!(
                (left - right).abs() < 0.05,
                "seam jump at z={z}: {left} vs {right}"
            );
        }
    }

    #[test]
    fn moving_observer_restreams_and_despawns() {
        let mut stream = small_stream();
        warm(&mut stream, 0.0, 0.0);
        // Jump several chunks east; trailing chunks must go away.
        warm(&mut stream, 400.0, 0.0);
        assert_eq!(stream.ready_count(), 9);
        assert_eq!(stream.state(ChunkKey::new(-1, 0)), ChunkState::Unqueued);
        assert_eq!(stream.state(ChunkKey::new(5, 0)), ChunkState::Ready);
    }
}
