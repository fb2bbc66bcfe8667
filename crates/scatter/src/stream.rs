use serde::{Deserialize, Serialize};

use farfield_common::{ChunkGrid, ChunkKey, HeightSampler};
use farfield_stream::{ChunkState, DemandTracker, FrameBudget, Scheduler};

use crate::chunk::ScatterBuilder;
use crate::collider::ColliderProxy;
use crate::kinds::{PropInstance, PrototypeTable};

/// Scatter streaming tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterConfig {
    /// World-space side length of one scatter tile. Independent of the
    /// terrain tile size.
    pub chunk_size: f32,
    /// Tiles resident in every direction around the observer.
    pub stream_radius: i32,
    /// Mixed into every per-chunk RNG seed.
    pub seed: u32,
    /// No scatter items inside this radius around the world origin.
    pub spawn_clearance: f32,
    /// Landmarks only appear in chunks whose center is at least this far
    /// from the origin.
    pub landmark_min_distance: f32,
    pub landmark_chance: f32,
    pub tree_count_base: u32,
    pub tree_count_spread: u32,
    pub rock_count_base: u32,
    pub rock_count_spread: u32,
    /// Per-frame build budget, milliseconds.
    pub build_budget_ms: f64,
    /// Per-frame despawn budget, milliseconds.
    pub despawn_budget_ms: f64,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 80.0,
            stream_radius: 2,
            seed: 0,
            spawn_clearance: 20.0,
            landmark_min_distance: 85.0,
            landmark_chance: 0.18,
            tree_count_base: 10,
            tree_count_spread: 14,
            rock_count_base: 4,
            rock_count_spread: 8,
            build_budget_ms: 1.0,
            despawn_budget_ms: 0.5,
        }
    }
}

/// The scatter pipeline: demand tracking plus budgeted placement
/// streaming. Heights are read through the sampler passed into each
/// tick — the terrain service in production, anything in tests.
pub struct ScatterStream {
    grid: ChunkGrid,
    demand: DemandTracker,
    scheduler: Scheduler<ScatterBuilder>,
    build_budget_ms: f64,
    despawn_budget_ms: f64,
}

impl ScatterStream {
    pub fn new(config: ScatterConfig, prototypes: PrototypeTable) -> Self {
        let grid = ChunkGrid::new(config.chunk_size);
        let demand = DemandTracker::new(config.stream_radius);
        let build_budget_ms = config.build_budget_ms;
        let despawn_budget_ms = config.despawn_budget_ms;
        let builder = ScatterBuilder::new(grid, config, prototypes);
        Self {
            grid,
            demand,
            scheduler: Scheduler::new(builder),
            build_budget_ms,
            despawn_budget_ms,
        }
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    /// Per-frame drive: recompute demand on chunk-boundary crossing,
    /// then run the budgeted build and despawn ticks.
    pub fn update(&mut self, observer_x: f32, observer_z: f32, heights: &dyn HeightSampler) {
        let center = self.grid.key_at(observer_x, observer_z);
        if let Some(want) = self.demand.update(center) {
            tracing::debug!(?center, chunks = want.len(), "scatter demand recomputed");
            self.scheduler.apply_demand(center, want);
        }
        self.scheduler
            .build_tick(heights, FrameBudget::millis(self.build_budget_ms));
        self.scheduler
            .despawn_tick(FrameBudget::millis(self.despawn_budget_ms));
    }

    /// One warmup iteration: unbounded budgets, no demand recompute.
    pub fn drain_tick(&mut self, heights: &dyn HeightSampler) {
        self.scheduler.build_tick(heights, FrameBudget::unlimited());
        self.scheduler.despawn_tick(FrameBudget::unlimited());
    }

    pub fn reset_demand(&mut self) {
        self.demand.reset();
    }

    /// All placed items across ready chunks.
    pub fn items(&self) -> impl Iterator<Item = &PropInstance> {
        self.scheduler
            .iter_ready()
            .flat_map(|(_, chunk)| chunk.items().iter())
    }

    /// All collider proxies across ready chunks.
    pub fn colliders(&self) -> impl Iterator<Item = &ColliderProxy> {
        self.scheduler
            .iter_ready()
            .flat_map(|(_, chunk)| chunk.colliders().iter())
    }

    /// Bumped whenever the set of ready chunks changes; the world facade
    /// uses it to dirty-flag its combined collider list.
    pub fn revision(&self) -> u64 {
        self.scheduler.revision()
    }

    pub fn state(&self, key: ChunkKey) -> ChunkState {
        self.scheduler.state(key)
    }

    pub fn chunk(&self, key: ChunkKey) -> Option<&crate::chunk::ScatterChunk> {
        self.scheduler.get(key)
    }

    pub fn ready_count(&self) -> usize {
        self.scheduler.ready_count()
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
