use std::sync::Arc;

use glam::Vec3;

use farfield_gen::{CarveOverlay, HeightField};
use farfield_scatter::{ColliderProxy, PropInstance, PrototypeTable, ScatterStream};
use farfield_terrain::TerrainStream;

use crate::config::WorldConfig;

/// Errors surfaced by the facade.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("carve overlay must be registered before any chunk build starts")]
    CarveRegisteredLate,
}

/// The streaming world around a single moving observer.
///
/// Consumers hold this by reference and query it between frames; all
/// mutation happens inside `update` (or the one-time `warmup`), never
/// interleaved with reads.
pub struct WorldStream {
    config: WorldConfig,
    terrain: TerrainStream,
    scatter: ScatterStream,
    colliders: Vec<ColliderProxy>,
    colliders_revision: u64,
    build_started: bool,
}

impl WorldStream {
    pub fn new(config: WorldConfig) -> Self {
        let field = Arc::new(HeightField::new(config.height.clone()));
        let terrain = TerrainStream::new(&config.terrain, field);
        let scatter = ScatterStream::new(config.scatter.clone(), PrototypeTable::with_defaults());
        Self {
            config,
            terrain,
            scatter,
            colliders: Vec::new(),
            colliders_revision: 0,
            build_started: false,
        }
    }

    /// Install the water carve overlay. Must happen before any build
    /// tick has run; registering later would leave already-baked chunks
    /// disagreeing with everything baked afterwards, so it is refused.
    pub fn register_carve_overlay(&mut self, overlay: CarveOverlay) -> Result<(), WorldError> {
        if self.build_started {
            return Err(WorldError::CarveRegisteredLate);
        }
        let mut field = HeightField::new(self.config.height.clone());
        field.set_carve(overlay);
        // Nothing has built yet, so swapping the terrain pipeline for one
        // holding the carved field is unobservable.
        self.terrain = TerrainStream::new(&self.config.terrain, Arc::new(field));
        tracing::debug!("carve overlay registered");
        Ok(())
    }

    /// Advance both pipelines one frame. Called once per frame by the
    /// host loop with the observer's position.
    pub fn update(&mut self, observer: Vec3, _dt: f32) {
        let _span = tracing::trace_span!("world_update").entered();
        self.build_started = true;
        self.terrain.update(observer.x, observer.z);
        self.scatter.update(observer.x, observer.z, &self.terrain);
        self.refresh_colliders();
    }

    /// Synchronous initial drain, used behind the loading screen before
    /// the observer may move. Bounded by `warmup_max_frames`; returns
    /// whether full readiness was reached. Falling short is soft
    /// degradation — the caller proceeds anyway.
    pub fn warmup(&mut self, observer: Vec3) -> bool {
        let _span = tracing::info_span!("warmup").entered();
        self.build_started = true;
        self.terrain.reset_demand();
        self.scatter.reset_demand();
        self.terrain.update(observer.x, observer.z);
        self.scatter.update(observer.x, observer.z, &self.terrain);

        for _ in 0..self.config.warmup_max_frames {
            if self.terrain.is_ready()
                && self.scatter.is_ready()
                && self.terrain.is_idle()
                && self.scatter.is_idle()
            {
                break;
            }
            self.terrain.drain_tick();
            self.scatter.drain_tick(&self.terrain);
        }
        self.refresh_colliders();

        let ready = self.is_ready();
        if !ready {
            tracing::warn!(
                frames = self.config.warmup_max_frames,
                "warmup frame cap reached before full readiness, proceeding"
            );
        }
        ready
    }

    /// Terrain height at a world point; always succeeds (cache fast
    /// path, procedural fallback).
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.terrain.height_at(x, z)
    }

    /// The combined collider list, rebuilt lazily when any chunk's
    /// collider set changed. Consumed by the movement controller every
    /// frame.
    pub fn colliders(&self) -> &[ColliderProxy] {
        &self.colliders
    }

    /// All placed scatter items; registration systems attach behavior by
    /// the item's stable id.
    pub fn scatter_items(&self) -> impl Iterator<Item = &PropInstance> {
        self.scatter.items()
    }

    /// Combined loading progress in [0, 1]; the minimum of the two
    /// pipelines so the loading screen never reports done early.
    pub fn progress(&self) -> f32 {
        self.terrain.progress().min(self.scatter.progress())
    }

    pub fn is_ready(&self) -> bool {
        self.terrain.is_ready() && self.scatter.is_ready()
    }

    pub fn terrain(&self) -> &TerrainStream {
        &self.terrain
    }

    pub fn scatter(&self) -> &ScatterStream {
        &self.scatter
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    fn refresh_colliders(&mut self) {
        let revision = self.scatter.revision();
        if revision == self.colliders_revision {
            return;
        }
        self.colliders.clear();
        self.colliders.extend(self.scatter.colliders().copied());
        self.colliders_revision = revision;
        tracing::trace!(count = self.colliders.len(), "collider list rebuilt");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farfield_common::ChunkKey;
    use farfield_gen::Basin;
    use farfield_stream::ChunkState;

    /// Small grids so tests stay fast; streaming radii per the stock
    /// defaults.
    fn test_config() -> WorldConfig {
        let mut config = WorldConfig::default().with_seed(11);
        config.terrain.segments = 8;
        config
    }

    #[test]
    fn warmup_reaches_full_readiness() {
        let mut world = WorldStream::new(test_config());
        assert!(world.warmup(Vec3::ZERO));
        // Radius 3 → 7×7 terrain chunks; radius 2 → 5×5 scatter chunks.
        assert_eq!(world.terrain().ready_count(), 49);
        assert_eq!(world.scatter().ready_count(), 25);
        assert_eq!(world.progress(), 1.0);
        assert!(world.is_ready());
    }

    #[test]
    fn colliders_populated_after_warmup() {
        let mut world = WorldStream::new(test_config());
        world.warmup(Vec3::ZERO);
        assert!(!world.colliders().is_empty());
        for c in world.colliders() {
            assert!(c.radius > 0.0);
            assert!(c.y_min <= c.y_max);
        }
        assert!(world.scatter_items().count() >= world.colliders().len());
    }

    #[test]
    fn late_carve_registration_is_rejected() {
        let mut world = WorldStream::new(test_config());
        world.update(Vec3::ZERO, 0.016);
        let overlay = CarveOverlay::new(2.0).with_basin(Basin {
            x: 100.0,
            z: 0.0,
            radius: 12.0,
            depth: 1.2,
        });
        assert!(matches!(
            world.register_carve_overlay(overlay),
            Err(WorldError::CarveRegisteredLate)
        ));
    }

    #[test]
    fn carve_overlay_lowers_streamed_terrain() {
        let mut flat = WorldStream::new(test_config());
        flat.warmup(Vec3::ZERO);
        let uncarved = flat.height_at(100.0, 0.0);

        let mut carved = WorldStream::new(test_config());
        let overlay = CarveOverlay::new(2.0).with_basin(Basin {
            x: 100.0,
            z: 0.0,
            radius: 12.0,
            depth: 1.2,
        });
        carved.register_carve_overlay(overlay).unwrap();
        carved.warmup(Vec3::ZERO);
        let lake_bed = carved.height_at(100.0, 0.0);

        assert!((uncarved - lake_bed - 1.2).abs() < 0.1);
    }

    #[test]
    fn spawn_area_is_flat_and_clear() {
        let mut world = WorldStream::new(test_config());
        world.warmup(Vec3::ZERO);
        assert_eq!(world.height_at(0.0, 0.0), 0.0);
        let clearance = world.config().scatter.spawn_clearance;
        for item in world.scatter_items() {
            let p = item.transform.position;
            assert!(p.x.hypot(p.z) >= clearance);
        }
    }

    #[test]
    fn moving_one_chunk_east_keeps_interior_resident() {
        let mut world = WorldStream::new(test_config());
        world.warmup(Vec3::ZERO);

        let chunk = world.config().terrain.chunk_size;
        world.update(Vec3::new(chunk + 1.0, 0.0, 0.0), 0.016);

        // Interior terrain chunks are untouched; the leading ring is
        // queued or building, the trailing ring despawning.
        for z in -2..=2 {
            for x in -2..=2 {
                assert_eq!(
                    world.terrain().state(ChunkKey::new(x, z)),
                    ChunkState::Ready,
                    "interior chunk ({x},{z})"
                );
            }
        }
        assert_eq!(world.terrain().demanded(), 49);
        assert_ne!(
            world.terrain().state(ChunkKey::new(-3, 0)),
            ChunkState::Ready
        );
    }

    #[test]
    fn progress_stays_complete_across_idle_frames() {
        let mut world = WorldStream::new(test_config());
        world.warmup(Vec3::ZERO);
        let mut last = world.progress();
        for _ in 0..5 {
            world.update(Vec3::new(3.0, 0.0, 2.0), 0.016);
            let p = world.progress();
            assert!(p >= last);
            last = p;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn height_queries_succeed_far_outside_streamed_area() {
        let world = WorldStream::new(test_config());
        let h = world.height_at(10_000.0, -10_000.0);
        assert!(h.is_finite());
    }
}
