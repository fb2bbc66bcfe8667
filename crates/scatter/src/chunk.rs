use std::f32::consts::TAU;

use glam::Vec3;

use farfield_common::{ChunkGrid, ChunkKey, HeightSampler, Transform};
use farfield_stream::{BuildJob, ChunkBuilder, JobProgress};

use crate::collider::{ColliderProxy, ColliderTemplate};
use crate::kinds::{PropId, PropInstance, PropKind, PrototypeTable};
use crate::rng::ChunkRng;
use crate::stream::ScatterConfig;

/// A fully built scatter tile: placed instances plus their collider
/// proxies.
#[derive(Debug, Clone)]
pub struct ScatterChunk {
    key: ChunkKey,
    items: Vec<PropInstance>,
    colliders: Vec<ColliderProxy>,
}

impl ScatterChunk {
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    pub fn items(&self) -> &[PropInstance] {
        &self.items
    }

    pub fn colliders(&self) -> &[ColliderProxy] {
        &self.colliders
    }

    pub fn is_released(&self) -> bool {
        self.items.is_empty() && self.colliders.is_empty()
    }
}

/// One planned (not yet baked) item. Position and draws are fixed at
/// plan time; only the height lookup waits for the bake step.
#[derive(Debug, Clone)]
pub(crate) struct PlannedItem {
    pub kind: PropKind,
    pub x: f32,
    pub z: f32,
    pub y_offset: f32,
    pub yaw: f32,
    pub scale: f32,
    pub est_radius: f32,
    pub template: Option<ColliderTemplate>,
}

/// Reserved footprint used by the greedy spacing check.
struct Disk {
    x: f32,
    z: f32,
    r: f32,
}

fn overlaps(disks: &[Disk], x: f32, z: f32, r: f32, pad: f32) -> bool {
    disks.iter().any(|d| {
        let dx = x - d.x;
        let dz = z - d.z;
        let rr = r + d.r + pad;
        dx * dx + dz * dz < rr * rr
    })
}

/// In-flight scatter construction: the deterministic plan plus an item
/// cursor. One `advance` bakes one item (height lookup, transform,
/// collider).
pub struct ScatterBuildJob {
    key: ChunkKey,
    items: Vec<PlannedItem>,
    cursor: usize,
    placed: Vec<PropInstance>,
    colliders: Vec<ColliderProxy>,
}

impl ScatterBuildJob {
    #[cfg(test)]
    pub(crate) fn planned(&self) -> &[PlannedItem] {
        &self.items
    }
}

impl BuildJob for ScatterBuildJob {
    type Chunk = ScatterChunk;
    type Ctx<'a> = dyn HeightSampler + 'a;

    fn advance(&mut self, heights: &(dyn HeightSampler + '_)) -> JobProgress<ScatterChunk> {
        if self.cursor < self.items.len() {
            let item = &self.items[self.cursor];
            let y = heights.height_at(item.x, item.z) + item.y_offset;
            self.placed.push(PropInstance {
                id: PropId {
                    chunk: self.key,
                    index: self.cursor as u32,
                },
                kind: item.kind,
                transform: Transform::placed(Vec3::new(item.x, y, item.z), item.yaw, item.scale),
            });
            if let Some(template) = &item.template {
                self.colliders.push(template.instantiate(item.x, item.z, y, item.scale));
            }
            self.cursor += 1;
        }

        if self.cursor < self.items.len() {
            return JobProgress::Pending;
        }
        JobProgress::Complete(ScatterChunk {
            key: self.key,
            items: std::mem::take(&mut self.placed),
            colliders: std::mem::take(&mut self.colliders),
        })
    }
}

/// Scatter half of the streaming scheduler: plans chunks from the
/// per-chunk RNG stream, releases instances one at a time on despawn.
pub struct ScatterBuilder {
    grid: ChunkGrid,
    tuning: ScatterConfig,
    prototypes: PrototypeTable,
}

impl ScatterBuilder {
    pub fn new(grid: ChunkGrid, tuning: ScatterConfig, prototypes: PrototypeTable) -> Self {
        Self {
            grid,
            tuning,
            prototypes,
        }
    }

    pub fn prototypes(&self) -> &PrototypeTable {
        &self.prototypes
    }

    /// Deterministic chunk plan. Draw order is fixed — counts, then per
    /// item scale → position attempts → kind-specific draws → yaw — so
    /// unrelated tuning changes do not perturb earlier draws.
    fn plan(&mut self, key: ChunkKey) -> Vec<PlannedItem> {
        let t = &self.tuning;
        let mut rng = ChunkRng::for_chunk(t.seed, key);

        let (x0, z0) = self.grid.origin(key);
        let x1 = x0 + self.grid.cell_size();
        let z1 = z0 + self.grid.cell_size();

        let tree_count = t.tree_count_base + (rng.next_f32() * t.tree_count_spread as f32) as u32;
        let rock_count = t.rock_count_base + (rng.next_f32() * t.rock_count_spread as f32) as u32;

        let (cx, cz) = self.grid.center(key);
        let far_from_spawn = cx.hypot(cz) > t.landmark_min_distance;
        let want_landmark = far_from_spawn && rng.next_f32() < t.landmark_chance;

        let clearance = t.spawn_clearance;
        let mut disks: Vec<Disk> = Vec::new();
        let mut items = Vec::new();

        let mut pick_spot =
            |rng: &mut ChunkRng, disks: &mut Vec<Disk>, est_r: f32, pad: f32, tries: u32| {
                for _ in 0..tries {
                    let x = x0 + (x1 - x0) * rng.next_f32();
                    let z = z0 + (z1 - z0) * rng.next_f32();
                    if x.hypot(z) < clearance {
                        continue;
                    }
                    if overlaps(disks, x, z, est_r, pad) {
                        continue;
                    }
                    disks.push(Disk { x, z, r: est_r });
                    return Some((x, z));
                }
                None
            };

        if want_landmark {
            if self.prototypes.contains(PropKind::Landmark) {
                let scale = 0.55 + rng.next_f32() * 0.75;
                let est_radius = 22.0 * scale;
                if let Some((x, z)) = pick_spot(&mut rng, &mut disks, est_radius, 2.0, 40) {
                    let y_offset = -6.5 - rng.next_f32() * 6.0;
                    let yaw = rng.next_f32() * TAU;
                    let template = self.prototypes.template(PropKind::Landmark);
                    items.push(PlannedItem {
                        kind: PropKind::Landmark,
                        x,
                        z,
                        y_offset,
                        yaw,
                        scale,
                        est_radius,
                        template,
                    });
                }
            } else {
                tracing::warn!(?key, "landmark prototype missing, omitting");
            }
        }

        if self.prototypes.contains(PropKind::Tree { variant: 0 }) {
            for _ in 0..tree_count {
                let scale = 0.85 + rng.next_f32() * 0.75;
                let est_radius = 0.9 * scale;
                let Some((x, z)) = pick_spot(&mut rng, &mut disks, est_radius, 0.9, 30) else {
                    continue;
                };
                let pick = rng.next_f32();
                let variant = if pick < 0.33 {
                    0
                } else if pick < 0.66 {
                    1
                } else {
                    2
                };
                let yaw = rng.next_f32() * TAU;
                let kind = PropKind::Tree { variant };
                let template = self.prototypes.template(kind);
                items.push(PlannedItem {
                    kind,
                    x,
                    z,
                    y_offset: 0.0,
                    yaw,
                    scale,
                    est_radius,
                    template,
                });
            }
        } else {
            tracing::warn!(?key, "tree prototypes missing, omitting");
        }

        if self.prototypes.contains(PropKind::Rock) {
            for _ in 0..rock_count {
                let scale = 0.7 + rng.next_f32() * 0.9;
                let est_radius = 2.0 * scale;
                let Some((x, z)) = pick_spot(&mut rng, &mut disks, est_radius, 0.9, 30) else {
                    continue;
                };
                let yaw = rng.next_f32() * TAU;
                let template = self.prototypes.template(PropKind::Rock);
                items.push(PlannedItem {
                    kind: PropKind::Rock,
                    x,
                    z,
                    y_offset: 0.0,
                    yaw,
                    scale,
                    est_radius,
                    template,
                });
            }
        } else {
            tracing::warn!(?key, "rock prototype missing, omitting");
        }

        items
    }
}

impl ChunkBuilder for ScatterBuilder {
    type Chunk = ScatterChunk;
    type Ctx<'a> = dyn HeightSampler + 'a;
    type Job = ScatterBuildJob;

    fn begin(&mut self, key: ChunkKey) -> ScatterBuildJob {
        let items = self.plan(key);
        let capacity = items.len();
        ScatterBuildJob {
            key,
            items,
            cursor: 0,
            placed: Vec::with_capacity(capacity),
            colliders: Vec::with_capacity(capacity),
        }
    }

    fn release(&mut self, _key: ChunkKey, chunk: &mut ScatterChunk) -> bool {
        // One instance per unit, mirroring how they were baked in.
        if chunk.items.pop().is_some() {
            return false;
        }
        chunk.colliders = Vec::new();
        true
    }
}
