use std::sync::Arc;

use glam::Vec3;

use farfield_common::{ChunkGrid, ChunkKey};
use farfield_gen::HeightField;
use farfield_stream::{BuildJob, ChunkBuilder, JobProgress};

/// A fully built terrain tile: a dense height grid plus finalized
/// per-vertex normals.
#[derive(Debug, Clone)]
pub struct HeightChunk {
    key: ChunkKey,
    verts: u32,
    heights: Vec<f32>,
    normals: Vec<Vec3>,
}

impl HeightChunk {
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    /// Vertices per side: segments + 1.
    pub fn verts(&self) -> u32 {
        self.verts
    }

    /// Row-major height grid (z rows of x columns), `verts²` samples.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn height_at_vertex(&self, x: u32, z: u32) -> f32 {
        self.heights[(z * self.verts + x) as usize]
    }

    pub fn is_released(&self) -> bool {
        self.heights.is_empty() && self.normals.is_empty()
    }
}

/// In-flight terrain chunk construction. Holds its own row cursor and
/// partial height buffer; one `advance` computes one grid row.
pub struct TerrainBuildJob {
    key: ChunkKey,
    origin_x: f32,
    origin_z: f32,
    step: f32,
    verts: u32,
    row: u32,
    heights: Vec<f32>,
    field: Arc<HeightField>,
}

impl BuildJob for TerrainBuildJob {
    type Chunk = HeightChunk;
    type Ctx<'a> = ();

    fn advance(&mut self, _ctx: &()) -> JobProgress<HeightChunk> {
        let z = self.origin_z + self.row as f32 * self.step;
        let base = (self.row * self.verts) as usize;
        for col in 0..self.verts {
            let x = self.origin_x + col as f32 * self.step;
            self.heights[base + col as usize] = self.field.height_at(x, z);
        }
        self.row += 1;

        if self.row < self.verts {
            return JobProgress::Pending;
        }

        let normals = compute_normals(&self.heights, self.verts, self.step);
        JobProgress::Complete(HeightChunk {
            key: self.key,
            verts: self.verts,
            heights: std::mem::take(&mut self.heights),
            normals,
        })
    }
}

/// Vertex normals from the finished grid via finite differences
/// (one-sided at the borders).
fn compute_normals(heights: &[f32], verts: u32, step: f32) -> Vec<Vec3> {
    let idx = |x: u32, z: u32| (z * verts + x) as usize;
    let mut normals = Vec::with_capacity(heights.len());
    for z in 0..verts {
        for x in 0..verts {
            let (x0, x1) = (x.saturating_sub(1), (x + 1).min(verts - 1));
            let (z0, z1) = (z.saturating_sub(1), (z + 1).min(verts - 1));
            let dx = (heights[idx(x1, z)] - heights[idx(x0, z)]) / ((x1 - x0) as f32 * step);
            let dz = (heights[idx(x, z1)] - heights[idx(x, z0)]) / ((z1 - z0) as f32 * step);
            normals.push(Vec3::new(-dx, 1.0, -dz).normalize());
        }
    }
    normals
}

/// Terrain half of the streaming scheduler: starts row jobs, releases
/// grids on despawn.
pub struct TerrainBuilder {
    grid: ChunkGrid,
    segments: u32,
    field: Arc<HeightField>,
}

impl TerrainBuilder {
    pub fn new(grid: ChunkGrid, segments: u32, field: Arc<HeightField>) -> Self {
        assert!(segments > 0, "terrain needs at least one segment");
        Self {
            grid,
            segments,
            field,
        }
    }
}

impl ChunkBuilder for TerrainBuilder {
    type Chunk = HeightChunk;
    type Ctx<'a> = ();
    type Job = TerrainBuildJob;

    fn begin(&mut self, key: ChunkKey) -> TerrainBuildJob {
        let (origin_x, origin_z) = self.grid.origin(key);
        let verts = self.segments + 1;
        TerrainBuildJob {
            key,
            origin_x,
            origin_z,
            step: self.grid.cell_size() / self.segments as f32,
            verts,
            row: 0,
            heights: vec![0.0; (verts * verts) as usize],
            field: Arc::clone(&self.field),
        }
    }

    fn release(&mut self, _key: ChunkKey, chunk: &mut HeightChunk) -> bool {
        // The grid and normals are the chunk's only owned resources;
        // dropping both is one unit of work.
        chunk.heights = Vec::new();
        chunk.normals = Vec::new();
        true
    }
}
