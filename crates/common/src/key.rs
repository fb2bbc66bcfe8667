use serde::{Deserialize, Serialize};

/// A 2D chunk coordinate in one of the world's tile grids (XZ plane).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ChunkKey {
    pub x: i32,
    pub z: i32,
}

impl ChunkKey {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Pack both coordinates into one `u64` (x in the high half).
    pub fn packed(self) -> u64 {
        ((self.x as u32 as u64) << 32) | (self.z as u32 as u64)
    }

    /// Inverse of [`ChunkKey::packed`].
    pub fn unpack(packed: u64) -> Self {
        Self {
            x: (packed >> 32) as u32 as i32,
            z: packed as u32 as i32,
        }
    }

    /// Chebyshev distance to another key, in chunks.
    pub fn ring_distance(self, other: ChunkKey) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

/// Fixed-size square tiling of the XZ plane.
///
/// The terrain and scatter pipelines each own one of these; their tile
/// sizes are independent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkGrid {
    cell_size: f32,
}

impl ChunkGrid {
    pub fn new(cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell_size must be positive");
        Self { cell_size }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Convert a world position to the key of the tile containing it.
    pub fn key_at(&self, x: f32, z: f32) -> ChunkKey {
        ChunkKey {
            x: (x / self.cell_size).floor() as i32,
            z: (z / self.cell_size).floor() as i32,
        }
    }

    /// World-space minimum corner of a tile.
    pub fn origin(&self, key: ChunkKey) -> (f32, f32) {
        (key.x as f32 * self.cell_size, key.z as f32 * self.cell_size)
    }

    /// World-space center of a tile.
    pub fn center(&self, key: ChunkKey) -> (f32, f32) {
        (
            (key.x as f32 + 0.5) * self.cell_size,
            (key.z as f32 + 0.5) * self.cell_size,
        )
    }
}
