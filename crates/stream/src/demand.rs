use std::collections::HashSet;

use farfield_common::ChunkKey;

/// All chunk keys within a square (Chebyshev) radius of a center key.
pub fn keys_in_radius(center: ChunkKey, radius: i32) -> HashSet<ChunkKey> {
    let mut keys = HashSet::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
    for dz in -radius..=radius {
        for dx in -radius..=radius {
            keys.insert(ChunkKey::new(center.x + dx, center.z + dz));
        }
    }
    keys
}

/// Recomputes the demand set only when the observer crosses into a new
/// chunk; between crossings the previous set stays valid and `update`
/// costs one comparison.
#[derive(Debug, Clone)]
pub struct DemandTracker {
    radius: i32,
    last_center: Option<ChunkKey>,
}

impl DemandTracker {
    pub fn new(radius: i32) -> Self {
        assert!(radius >= 0, "load radius must be non-negative");
        Self {
            radius,
            last_center: None,
        }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Returns the new demand set when the observer's chunk changed,
    /// `None` while it stays inside the same chunk.
    pub fn update(&mut self, observer_chunk: ChunkKey) -> Option<HashSet<ChunkKey>> {
        if self.last_center == Some(observer_chunk) {
            return None;
        }
        self.last_center = Some(observer_chunk);
        Some(keys_in_radius(observer_chunk, self.radius))
    }

    /// Forget the cached center so the next `update` recomputes
    /// unconditionally (used when re-entering warmup).
    pub fn reset(&mut self) {
        self.last_center = None;
    }
}
