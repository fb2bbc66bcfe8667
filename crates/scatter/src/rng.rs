use farfield_common::ChunkKey;

/// Well-mixed 32-bit hash of chunk coordinates; determinism matters
/// here, not cryptographic quality.
fn chunk_hash(seed: u32, key: ChunkKey) -> u32 {
    let mut h = (key.x as u32)
        .wrapping_mul(374_761_393)
        .wrapping_add((key.z as u32).wrapping_mul(668_265_263))
        ^ seed;
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    h ^ (h >> 16)
}

/// Mulberry32: a tiny deterministic PRNG. One stream per chunk, seeded
/// from the chunk coordinates, consumed in a fixed draw order.
#[derive(Debug, Clone)]
pub struct ChunkRng {
    state: u32,
}

impl ChunkRng {
    pub fn for_chunk(seed: u32, key: ChunkKey) -> Self {
        Self {
            state: chunk_hash(seed, key),
        }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let mut x = self.state;
        x = (x ^ (x >> 15)).wrapping_mul(x | 1);
        x ^= x.wrapping_add((x ^ (x >> 7)).wrapping_mul(x | 61));
        x ^ (x >> 14)
    }

    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform in [lo, hi).
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }
}
