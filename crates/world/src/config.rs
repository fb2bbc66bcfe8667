use serde::{Deserialize, Serialize};

use farfield_gen::HeightTuning;
use farfield_scatter::ScatterConfig;
use farfield_terrain::TerrainConfig;

/// Top-level streaming configuration: one section per pipeline plus the
/// height-function tuning and warmup bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub terrain: TerrainConfig,
    pub scatter: ScatterConfig,
    pub height: HeightTuning,
    /// Hard cap on synchronous warmup iterations; warmup proceeds anyway
    /// (logged) if readiness is not reached by then.
    pub warmup_max_frames: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainConfig::default(),
            scatter: ScatterConfig::default(),
            height: HeightTuning::default(),
            warmup_max_frames: 240,
        }
    }
}

impl WorldConfig {
    /// Propagate one world seed into both generators.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.height.seed = seed;
        self.scatter.seed = seed as u32;
        self
    }
}
