use farfield_common::HeightSampler;
use serde::{Deserialize, Serialize};

use crate::carve::CarveOverlay;
use crate::noise::{domain_warp, fbm, ridged, smoothstep, value_noise2, NoiseParams};

// Per-layer seed salts so the layers decorrelate without coordinate offsets.
const SALT_WARP: u64 = 0x7761_7270;
const SALT_HILLS_A: u64 = 0x6869_6c01;
const SALT_HILLS_B: u64 = 0x6869_6c02;
const SALT_MASK: u64 = 0x6d61_736b;
const SALT_MOUNTAINS_A: u64 = 0x6d74_6e01;
const SALT_MOUNTAINS_B: u64 = 0x6d74_6e02;
const SALT_DETAIL: u64 = 0x6474_6c00;

/// Tuning for the composed terrain height function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightTuning {
    pub seed: u64,
    pub warp_strength: f32,
    pub warp_frequency: f32,
    pub hills_primary: NoiseParams,
    pub hills_secondary: NoiseParams,
    pub mountain_mask: NoiseParams,
    /// Mask remap: `clamp((ridged - bias) * gain, 0, 1)`.
    pub mask_bias: f32,
    pub mask_gain: f32,
    pub mountains_primary: NoiseParams,
    pub mountains_secondary: NoiseParams,
    /// Fully flat inside this radius around the world origin.
    pub flatten_inner: f32,
    /// Raw terrain fully blended back in beyond this radius.
    pub flatten_outer: f32,
    pub detail_frequency: f32,
    pub detail_amplitude: f32,
}

impl Default for HeightTuning {
    fn default() -> Self {
        Self {
            seed: 0,
            warp_strength: 0.45,
            warp_frequency: 0.018,
            hills_primary: NoiseParams {
                octaves: 5,
                frequency: 0.008,
                amplitude: 3.6,
                gain: 0.55,
                lacunarity: 2.05,
            },
            hills_secondary: NoiseParams {
                octaves: 3,
                frequency: 0.02,
                amplitude: 1.1,
                gain: 0.5,
                lacunarity: 2.0,
            },
            mountain_mask: NoiseParams {
                octaves: 4,
                frequency: 0.0032,
                amplitude: 1.0,
                gain: 0.5,
                lacunarity: 2.0,
            },
            mask_bias: 0.35,
            mask_gain: 1.65,
            mountains_primary: NoiseParams {
                octaves: 5,
                frequency: 0.0045,
                amplitude: 14.0,
                gain: 0.52,
                lacunarity: 2.05,
            },
            mountains_secondary: NoiseParams {
                octaves: 3,
                frequency: 0.011,
                amplitude: 2.5,
                gain: 0.5,
                lacunarity: 2.0,
            },
            flatten_inner: 18.0,
            flatten_outer: 28.0,
            detail_frequency: 0.07,
            detail_amplitude: 0.18,
        }
    }
}

/// The composed, pure terrain height function.
///
/// Defined for all real (x, z) and continuous everywhere; both streaming
/// pipelines and the direct-evaluation fallback call the same code, which
/// is what makes chunk seams line up with no stitching.
#[derive(Debug, Clone, Default)]
pub struct HeightField {
    tuning: HeightTuning,
    carve: Option<CarveOverlay>,
}

impl HeightField {
    pub fn new(tuning: HeightTuning) -> Self {
        Self {
            tuning,
            carve: None,
        }
    }

    pub fn tuning(&self) -> &HeightTuning {
        &self.tuning
    }

    pub fn has_carve(&self) -> bool {
        self.carve.is_some()
    }

    /// Install the water carve overlay. The caller (the world facade) is
    /// responsible for doing this before any chunk bakes.
    pub fn set_carve(&mut self, overlay: CarveOverlay) {
        self.carve = Some(overlay);
    }

    /// Terrain height at a world point.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let t = &self.tuning;
        let w = domain_warp(
            t.seed ^ SALT_WARP,
            x,
            z,
            t.warp_strength,
            t.warp_frequency,
        );

        let hills = fbm(t.seed ^ SALT_HILLS_A, w.x, w.y, &t.hills_primary)
            + fbm(t.seed ^ SALT_HILLS_B, w.x, w.y, &t.hills_secondary);

        let mask = ((ridged(t.seed ^ SALT_MASK, w.x, w.y, &t.mountain_mask) - t.mask_bias)
            * t.mask_gain)
            .clamp(0.0, 1.0);

        let mountains = ridged(t.seed ^ SALT_MOUNTAINS_A, w.x, w.y, &t.mountains_primary)
            + ridged(t.seed ^ SALT_MOUNTAINS_B, w.x, w.y, &t.mountains_secondary);

        let mut h = hills + mountains * mask;

        // Flat spawn plateau: blend toward zero near the origin, then
        // re-add a little fine noise scaled by the blend so the plateau
        // edge is not perfectly planar.
        let d = x.hypot(z);
        let flat = smoothstep(t.flatten_inner, t.flatten_outer, d);
        h *= flat;
        if flat > 1e-3 {
            let detail = value_noise2(
                t.seed ^ SALT_DETAIL,
                x * t.detail_frequency,
                z * t.detail_frequency,
            ) * 2.0
                - 1.0;
            h += detail * t.detail_amplitude * flat;
        }

        if let Some(carve) = &self.carve {
            h -= carve.depth_at(x, z);
        }
        h
    }

    /// Height with the carve contribution added back: the pre-carve
    /// surface, used by water rendering to find the original banks.
    pub fn surface_height_at(&self, x: f32, z: f32) -> f32 {
        let carved = self.height_at(x, z);
        match &self.carve {
            Some(carve) => carved + carve.depth_at(x, z),
            None => carved,
        }
    }
}

impl HeightSampler for HeightField {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        HeightField::height_at(self, x, z)
    }
}
