use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Splitmix64: fast, high-quality integer mixing. Deterministic across
/// platforms, no floating-point in the hash path.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Hash a 2D lattice point to a uniform value in [0, 1).
fn lattice01(seed: u64, x: i32, z: i32) -> f32 {
    let mut h = seed;
    h ^= (x as i64 as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    h ^= (z as i64 as u64).wrapping_mul(0xc2b2_ae3d_27d4_eb4f);
    // 24 high bits -> exactly representable in f32
    (splitmix64(h) >> 40) as f32 / (1u64 << 24) as f32
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite fade, C1-continuous at lattice lines.
fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// 2D value noise in [0, 1): hashed lattice corners, smooth interpolation.
pub fn value_noise2(seed: u64, x: f32, z: f32) -> f32 {
    let xi = x.floor();
    let zi = z.floor();
    let xf = x - xi;
    let zf = z - zi;
    let xi = xi as i32;
    let zi = zi as i32;

    let v00 = lattice01(seed, xi, zi);
    let v10 = lattice01(seed, xi + 1, zi);
    let v01 = lattice01(seed, xi, zi + 1);
    let v11 = lattice01(seed, xi + 1, zi + 1);

    let u = fade(xf);
    let v = fade(zf);

    lerp(lerp(v00, v10, u), lerp(v01, v11, u), v)
}

/// Octave parameters for fractal sums.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NoiseParams {
    pub octaves: u32,
    pub frequency: f32,
    pub amplitude: f32,
    /// Amplitude multiplier per octave, < 1.
    pub gain: f32,
    /// Frequency multiplier per octave, > 1.
    pub lacunarity: f32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            octaves: 5,
            frequency: 1.0,
            amplitude: 1.0,
            gain: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Fractal Brownian motion: signed sum of value-noise octaves.
pub fn fbm(seed: u64, x: f32, z: f32, p: &NoiseParams) -> f32 {
    let mut sum = 0.0;
    let mut amp = p.amplitude;
    let mut freq = p.frequency;
    for _ in 0..p.octaves {
        sum += (value_noise2(seed, x * freq, z * freq) * 2.0 - 1.0) * amp;
        freq *= p.lacunarity;
        amp *= p.gain;
    }
    sum
}

/// Ridged fractal noise. Each octave is `(1 - |2n - 1|)²`, weighted by the
/// previous octave's ridge value so peaks stay self-similar.
pub fn ridged(seed: u64, x: f32, z: f32, p: &NoiseParams) -> f32 {
    let mut sum = 0.0;
    let mut amp = p.amplitude;
    let mut freq = p.frequency;
    let mut prev = 1.0;
    for _ in 0..p.octaves {
        let mut n = value_noise2(seed, x * freq, z * freq);
        n = 1.0 - (n * 2.0 - 1.0).abs();
        n *= n;
        sum += n * amp * prev;
        prev = n;
        freq *= p.lacunarity;
        amp *= p.gain;
    }
    sum
}

/// Perturb (x, z) by a low-frequency fractal field before sampling.
/// Breaks up grid-aligned artifacts in the layered noise above.
pub fn domain_warp(seed: u64, x: f32, z: f32, strength: f32, frequency: f32) -> Vec2 {
    let p = NoiseParams {
        octaves: 3,
        frequency,
        amplitude: 1.0,
        ..NoiseParams::default()
    };
    let wx = fbm(seed ^ 0x57a9_0001, x, z, &p);
    let wz = fbm(seed ^ 0x57a9_0002, x, z, &p);
    Vec2::new(x + wx * strength * 20.0, z + wz * strength * 20.0)
}

/// Clamped Hermite step between two edges.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    fade(t)
}
