use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::noise::smoothstep;

/// A circular carved basin (lake): depth 1 at the center, smoothly 0 at
/// the rim, with an extra smoothing band of `shore` beyond the rim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Basin {
    pub x: f32,
    pub z: f32,
    pub radius: f32,
    pub depth: f32,
}

/// A carved channel (river): a capsule along a polyline, depth 1 on the
/// centerline, smoothly 0 at half-width, banded like [`Basin`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub points: Vec<Vec2>,
    pub width: f32,
    pub depth: f32,
}

/// Depth-subtraction field composed into terrain height evaluation.
///
/// Overlapping shapes combine by taking the maximum depth at each point,
/// never the sum, so two lakes sharing a rim do not double-carve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarveOverlay {
    basins: Vec<Basin>,
    channels: Vec<Channel>,
    /// Width of the smoothing band outside each shape's rim.
    shore: f32,
}

impl CarveOverlay {
    pub fn new(shore: f32) -> Self {
        Self {
            basins: Vec::new(),
            channels: Vec::new(),
            shore,
        }
    }

    pub fn with_basin(mut self, basin: Basin) -> Self {
        self.basins.push(basin);
        self
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.basins.is_empty() && self.channels.is_empty()
    }

    /// Carved depth at a world point. Pure; >= 0 everywhere.
    pub fn depth_at(&self, x: f32, z: f32) -> f32 {
        let mut d: f32 = 0.0;

        for basin in &self.basins {
            let dist = (x - basin.x).hypot(z - basin.z);
            if dist <= basin.radius + self.shore {
                let core = 1.0 - smoothstep(0.0, basin.radius, dist);
                let edge = 1.0 - smoothstep(basin.radius, basin.radius + self.shore, dist);
                d = d.max(basin.depth * core * edge);
            }
        }

        for channel in &self.channels {
            if channel.points.len() < 2 {
                continue;
            }
            let half_width = channel.width * 0.5;
            let p = Vec2::new(x, z);
            let mut best = f32::INFINITY;
            for seg in channel.points.windows(2) {
                best = best.min(dist_point_segment(p, seg[0], seg[1]));
            }
            if best <= half_width + self.shore {
                let core = 1.0 - smoothstep(0.0, half_width, best);
                let edge = 1.0 - smoothstep(half_width, half_width + self.shore, best);
                d = d.max(channel.depth * core * edge);
            }
        }

        d
    }
}

fn dist_point_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let ab2 = ab.length_squared();
    let t = if ab2 > 1e-8 { (ap.dot(ab) / ab2).clamp(0.0, 1.0) } else { 0.0 };
    (p - (a + ab * t)).length()
}
