use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Transform for a ground-placed object: yaw about +Y, uniform scale.
    pub fn placed(position: Vec3, yaw: f32, scale: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw),
            scale: Vec3::splat(scale),
        }
    }
}
