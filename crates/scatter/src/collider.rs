use glam::{Vec2, Vec3};

/// Simplified vertical-cylinder approximation of an object's footprint,
/// used by movement collision instead of full geometry.
///
/// Invariants: `radius > 0` and `y_min <= y_max`, guaranteed by
/// construction through [`ColliderTemplate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderProxy {
    pub x: f32,
    pub z: f32,
    pub radius: f32,
    pub y_min: f32,
    pub y_max: f32,
}

/// Why a prototype could not produce a collider template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("prototype bounds are not finite")]
    NonFiniteBounds,
    #[error("collider radius {radius} outside (0, {max_radius}]")]
    RadiusOutOfRange { radius: f32, max_radius: f32 },
}

/// Unit-scale collider derived once per distinct prototype from its
/// bounds; a placed proxy is the template scaled and translated, O(1)
/// per instance. Cached for the process lifetime.
#[derive(Debug, Clone, Copy)]
pub struct ColliderTemplate {
    radius: f32,
    y_min: f32,
    y_max: f32,
}

impl ColliderTemplate {
    /// Derive from axis-aligned prototype bounds. The radius covers the
    /// larger horizontal extent plus `inflate`; the vertical range is
    /// padded by `y_pad`. Degenerate or oversized bounds are rejected so
    /// a bad asset cannot poison movement collision.
    pub fn from_bounds(
        min: Vec3,
        max: Vec3,
        inflate: f32,
        y_pad: f32,
        max_radius: f32,
    ) -> Result<Self, TemplateError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(TemplateError::NonFiniteBounds);
        }
        let size = max - min;
        let radius = 0.5 * size.x.max(size.z) + inflate;
        if !radius.is_finite() || radius <= 0.0 || radius > max_radius {
            return Err(TemplateError::RadiusOutOfRange { radius, max_radius });
        }
        Ok(Self {
            radius,
            y_min: min.y - y_pad,
            y_max: max.y + y_pad,
        })
    }

    /// Proxy for an instance at (x, z) with its base at world height `y`
    /// and a uniform scale.
    pub fn instantiate(&self, x: f32, z: f32, y: f32, scale: f32) -> ColliderProxy {
        ColliderProxy {
            x,
            z,
            radius: self.radius * scale,
            y_min: y + self.y_min * scale,
            y_max: y + self.y_max * scale,
        }
    }
}

/// Maximum push-out applied per contact per pass, so one deeply
/// overlapping collider cannot launch the query position.
const MAX_PUSH_PER_CONTACT: f32 = 0.35;
const RELAXATION_PASSES: usize = 4;

/// Push a candidate position out of any overlapping colliders.
///
/// Iterates a small fixed number of relaxation passes; each pass pushes
/// the position outward along the contact direction by the penetration
/// depth (clamped). Stops early once a full pass makes no correction.
/// Colliders whose vertical range excludes `y` are ignored.
pub fn resolve_collisions(pos: &mut Vec2, y: f32, colliders: &[ColliderProxy], query_radius: f32) {
    if colliders.is_empty() {
        return;
    }

    for _ in 0..RELAXATION_PASSES {
        let mut pushed = false;

        for c in colliders {
            if y < c.y_min || y > c.y_max {
                continue;
            }

            let dx = pos.x - c.x;
            let dz = pos.y - c.z;
            let d2 = dx * dx + dz * dz;

            let min_d = c.radius + query_radius;
            if d2 >= min_d * min_d {
                continue;
            }

            let d = d2.sqrt().max(1e-4);
            let push = (min_d - d).min(MAX_PUSH_PER_CONTACT);
            pos.x += dx / d * push;
            pos.y += dz / d * push;
            pushed = true;
        }

        if !pushed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> ColliderTemplate {
        ColliderTemplate::from_bounds(
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 4.0, 1.0),
            0.15,
            0.35,
            3.0,
        )
        .unwrap()
    }

    #[test]
    fn template_derives_radius_and_vertical_range() {
        let proxy = template().instantiate(10.0, -5.0, 2.0, 1.0);
        assert!((proxy.radius - 1.15).abs() < 1e-6);
        assert!((proxy.y_min - (2.0 - 0.35)).abs() < 1e-6);
        assert!((proxy.y_max - (2.0 + 4.35)).abs() < 1e-6);
    }

    #[test]
    fn instantiation_scales_uniformly() {
        let proxy = template().instantiate(0.0, 0.0, 0.0, 2.0);
        assert!((proxy.radius - 2.3).abs() < 1e-6);
        assert!(proxy.radius > 0.0);
        assert!(proxy.y_min <= proxy.y_max);
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let err = ColliderTemplate::from_bounds(
            Vec3::new(f32::NAN, 0.0, 0.0),
            Vec3::ONE,
            0.0,
            0.0,
            10.0,
        );
        assert!(matches!(err, Err(TemplateError::NonFiniteBounds)));
    }

    #[test]
    fn oversized_radius_is_rejected() {
        let err = ColliderTemplate::from_bounds(
            Vec3::new(-50.0, 0.0, -50.0),
            Vec3::new(50.0, 1.0, 50.0),
            0.0,
            0.0,
            3.0,
        );
        assert!(matches!(err, Err(TemplateError::RadiusOutOfRange { .. })));
    }

    #[test]
    fn zero_extent_bounds_with_no_inflate_are_rejected() {
        let err = ColliderTemplate::from_bounds(Vec3::ZERO, Vec3::ZERO, 0.0, 0.0, 3.0);
        assert!(matches!(err, Err(TemplateError::RadiusOutOfRange { .. })));
    }

    fn cylinder(x: f32, z: f32, radius: f32) -> ColliderProxy {
        ColliderProxy {
            x,
            z,
            radius,
            y_min: -1.0,
            y_max: 3.0,
        }
    }

    #[test]
    fn overlap_is_pushed_out() {
        let cols = [cylinder(0.0, 0.0, 1.0)];
        let mut pos = Vec2::new(1.2, 0.0);
        resolve_collisions(&mut pos, 0.0, &cols, 0.55);
        let dist = pos.length();
        assert!(dist >= 1.55 - 1e-3, "still penetrating: {dist}");
    }

    #[test]
    fn push_is_clamped_per_contact() {
        let cols = [cylinder(0.0, 0.0, 2.0)];
        let mut pos = Vec2::new(0.1, 0.0);
        let before = pos;
        resolve_collisions(&mut pos, 0.0, &cols, 0.5);
        // Four passes, at most 0.35 each.
        assert!((pos - before).length() <= 4.0 * 0.35 + 1e-4);
    }

    #[test]
    fn vertical_range_filters_contacts() {
        let cols = [cylinder(0.0, 0.0, 1.0)];
        let mut pos = Vec2::new(0.5, 0.0);
        resolve_collisions(&mut pos, 10.0, &cols, 0.55);
        assert_eq!(pos, Vec2::new(0.5, 0.0));
    }

    #[test]
    fn clear_position_is_untouched() {
        let cols = [cylinder(0.0, 0.0, 1.0)];
        let mut pos = Vec2::new(5.0, 5.0);
        resolve_collisions(&mut pos, 0.0, &cols, 0.55);
        assert_eq!(pos, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn two_colliders_resolve_over_passes() {
        let cols = [cylinder(-0.8, 0.0, 1.0), cylinder(0.8, 0.0, 1.0)];
        let mut pos = Vec2::new(0.0, 0.05);
        resolve_collisions(&mut pos, 0.0, &cols, 0.4);
        // Should have been squeezed out along +z rather than oscillating.
        assert!(pos.y > 0.05);
    }
}
