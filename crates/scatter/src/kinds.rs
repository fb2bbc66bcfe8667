use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use farfield_common::{ChunkKey, Transform};

use crate::collider::ColliderTemplate;

/// Scatter item kinds. Each kind carries what distinguishes it; all
/// per-kind data (bounds, collider tuning) lives in the
/// [`PrototypeTable`] and is dispatched by matching on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropKind {
    Tree { variant: u8 },
    Rock,
    Landmark,
}

/// Stable identity of a placed item: chunk plus index within the chunk's
/// deterministic placement order. Survives despawn/re-stream, so
/// registration systems can re-attach behavior to the same item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropId {
    pub chunk: ChunkKey,
    pub index: u32,
}

/// One placed scatter item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropInstance {
    pub id: PropId,
    pub kind: PropKind,
    pub transform: Transform,
}

/// Axis-aligned prototype bounds, the source of collider templates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PrototypeBounds {
    pub min: Vec3,
    pub max: Vec3,
}

/// Per-kind prototype data: model bounds plus collider derivation
/// parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Prototype {
    pub bounds: PrototypeBounds,
    pub inflate: f32,
    pub y_pad: f32,
    pub max_radius: f32,
}

/// Registry of prototypes with a lazily filled collider-template cache.
///
/// Templates are computed once per kind on first use and kept for the
/// process lifetime; a degenerate prototype caches `None` (logged once)
/// so its instances place without colliders.
#[derive(Debug, Default)]
pub struct PrototypeTable {
    prototypes: HashMap<PropKind, Prototype>,
    templates: HashMap<PropKind, Option<ColliderTemplate>>,
}

impl PrototypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock prototype set: three tree variants, a rock cluster, and
    /// a mountain landmark.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for (variant, height, spread) in [(0u8, 6.5f32, 0.8f32), (1, 8.0, 1.0), (2, 5.2, 0.7)] {
            table.insert(
                PropKind::Tree { variant },
                Prototype {
                    bounds: PrototypeBounds {
                        min: Vec3::new(-spread, -0.05, -spread),
                        max: Vec3::new(spread, height, spread),
                    },
                    inflate: 0.15,
                    y_pad: 0.35,
                    max_radius: 3.0,
                },
            );
        }
        table.insert(
            PropKind::Rock,
            Prototype {
                bounds: PrototypeBounds {
                    min: Vec3::new(-1.8, 0.0, -1.6),
                    max: Vec3::new(1.8, 1.4, 1.6),
                },
                inflate: 0.25,
                y_pad: 0.2,
                max_radius: 7.0,
            },
        );
        table.insert(
            PropKind::Landmark,
            Prototype {
                bounds: PrototypeBounds {
                    min: Vec3::new(-22.0, -1.0, -22.0),
                    max: Vec3::new(22.0, 34.0, 22.0),
                },
                inflate: 2.8,
                y_pad: 6.0,
                max_radius: 120.0,
            },
        );
        table
    }

    pub fn insert(&mut self, kind: PropKind, prototype: Prototype) {
        self.prototypes.insert(kind, prototype);
        self.templates.remove(&kind);
    }

    pub fn get(&self, kind: PropKind) -> Option<&Prototype> {
        self.prototypes.get(&kind)
    }

    pub fn contains(&self, kind: PropKind) -> bool {
        self.prototypes.contains_key(&kind)
    }

    /// Collider template for a kind, computed on first use. `None` when
    /// the prototype is missing or its bounds are degenerate.
    pub fn template(&mut self, kind: PropKind) -> Option<ColliderTemplate> {
        if let Some(cached) = self.templates.get(&kind) {
            return *cached;
        }
        let Some(proto) = self.prototypes.get(&kind) else {
            return None;
        };
        let template = match ColliderTemplate::from_bounds(
            proto.bounds.min,
            proto.bounds.max,
            proto.inflate,
            proto.y_pad,
            proto.max_radius,
        ) {
            Ok(t) => Some(t),
            Err(err) => {
                tracing::warn!(?kind, %err, "skipping collider for prototype");
                None
            }
        };
        self.templates.insert(kind, template);
        template
    }
}
