//! In-memory stand-in for the physics world used by controller tests.

use bevy::prelude::{Dir3, Entity, Quat, Vec3, World};

use crate::ground::{GroundProbe, ProbeHit, RayProbeHit, SurfaceTag};

/// Fresh, distinct entity ids.
pub fn entities<const N: usize>() -> [Entity; N] {
    let mut world = World::new();
    std::array::from_fn(|_| world.spawn_empty().id())
}

/// Probe answering from fixed hits, or from an infinite flat floor.
#[derive(Default, Clone)]
pub struct FakeProbe {
    overlaps: Option<Vec<ProbeHit>>,
    ray: Option<RayProbeHit>,
    floor: Option<(Entity, f32)>,
}

impl FakeProbe {
    pub fn with_overlaps(mut self, hits: Vec<ProbeHit>) -> Self {
        self.overlaps = Some(hits);
        self
    }

    pub fn with_ray(mut self, hit: RayProbeHit) -> Self {
        self.ray = Some(hit);
        self
    }

    pub fn flat_floor(entity: Entity, height: f32) -> Self {
        Self {
            floor: Some((entity, height)),
            ..Default::default()
        }
    }
}

impl GroundProbe for FakeProbe {
    fn overlap_box(&self, center: Vec3, half_extents: Vec3, _rotation: Quat) -> Vec<ProbeHit> {
        if let Some(hits) = &self.overlaps {
            return hits.clone();
        }
        match self.floor {
            Some((entity, height)) if center.y - half_extents.y <= height => vec![ProbeHit {
                entity,
                tag: Some(SurfaceTag::WalkableSurface),
            }],
            _ => Vec::new(),
        }
    }

    fn cast_ray(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<RayProbeHit> {
        if let Some(hit) = self.ray {
            return Some(hit);
        }
        let (entity, height) = self.floor?;
        let distance = origin.y - height;
        (direction == Dir3::NEG_Y && (0.0..=max_distance).contains(&distance)).then_some(
            RayProbeHit {
                entity,
                tag: Some(SurfaceTag::WalkableSurface),
                normal: Vec3::Y,
                distance,
            },
        )
    }
}
