//! Ground contact detection: a coarse overlap box and a fine downward ray.

use avian3d::prelude::{Collider, SpatialQueryFilter, SpatialQueryPipeline};
use bevy::prelude::{Component, Dir3, Entity, Quat, Query, Reflect, Vec3};
use serde::{Deserialize, Serialize};

/// Offset applied below the body origin before probing.
pub const PROBE_OFFSET: Vec3 = Vec3::new(0.0, -0.05, 0.0);
pub const COARSE_HALF_EXTENTS: Vec3 = Vec3::new(0.95 / 2.0, 0.5, 0.95 / 2.0);
/// Only the first hits of the overlap are inspected.
pub const GROUND_HIT_CAPACITY: usize = 3;
pub const FINE_RAY_LENGTH: f32 = 1.0;
pub const FLAT_NORMAL_CUTOFF: f32 = 0.95;

/// Gameplay tag carried by level colliders.
#[derive(Component, Reflect, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceTag {
    WalkableSurface,
    Block,
    Wall,
    Goal,
}

impl SurfaceTag {
    pub fn supports_agent(self) -> bool {
        matches!(self, Self::WalkableSurface | Self::Block | Self::Wall)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    pub entity: Entity,
    pub tag: Option<SurfaceTag>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayProbeHit {
    pub entity: Entity,
    pub tag: Option<SurfaceTag>,
    pub normal: Vec3,
    pub distance: f32,
}

/// Physics queries the controller needs from the host.
pub trait GroundProbe {
    fn overlap_box(&self, center: Vec3, half_extents: Vec3, rotation: Quat) -> Vec<ProbeHit>;

    fn cast_ray(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<RayProbeHit>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct GroundContacts {
    /// Overlap box check.
    pub coarse: bool,
    /// Flat-surface ray check.
    pub fine: bool,
}

pub fn coarse_ground_check(
    probe: &impl GroundProbe,
    agent: Entity,
    position: Vec3,
    rotation: Quat,
) -> bool {
    probe
        .overlap_box(position + PROBE_OFFSET, COARSE_HALF_EXTENTS, rotation)
        .into_iter()
        .take(GROUND_HIT_CAPACITY)
        .any(|hit| hit.entity != agent && hit.tag.is_some_and(SurfaceTag::supports_agent))
}

pub fn fine_ground_check(probe: &impl GroundProbe, position: Vec3) -> bool {
    probe
        .cast_ray(position + PROBE_OFFSET, Dir3::NEG_Y, FINE_RAY_LENGTH)
        .is_some_and(|hit| {
            hit.tag.is_some_and(SurfaceTag::supports_agent) && hit.normal.y > FLAT_NORMAL_CUTOFF
        })
}

pub fn detect_ground_contacts(
    probe: &impl GroundProbe,
    agent: Entity,
    position: Vec3,
    rotation: Quat,
) -> GroundContacts {
    GroundContacts {
        coarse: coarse_ground_check(probe, agent, position, rotation),
        fine: fine_ground_check(probe, position),
    }
}

/// [`GroundProbe`] backed by Avian's spatial query pipeline. The agent's own
/// collider is filtered out of every query.
pub struct AvianGroundProbe<'a, 'w, 's> {
    pipeline: &'a SpatialQueryPipeline,
    tags: &'a Query<'w, 's, &'static SurfaceTag>,
    filter: SpatialQueryFilter,
}

impl<'a, 'w, 's> AvianGroundProbe<'a, 'w, 's> {
    pub fn new(
        pipeline: &'a SpatialQueryPipeline,
        tags: &'a Query<'w, 's, &'static SurfaceTag>,
        agent: Entity,
    ) -> Self {
        Self {
            pipeline,
            tags,
            filter: SpatialQueryFilter::default().with_excluded_entities([agent]),
        }
    }

    fn tag_of(&self, entity: Entity) -> Option<SurfaceTag> {
        self.tags.get(entity).ok().copied()
    }
}

impl GroundProbe for AvianGroundProbe<'_, '_, '_> {
    fn overlap_box(&self, center: Vec3, half_extents: Vec3, rotation: Quat) -> Vec<ProbeHit> {
        let size = half_extents * 2.0;
        let shape = Collider::cuboid(size.x, size.y, size.z);
        self.pipeline
            .shape_intersections(&shape, center, rotation, &self.filter)
            .into_iter()
            .map(|entity| ProbeHit {
                entity,
                tag: self.tag_of(entity),
            })
            .collect()
    }

    fn cast_ray(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<RayProbeHit> {
        self.pipeline
            .cast_ray(origin, direction, max_distance, true, &self.filter)
            .map(|hit| RayProbeHit {
                entity: hit.entity,
                tag: self.tag_of(hit.entity),
                normal: hit.normal,
                distance: hit.distance,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::probe::{FakeProbe, entities};

    #[test]
    fn test_supporting_tags() {
        assert!(SurfaceTag::WalkableSurface.supports_agent());
        assert!(SurfaceTag::Block.supports_agent());
        assert!(SurfaceTag::Wall.supports_agent());
        assert!(!SurfaceTag::Goal.supports_agent());
    }

    #[test]
    fn test_coarse_check_ignores_self_and_untagged() {
        let [agent, other] = entities();
        let probe = FakeProbe::default().with_overlaps(vec![
            ProbeHit {
                entity: agent,
                tag: Some(SurfaceTag::Block),
            },
            ProbeHit {
                entity: other,
                tag: None,
            },
        ]);

        assert!(!coarse_ground_check(&probe, agent, Vec3::ZERO, Quat::IDENTITY));
    }

    #[test]
    fn test_coarse_check_only_inspects_first_hits() {
        let [agent, untagged, ground] = entities();
        let mut hits = vec![
            ProbeHit {
                entity: untagged,
                tag: Some(SurfaceTag::Goal),
            };
            GROUND_HIT_CAPACITY
        ];
        hits.push(ProbeHit {
            entity: ground,
            tag: Some(SurfaceTag::WalkableSurface),
        });
        let probe = FakeProbe::default().with_overlaps(hits);

        assert!(!coarse_ground_check(&probe, agent, Vec3::ZERO, Quat::IDENTITY));
    }

    #[test]
    fn test_fine_check_requires_flat_normal() {
        let [ground] = entities();
        let flat = FakeProbe::default().with_ray(RayProbeHit {
            entity: ground,
            tag: Some(SurfaceTag::WalkableSurface),
            normal: Vec3::Y,
            distance: 0.45,
        });
        assert!(fine_ground_check(&flat, Vec3::new(0.0, 0.5, 0.0)));

        let slope = FakeProbe::default().with_ray(RayProbeHit {
            entity: ground,
            tag: Some(SurfaceTag::WalkableSurface),
            normal: Vec3::new(0.5, 0.8, 0.0).normalize(),
            distance: 0.45,
        });
        assert!(!fine_ground_check(&slope, Vec3::new(0.0, 0.5, 0.0)));
    }

    #[test]
    fn test_fine_check_requires_supporting_tag() {
        let [goal] = entities();
        let probe = FakeProbe::default().with_ray(RayProbeHit {
            entity: goal,
            tag: Some(SurfaceTag::Goal),
            normal: Vec3::Y,
            distance: 0.2,
        });
        assert!(!fine_ground_check(&probe, Vec3::ZERO));
        assert!(!fine_ground_check(&FakeProbe::default(), Vec3::ZERO));
    }
}
