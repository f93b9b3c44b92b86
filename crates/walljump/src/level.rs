//! Wall-jump training area: a floor, a wall to climb, a block to climb it
//! with, the goal behind the wall and the agent.

use avian3d::prelude::{
    AngularVelocity, Collider, CollidingEntities, LinearVelocity, LockedAxes, Position, RigidBody,
    Rotation, Sensor,
};
use bevy::prelude::{
    Added, Assets, Bundle, Color, Commands, Component, Cuboid, Entity, Mesh, Mesh3d,
    MeshMaterial3d, Name, Quat, Query, ResMut, StandardMaterial, Vec3, default, info,
};
use leafwing_input_manager::prelude::ActionState;

use crate::action::AgentAction;
use crate::controller::{AgentController, LevelAnchors};
use crate::ground::SurfaceTag;
use crate::plugin::{AgentTransition, WallJumpAgent};
use crate::policy::{AgentInput, DecisionSource, agent_input_map};
use crate::settings::WallJumpSettings;

pub const GROUND_SIZE: Vec3 = Vec3::new(20.0, 1.0, 24.0);
pub const GROUND_CENTER: Vec3 = Vec3::new(0.0, -0.5, -2.0);
pub const WALL_SIZE: Vec3 = Vec3::new(20.0, 4.0, 1.0);
pub const WALL_CENTER: Vec3 = Vec3::new(0.0, 2.0, 0.0);
pub const BLOCK_SIZE: Vec3 = Vec3::splat(2.0);
pub const BLOCK_CENTER: Vec3 = Vec3::new(4.0, 1.0, -6.0);
pub const GOAL_SIZE: Vec3 = Vec3::new(2.0, 2.0, 2.0);
pub const GOAL_CENTER: Vec3 = Vec3::new(0.0, 1.0, 8.0);
pub const AGENT_SIZE: Vec3 = Vec3::ONE;
/// Half a turn, so the agent's forward (-Z) faces the wall and the goal.
pub const SPAWN_YAW: f32 = std::f32::consts::PI;
/// Distance between neighbouring areas when several are spawned.
pub const AREA_SPACING: f32 = 40.0;

/// Box dimensions, used to give level pieces a mesh when rendering.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct LevelBlock {
    pub size: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainingArea {
    pub agent: Entity,
    pub ground: Entity,
    pub goal: Entity,
}

pub fn spawn_rotation() -> Quat {
    Quat::from_rotation_y(SPAWN_YAW)
}

pub fn area_origin(index: usize) -> Vec3 {
    Vec3::new(index as f32 * AREA_SPACING, 0.0, 0.0)
}

pub fn anchors_for(origin: Vec3) -> LevelAnchors {
    LevelAnchors {
        area_origin: origin,
        ground_reference: origin + GROUND_CENTER,
        goal_local: GOAL_CENTER,
    }
}

/// Components of a freshly spawned agent resting on the spawn point.
pub fn agent_bundle(
    settings: &WallJumpSettings,
    origin: Vec3,
    source: DecisionSource,
    now: f64,
) -> impl Bundle {
    let controller = AgentController::new(settings.clone(), anchors_for(origin), now);
    (
        Name::new("WallJump Agent"),
        WallJumpAgent { controller },
        source,
        AgentAction::IDLE,
        AgentTransition::default(),
        (
            RigidBody::Dynamic,
            Collider::cuboid(AGENT_SIZE.x, AGENT_SIZE.y, AGENT_SIZE.z),
            LockedAxes::ROTATION_LOCKED,
            CollidingEntities::default(),
            Position::new(origin + settings.spawn_point),
            Rotation(spawn_rotation()),
            LinearVelocity::default(),
            AngularVelocity::default(),
            LevelBlock { size: AGENT_SIZE },
        ),
    )
}

fn static_block(name: String, center: Vec3, size: Vec3, tag: SurfaceTag) -> impl Bundle {
    (
        Name::new(name),
        RigidBody::Static,
        Collider::cuboid(size.x, size.y, size.z),
        Position::new(center),
        Rotation(Quat::IDENTITY),
        tag,
        LevelBlock { size },
    )
}

pub fn spawn_training_area(
    commands: &mut Commands,
    settings: &WallJumpSettings,
    index: usize,
    source: DecisionSource,
    now: f64,
) -> TrainingArea {
    let origin = area_origin(index);

    let ground = commands
        .spawn(static_block(
            format!("Ground_{index}"),
            origin + GROUND_CENTER,
            GROUND_SIZE,
            SurfaceTag::WalkableSurface,
        ))
        .id();
    commands.spawn(static_block(
        format!("Wall_{index}"),
        origin + WALL_CENTER,
        WALL_SIZE,
        SurfaceTag::Wall,
    ));
    commands.spawn(static_block(
        format!("Block_{index}"),
        origin + BLOCK_CENTER,
        BLOCK_SIZE,
        SurfaceTag::Block,
    ));
    let goal = commands
        .spawn((
            static_block(
                format!("Goal_{index}"),
                origin + GOAL_CENTER,
                GOAL_SIZE,
                SurfaceTag::Goal,
            ),
            Sensor,
        ))
        .id();

    let agent = commands
        .spawn(agent_bundle(settings, origin, source, now))
        .insert((agent_input_map(), ActionState::<AgentInput>::default()))
        .id();

    info!("Spawned training area {} at {:?}", index, origin);

    TrainingArea {
        agent,
        ground,
        goal,
    }
}

fn block_color(tag: Option<&SurfaceTag>) -> Color {
    match tag {
        Some(SurfaceTag::WalkableSurface) => Color::srgb(0.5, 0.5, 0.5),
        Some(SurfaceTag::Wall) => Color::srgb(0.7, 0.4, 0.2),
        Some(SurfaceTag::Block) => Color::srgb(0.9, 0.7, 0.2),
        Some(SurfaceTag::Goal) => Color::srgba(0.2, 0.9, 0.3, 0.6),
        None => Color::srgb(0.2, 0.4, 0.9),
    }
}

/// Give new level pieces a mesh. Skipped when no render assets exist.
pub fn attach_level_meshes(
    mut commands: Commands,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
    blocks: Query<(Entity, &LevelBlock, Option<&SurfaceTag>), Added<LevelBlock>>,
) {
    let (Some(mut meshes), Some(mut materials)) = (meshes, materials) else {
        return;
    };

    for (entity, block, tag) in blocks.iter() {
        commands.entity(entity).insert((
            Mesh3d(meshes.add(Cuboid {
                half_size: block.size / 2.0,
            })),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: block_color(tag),
                ..default()
            })),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use bevy::prelude::{App, MinimalPlugins, With};

    #[test]
    fn test_spawn_point_lands_in_grid() {
        let settings = WallJumpSettings::default();
        let origin = area_origin(3);
        let anchors = anchors_for(origin);
        let local = origin + settings.spawn_point - anchors.area_origin;
        assert!(crate::visitation::VisitationGrid::cell_for(local).is_ok());
    }

    #[test]
    fn test_agent_spawns_facing_the_goal() {
        let settings = WallJumpSettings::default();
        let forward = crate::movement::body_forward(spawn_rotation());
        let to_goal = (GOAL_CENTER - settings.spawn_point).normalize();
        assert!(forward.dot(to_goal) > 0.9);
        // The wall stands between spawn and goal.
        assert!(settings.spawn_point.z < WALL_CENTER.z && WALL_CENTER.z < GOAL_CENTER.z);
    }

    #[test]
    fn test_spawn_training_area_creates_tagged_pieces() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);

        let settings = WallJumpSettings::default();
        let area = app
            .world_mut()
            .run_system_once(move |mut commands: Commands| {
                spawn_training_area(&mut commands, &settings, 0, DecisionSource::Random, 0.0)
            })
            .expect("spawn system should run");

        let world = app.world_mut();
        let mut tags = world.query::<&SurfaceTag>();
        let tags: Vec<_> = tags.iter(world).copied().collect();
        assert_eq!(tags.len(), 4);
        assert!(tags.contains(&SurfaceTag::Goal));
        assert!(tags.contains(&SurfaceTag::Wall));

        assert!(world.get::<Sensor>(area.goal).is_some());
        assert_eq!(
            world.get::<Position>(area.agent).map(|p| p.0),
            Some(WallJumpSettings::default().spawn_point)
        );
        assert_eq!(
            world.get::<Rotation>(area.agent).map(|r| r.0),
            Some(spawn_rotation())
        );

        let mut agents = world.query_filtered::<Entity, With<WallJumpAgent>>();
        assert_eq!(agents.iter(world).collect::<Vec<_>>(), vec![area.agent]);
    }
}
