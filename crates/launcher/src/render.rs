use bevy::prelude::{
    App, Camera, Camera3d, Commands, DirectionalLight, Entity, Name, Plugin, Query, Startup,
    Transform, Vec3, With,
};

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (spawn_camera_if_none_exists, spawn_light));
    }
}

fn spawn_camera_if_none_exists(
    mut commands: Commands,
    existing_cameras: Query<Entity, With<Camera3d>>,
) {
    if existing_cameras.is_empty() {
        commands.spawn((
            Camera3d::default(),
            Camera {
                order: 0,
                ..Default::default()
            },
            Transform::from_xyz(-18.0, 16.0, -26.0).looking_at(Vec3::new(0.0, 1.0, 0.0), Vec3::Y),
            Name::new("TrainingCamera"),
        ));
    }
}

fn spawn_light(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..Default::default()
        },
        Transform::from_xyz(10.0, 20.0, -10.0).looking_at(Vec3::ZERO, Vec3::Y),
        Name::new("Sun"),
    ));
}
