use bevy::prelude::{Reflect, Resource, Vec3};
use serde::{Deserialize, Serialize};

pub const JUMP_DURATION: f32 = 0.2;
pub const ROTATION_SPEED_DEGREES: f32 = 300.0;
pub const FALLING_FORCE: f32 = 150.0;
pub const ENVIRONMENT_TIMEOUT: f32 = 30.0;
pub const SPAWN_POINT: Vec3 = Vec3::new(-2.0, 1.0, -12.0);

/// Tunable parameters of one training area, handed to each controller at
/// construction.
#[derive(Resource, Reflect, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WallJumpSettings {
    pub agent_run_speed: f32,
    pub agent_jump_height: f32,
    pub agent_jump_velocity: f32,
    pub agent_jump_velocity_max_change: f32,
    /// Seconds before an episode is cut with the timeout penalty.
    pub environment_timeout: f32,
    /// Extra downward acceleration while airborne and not jumping.
    pub falling_force: f32,
    pub jump_duration: f32,
    pub rotation_speed_degrees: f32,
    /// Spawn point in the area's local frame.
    pub spawn_point: Vec3,
}

impl Default for WallJumpSettings {
    fn default() -> Self {
        Self {
            agent_run_speed: 3.0,
            agent_jump_height: 2.75,
            agent_jump_velocity: 777.0,
            agent_jump_velocity_max_change: 10.0,
            environment_timeout: ENVIRONMENT_TIMEOUT,
            falling_force: FALLING_FORCE,
            jump_duration: JUMP_DURATION,
            rotation_speed_degrees: ROTATION_SPEED_DEGREES,
            spawn_point: SPAWN_POINT,
        }
    }
}

impl WallJumpSettings {
    pub fn with_run_speed(mut self, run_speed: f32) -> Self {
        self.agent_run_speed = run_speed;
        self
    }

    pub fn with_jump_height(mut self, jump_height: f32) -> Self {
        self.agent_jump_height = jump_height;
        self
    }

    pub fn with_timeout(mut self, timeout: f32) -> Self {
        self.environment_timeout = timeout;
        self
    }
}
