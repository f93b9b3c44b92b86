//! Movement primitives used by the controller. All functions are pure.

use bevy::prelude::{Quat, Vec3};

use crate::action::{AgentAction, MoveCommand, RotateCommand, StrafeCommand};

pub const STRAFE_FACTOR: f32 = 0.6;
pub const AIRBORNE_FACTOR: f32 = 0.5;

/// Move `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance == 0.0 {
        target
    } else {
        current + delta / distance * max_delta
    }
}

/// Steer `velocity` toward the velocity that would carry `center_of_mass` to
/// `target`. Returns `None` when the target velocity is not a number, in
/// which case the caller leaves the body untouched for this tick.
pub fn steer_towards(
    target: Vec3,
    center_of_mass: Vec3,
    velocity: Vec3,
    target_speed: f32,
    max_change: f32,
    dt: f32,
) -> Option<Vec3> {
    let velocity_target = dt * target_speed * (target - center_of_mass);
    if velocity_target.is_nan() {
        return None;
    }
    Some(move_towards(velocity, velocity_target, max_change))
}

pub fn body_forward(rotation: Quat) -> Vec3 {
    rotation * Vec3::NEG_Z
}

pub fn body_right(rotation: Quat) -> Vec3 {
    rotation * Vec3::X
}

/// World-space movement direction for an action. Strafing replaces forward
/// motion when both are requested, and both are halved off the ground.
pub fn desired_direction(action: &AgentAction, rotation: Quat, coarse_grounded: bool) -> Vec3 {
    let scale = if coarse_grounded { 1.0 } else { AIRBORNE_FACTOR };
    let forward = body_forward(rotation);
    let right = body_right(rotation);

    let mut direction = match action.movement {
        MoveCommand::Forward => scale * forward,
        MoveCommand::Back => scale * -forward,
        MoveCommand::None => Vec3::ZERO,
    };

    match action.strafe {
        StrafeCommand::Left => direction = scale * -STRAFE_FACTOR * right,
        StrafeCommand::Right => direction = scale * STRAFE_FACTOR * right,
        StrafeCommand::None => {}
    }

    direction
}

/// Yaw applied this tick, in radians. Left is counter-clockwise seen from above.
pub fn yaw_delta(rotate: RotateCommand, degrees_per_second: f32, dt: f32) -> f32 {
    let magnitude = (degrees_per_second * dt).to_radians();
    match rotate {
        RotateCommand::Left => magnitude,
        RotateCommand::Right => -magnitude,
        RotateCommand::None => 0.0,
    }
}

pub fn rotate_body(rotation: Quat, yaw: f32) -> Quat {
    if yaw == 0.0 {
        return rotation;
    }
    (rotation * Quat::from_rotation_y(yaw)).normalize()
}
