//! Reward shaping terms and the per-tick accumulator.

use bevy::prelude::Vec3;

pub const TIME_PENALTY: f32 = -0.0005;
pub const CLIMB_HEIGHT_THRESHOLD: f32 = 4.0;
pub const CLIMB_REWARD_PER_UNIT: f32 = 0.001;
pub const GOAL_DISTANCE_PENALTY_PER_UNIT: f32 = -0.0001;
pub const EXPLORATION_BONUS: f32 = 0.5;
pub const REVISIT_PENALTY: f32 = -0.005;

pub const GOAL_REWARD: f32 = 1.0;
pub const FELL_REWARD: f32 = -1.0;
pub const TIMEOUT_PENALTY: f32 = -5.0;

/// Reward for standing high above the ground reference.
pub fn climb_reward(height: f32) -> f32 {
    if height > CLIMB_HEIGHT_THRESHOLD {
        CLIMB_REWARD_PER_UNIT * height
    } else {
        0.0
    }
}

pub fn goal_distance_reward(local_position: Vec3, goal_local_position: Vec3) -> f32 {
    GOAL_DISTANCE_PENALTY_PER_UNIT * local_position.distance(goal_local_position)
}

/// Reward gathered since the host last consumed it, plus the running
/// episode total.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RewardAccumulator {
    pending: f32,
    episode_total: f32,
}

impl RewardAccumulator {
    pub fn add(&mut self, reward: f32) {
        self.pending += reward;
        self.episode_total += reward;
    }

    /// Replace whatever was gathered since the last `take`.
    pub fn set(&mut self, reward: f32) {
        self.episode_total += reward - self.pending;
        self.pending = reward;
    }

    pub fn pending(&self) -> f32 {
        self.pending
    }

    pub fn episode_total(&self) -> f32 {
        self.episode_total
    }

    pub fn take(&mut self) -> f32 {
        std::mem::take(&mut self.pending)
    }
}
