use bevy::prelude::Vec3;
use serde::{Deserialize, Serialize};

pub const OBSERVATION_SIZE: usize = 4;
pub const POSITION_SCALE: f32 = 20.0;

/// Fixed-length vector handed to the policy:
/// position relative to the ground reference scaled by 1/20, then the fine
/// grounded flag.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation(pub [f32; OBSERVATION_SIZE]);

impl Observation {
    pub fn build(position: Vec3, ground_reference: Vec3, fine_grounded: bool) -> Self {
        let relative = (position - ground_reference) / POSITION_SCALE;
        Self([
            relative.x,
            relative.y,
            relative.z,
            if fine_grounded { 1.0 } else { 0.0 },
        ])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn relative_position(&self) -> Vec3 {
        Vec3::new(self.0[0], self.0[1], self.0[2]) * POSITION_SCALE
    }

    pub fn is_grounded(&self) -> bool {
        self.0[3] > 0.5
    }
}
