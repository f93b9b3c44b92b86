//! Wall-jump reinforcement-learning agent.
//!
//! The control loop lives in [`controller::AgentController`] and only talks to
//! the physics world through [`ground::GroundProbe`] and a plain
//! [`controller::BodyState`]. [`plugin::WallJumpPlugin`] drives it from Bevy's
//! `FixedUpdate` using Avian spatial queries.

pub mod action;
pub mod controller;
pub mod episode;
pub mod ground;
pub mod level;
pub mod movement;
pub mod observation;
pub mod plugin;
pub mod policy;
pub mod reward;
pub mod settings;
pub mod visitation;

#[cfg(test)]
mod tests;

pub use action::{AgentAction, JumpCommand, MoveCommand, RotateCommand, StrafeCommand};
pub use controller::{AgentController, BodyState};
pub use episode::{EpisodeEnded, EpisodeOutcome, EpisodeStats};
pub use plugin::{WallJumpAgent, WallJumpPlugin, WallJumpSystems};
pub use policy::DecisionSource;
pub use settings::WallJumpSettings;

pub const FIXED_TIMESTEP_HZ: f64 = 50.0;
