//! Where each agent's action comes from: the keyboard, a seeded random
//! policy, or an external trainer writing [`AgentAction`] directly.

use bevy::prelude::{Component, KeyCode, Reflect, Resource};
use leafwing_input_manager::Actionlike;
use leafwing_input_manager::prelude::{ActionState, InputMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::action::{AgentAction, JumpCommand, MoveCommand, RotateCommand, StrafeCommand};

#[derive(
    Component, Reflect, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default,
)]
pub enum DecisionSource {
    /// Manual control for diagnosing a level.
    Heuristic,
    Random,
    /// The host writes the agent's [`AgentAction`] between observing and acting.
    #[default]
    External,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, Reflect, Serialize, Deserialize, Actionlike,
)]
pub enum AgentInput {
    Forward,
    Back,
    TurnLeft,
    TurnRight,
    Jump,
}

pub fn agent_input_map() -> InputMap<AgentInput> {
    InputMap::<AgentInput>::default()
        .with(AgentInput::Forward, KeyCode::KeyW)
        .with(AgentInput::Back, KeyCode::KeyS)
        .with(AgentInput::TurnLeft, KeyCode::KeyA)
        .with(AgentInput::TurnRight, KeyCode::KeyD)
        .with(AgentInput::Jump, KeyCode::Space)
}

/// Raw key state of the manual control path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct HeuristicKeys {
    pub forward: bool,
    pub back: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub jump: bool,
}

impl HeuristicKeys {
    pub fn from_action_state(action_state: &ActionState<AgentInput>) -> Self {
        Self {
            forward: action_state.pressed(&AgentInput::Forward),
            back: action_state.pressed(&AgentInput::Back),
            turn_left: action_state.pressed(&AgentInput::TurnLeft),
            turn_right: action_state.pressed(&AgentInput::TurnRight),
            jump: action_state.pressed(&AgentInput::Jump),
        }
    }
}

/// Back wins over forward and left wins over right when both are held.
/// Strafing has no key.
pub fn heuristic_action(keys: HeuristicKeys) -> AgentAction {
    let mut action = AgentAction::IDLE;

    if keys.turn_right {
        action.rotate = RotateCommand::Right;
    }
    if keys.forward {
        action.movement = MoveCommand::Forward;
    }
    if keys.turn_left {
        action.rotate = RotateCommand::Left;
    }
    if keys.back {
        action.movement = MoveCommand::Back;
    }
    if keys.jump {
        action.jump = JumpCommand::Jump;
    }

    action
}

#[derive(Resource)]
pub struct PolicyRng(pub StdRng);

impl PolicyRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for PolicyRng {
    fn default() -> Self {
        Self(StdRng::from_os_rng())
    }
}

/// Uniform over every branch.
pub fn random_action(rng: &mut impl Rng) -> AgentAction {
    let movement = match rng.random_range(0..3) {
        1 => MoveCommand::Forward,
        2 => MoveCommand::Back,
        _ => MoveCommand::None,
    };
    let rotate = match rng.random_range(0..3) {
        1 => RotateCommand::Left,
        2 => RotateCommand::Right,
        _ => RotateCommand::None,
    };
    let strafe = match rng.random_range(0..3) {
        1 => StrafeCommand::Left,
        2 => StrafeCommand::Right,
        _ => StrafeCommand::None,
    };
    let jump = if rng.random_bool(0.5) {
        JumpCommand::Jump
    } else {
        JumpCommand::None
    };

    AgentAction {
        movement,
        rotate,
        strafe,
        jump,
    }
}
