//! Discrete action tuple consumed by the controller each tick.

use bevy::prelude::{Component, Reflect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Reflect, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MoveCommand {
    #[default]
    None,
    Forward,
    Back,
}

#[derive(Reflect, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RotateCommand {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Reflect, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum StrafeCommand {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Reflect, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum JumpCommand {
    #[default]
    None,
    Jump,
}

/// One decision for one tick. Every field is an independent branch.
#[derive(
    Component, Reflect, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default,
)]
pub struct AgentAction {
    pub movement: MoveCommand,
    pub rotate: RotateCommand,
    pub strafe: StrafeCommand,
    pub jump: JumpCommand,
}

/// Branch sizes of the positional encoding: move, rotate, strafe, jump.
pub const BRANCH_SIZES: [u32; 4] = [3, 3, 3, 2];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    #[error("branch {branch} value {value} out of range 0..{size}")]
    OutOfRange { branch: usize, value: u32, size: u32 },
}

impl AgentAction {
    pub const IDLE: Self = Self {
        movement: MoveCommand::None,
        rotate: RotateCommand::None,
        strafe: StrafeCommand::None,
        jump: JumpCommand::None,
    };

    pub fn wants_jump(&self) -> bool {
        self.jump == JumpCommand::Jump
    }

    /// Decode the positional branch form used by discrete-action trainers.
    pub fn from_branches(branches: [u32; 4]) -> Result<Self, ActionError> {
        for (branch, (&value, &size)) in branches.iter().zip(BRANCH_SIZES.iter()).enumerate() {
            if value >= size {
                return Err(ActionError::OutOfRange {
                    branch,
                    value,
                    size,
                });
            }
        }

        let movement = match branches[0] {
            1 => MoveCommand::Forward,
            2 => MoveCommand::Back,
            _ => MoveCommand::None,
        };
        let rotate = match branches[1] {
            1 => RotateCommand::Left,
            2 => RotateCommand::Right,
            _ => RotateCommand::None,
        };
        let strafe = match branches[2] {
            1 => StrafeCommand::Left,
            2 => StrafeCommand::Right,
            _ => StrafeCommand::None,
        };
        let jump = if branches[3] == 1 {
            JumpCommand::Jump
        } else {
            JumpCommand::None
        };

        Ok(Self {
            movement,
            rotate,
            strafe,
            jump,
        })
    }

    pub fn to_branches(&self) -> [u32; 4] {
        [
            match self.movement {
                MoveCommand::None => 0,
                MoveCommand::Forward => 1,
                MoveCommand::Back => 2,
            },
            match self.rotate {
                RotateCommand::None => 0,
                RotateCommand::Left => 1,
                RotateCommand::Right => 2,
            },
            match self.strafe {
                StrafeCommand::None => 0,
                StrafeCommand::Left => 1,
                StrafeCommand::Right => 2,
            },
            u32::from(self.wants_jump()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(AgentAction::default(), AgentAction::IDLE);
        assert_eq!(AgentAction::IDLE.to_branches(), [0, 0, 0, 0]);
    }

    #[test]
    fn test_from_branches_maps_each_field() {
        let action = AgentAction::from_branches([2, 1, 2, 1]).unwrap();
        assert_eq!(action.movement, MoveCommand::Back);
        assert_eq!(action.rotate, RotateCommand::Left);
        assert_eq!(action.strafe, StrafeCommand::Right);
        assert!(action.wants_jump());
    }

    #[test]
    fn test_from_branches_rejects_out_of_range() {
        let err = AgentAction::from_branches([0, 0, 0, 2]).unwrap_err();
        assert_eq!(
            err,
            ActionError::OutOfRange {
                branch: 3,
                value: 2,
                size: 2
            }
        );

        assert!(AgentAction::from_branches([3, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_branches_survive_decoding() {
        let action = AgentAction {
            movement: MoveCommand::Forward,
            rotate: RotateCommand::Right,
            strafe: StrafeCommand::Left,
            jump: JumpCommand::None,
        };
        assert_eq!(AgentAction::from_branches(action.to_branches()), Ok(action));
    }
}
