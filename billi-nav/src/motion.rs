//! Motion state and turn direction types

use std::fmt;

/// What the drivetrain is currently doing, as far as the navigator knows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionState {
    Stopped,
    MovingForward,
    MovingBackward,
    TurningLeft,
    TurningRight,
    /// Stopped and sampling, facing left of the original heading
    LookingLeft,
    /// Stopped and sampling, facing right of the original heading
    LookingRight,
}

impl MotionState {
    pub fn turning(direction: TurnDirection) -> Self {
        match direction {
            TurnDirection::Left => MotionState::TurningLeft,
            TurnDirection::Right => MotionState::TurningRight,
        }
    }

    pub fn looking(direction: TurnDirection) -> Self {
        match direction {
            TurnDirection::Left => MotionState::LookingLeft,
            TurnDirection::Right => MotionState::LookingRight,
        }
    }

    /// True for every state that belongs to an in-flight maneuver
    pub fn is_maneuvering(self) -> bool {
        !matches!(self, MotionState::Stopped | MotionState::MovingForward)
    }
}

/// Spin-in-place direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    pub fn opposite(self) -> Self {
        match self {
            TurnDirection::Left => TurnDirection::Right,
            TurnDirection::Right => TurnDirection::Left,
        }
    }

    /// Heads is left
    pub fn from_coin(heads: bool) -> Self {
        if heads {
            TurnDirection::Left
        } else {
            TurnDirection::Right
        }
    }
}

impl fmt::Display for TurnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnDirection::Left => write!(f, "left"),
            TurnDirection::Right => write!(f, "right"),
        }
    }
}
