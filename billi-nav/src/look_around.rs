//! Look both ways and pick the clearer heading.
//!
//! Run when the turn log suggests the robot is cornered. The robot starts
//! centered on its original heading:
//!
//! ```text
//! turn(first) -> record A -> turn(other) -> turn(other) -> record B
//!     B > A:  done, facing other
//!     B <= A: turn(first) -> turn(first) -> done, facing first
//! ```
//!
//! Two turns are needed to cross from one side to the other because the
//! first only brings the robot back to center. This type only sequences
//! the decision; the navigator executes each [`LookAction`] and reports
//! back when its timer elapses.

use crate::error::{NavError, Result};
use crate::motion::TurnDirection;

/// Next step the navigator should carry out
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LookAction {
    /// Spin toward the given side for one turn duration
    Turn(TurnDirection),
    /// Stop and sample for one look window, facing the given side
    Record(TurnDirection),
    /// Decision made; the robot is facing the given side
    Resolved(TurnDirection),
}

/// Completion reported by the navigator
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LookEvent {
    TurnComplete,
    RecordingComplete(f32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    ProbeFirst,
    RecordFirst,
    CenterFromFirst,
    ProbeOther,
    RecordOther,
    CenterFromOther,
    ReturnToFirst,
    Done,
}

/// Direction-decision sequence state
#[derive(Clone, Debug)]
pub struct LookAround {
    first: TurnDirection,
    phase: Phase,
    first_mean: Option<f32>,
    other_mean: Option<f32>,
}

impl LookAround {
    /// Begin probing `first`, returning the initial action
    pub fn start(first: TurnDirection) -> (Self, LookAction) {
        let look = Self {
            first,
            phase: Phase::ProbeFirst,
            first_mean: None,
            other_mean: None,
        };
        (look, LookAction::Turn(first))
    }

    pub fn first(&self) -> TurnDirection {
        self.first
    }

    pub fn other(&self) -> TurnDirection {
        self.first.opposite()
    }

    /// Mean proximity recorded facing the first side
    pub fn first_mean(&self) -> Option<f32> {
        self.first_mean
    }

    /// Mean proximity recorded facing the other side
    pub fn other_mean(&self) -> Option<f32> {
        self.other_mean
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Feed a completion and get the next action
    pub fn advance(&mut self, event: LookEvent) -> Result<LookAction> {
        let first = self.first;
        let other = self.other();

        let (next_phase, action) = match (self.phase, event) {
            (Phase::ProbeFirst, LookEvent::TurnComplete) => {
                (Phase::RecordFirst, LookAction::Record(first))
            }
            (Phase::RecordFirst, LookEvent::RecordingComplete(mean)) => {
                self.first_mean = Some(mean);
                (Phase::CenterFromFirst, LookAction::Turn(other))
            }
            (Phase::CenterFromFirst, LookEvent::TurnComplete) => {
                (Phase::ProbeOther, LookAction::Turn(other))
            }
            (Phase::ProbeOther, LookEvent::TurnComplete) => {
                (Phase::RecordOther, LookAction::Record(other))
            }
            (Phase::RecordOther, LookEvent::RecordingComplete(mean)) => {
                self.other_mean = Some(mean);
                let first_mean = self.first_mean.unwrap_or(0.0);
                if mean > first_mean {
                    (Phase::Done, LookAction::Resolved(other))
                } else {
                    (Phase::CenterFromOther, LookAction::Turn(first))
                }
            }
            (Phase::CenterFromOther, LookEvent::TurnComplete) => {
                (Phase::ReturnToFirst, LookAction::Turn(first))
            }
            (Phase::ReturnToFirst, LookEvent::TurnComplete) => {
                (Phase::Done, LookAction::Resolved(first))
            }
            (phase, event) => {
                return Err(NavError::Other(format!(
                    "look-around got {:?} during {:?}",
                    event, phase
                )));
            }
        };

        self.phase = next_phase;
        Ok(action)
    }
}
