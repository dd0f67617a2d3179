//! Mock wheel driver for testing and simulation

use super::{Rotation, Wheel, WheelDriver};
use crate::error::{NavError, Result};
use std::sync::{Arc, Mutex, MutexGuard};

/// A command received by [`MockWheels`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WheelCommand {
    Spin(Wheel, Rotation, f32),
    Stop(Wheel),
}

impl WheelCommand {
    pub fn wheel(&self) -> Wheel {
        match *self {
            WheelCommand::Spin(wheel, ..) | WheelCommand::Stop(wheel) => wheel,
        }
    }
}

/// Mock wheel driver.
///
/// Clones share the same state, so a test (or the simulated sensor) can keep
/// a handle while the navigator owns the boxed driver.
#[derive(Clone)]
pub struct MockWheels {
    state: Arc<Mutex<MockWheelState>>,
}

#[derive(Debug)]
struct MockWheelState {
    history: Vec<WheelCommand>,
    left_forward: Rotation,
    right_forward: Rotation,
    fail_remaining: usize,
}

impl MockWheels {
    /// Create mock wheels with the default mirrored mounting (left cw, right ccw)
    pub fn new() -> Self {
        Self::with_calibration(Rotation::Cw, Rotation::Ccw)
    }

    /// Create mock wheels with an explicit forward rotation per side
    pub fn with_calibration(left_forward: Rotation, right_forward: Rotation) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockWheelState {
                history: Vec::new(),
                left_forward,
                right_forward,
                fail_remaining: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockWheelState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All commands received so far, oldest first
    pub fn history(&self) -> Vec<WheelCommand> {
        self.lock().history.clone()
    }

    /// Forget recorded commands
    pub fn clear(&self) {
        self.lock().history.clear();
    }

    /// Most recent command for one wheel
    pub fn last(&self, wheel: Wheel) -> Option<WheelCommand> {
        self.lock()
            .history
            .iter()
            .rev()
            .find(|c| c.wheel() == wheel)
            .copied()
    }

    /// Make the next `count` commands fail with an actuator error
    pub fn fail_next(&self, count: usize) {
        self.lock().fail_remaining = count;
    }

    /// Current speed of one wheel along the robot's forward axis.
    ///
    /// Positive is forward, negative is backward, 0 when stopped or never
    /// commanded.
    pub fn signed_speed(&self, wheel: Wheel) -> f32 {
        let forward = {
            let state = self.lock();
            match wheel {
                Wheel::Left => state.left_forward,
                Wheel::Right => state.right_forward,
            }
        };
        match self.last(wheel) {
            Some(WheelCommand::Spin(_, rotation, magnitude)) if rotation == forward => magnitude,
            Some(WheelCommand::Spin(_, _, magnitude)) => -magnitude,
            Some(WheelCommand::Stop(_)) | None => 0.0,
        }
    }

    /// Direction of each wheel as `(left_forward, right_forward)`, or `None`
    /// if either wheel is stopped
    pub fn motion(&self) -> Option<(bool, bool)> {
        let left = self.signed_speed(Wheel::Left);
        let right = self.signed_speed(Wheel::Right);
        if left == 0.0 || right == 0.0 {
            return None;
        }
        Some((left > 0.0, right > 0.0))
    }

    /// True when both wheels are stopped
    pub fn is_stopped(&self) -> bool {
        self.signed_speed(Wheel::Left) == 0.0 && self.signed_speed(Wheel::Right) == 0.0
    }

    fn record(&self, command: WheelCommand) -> Result<()> {
        let mut state = self.lock();
        if state.fail_remaining > 0 {
            state.fail_remaining -= 1;
            return Err(NavError::Actuator(format!("injected failure on {:?}", command)));
        }
        state.history.push(command);
        Ok(())
    }
}

impl Default for MockWheels {
    fn default() -> Self {
        Self::new()
    }
}

impl WheelDriver for MockWheels {
    fn set_speed(&mut self, wheel: Wheel, rotation: Rotation, magnitude: f32) -> Result<()> {
        self.record(WheelCommand::Spin(wheel, rotation, magnitude))
    }

    fn stop(&mut self, wheel: Wheel) -> Result<()> {
        self.record(WheelCommand::Stop(wheel))
    }
}
