//! Two-wheel drivetrain built on continuous-rotation servos.
//!
//! - [`WheelDriver`]: Trait to implement for the servo hardware
//! - [`Drivetrain`]: Maps robot-level motions onto per-wheel commands,
//!   applying the mounting calibration of each side
//! - [`mock::MockWheels`]: Recording driver for tests and simulation

pub mod mock;

use crate::config::DriveConfig;
use crate::error::Result;
use serde::Deserialize;

/// Drive unit selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Wheel {
    Left,
    Right,
}

/// Servo spin direction, as seen from the servo's own shaft
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    /// Clockwise
    Cw,
    /// Counter-clockwise
    Ccw,
}

impl Rotation {
    /// The opposite spin direction
    pub fn reversed(self) -> Self {
        match self {
            Rotation::Cw => Rotation::Ccw,
            Rotation::Ccw => Rotation::Cw,
        }
    }
}

/// Actuator interface for the two drive servos
pub trait WheelDriver: Send {
    /// Spin one wheel in `rotation` at `magnitude` (fraction of full speed, 0..=1)
    fn set_speed(&mut self, wheel: Wheel, rotation: Rotation, magnitude: f32) -> Result<()>;

    /// Stop one wheel
    fn stop(&mut self, wheel: Wheel) -> Result<()>;
}

/// Robot-level motion commands over a [`WheelDriver`].
///
/// The left and right servos are mounted mirrored, so "forward" is a
/// different shaft rotation on each side. The per-side forward rotation
/// comes from [`DriveConfig`] and never changes at runtime.
pub struct Drivetrain {
    driver: Box<dyn WheelDriver>,
    left_forward: Rotation,
    right_forward: Rotation,
    forward_speed: f32,
    reverse_speed: f32,
    turn_speed: f32,
}

impl Drivetrain {
    pub fn new(driver: Box<dyn WheelDriver>, config: &DriveConfig) -> Self {
        Self {
            driver,
            left_forward: config.left_forward,
            right_forward: config.right_forward,
            forward_speed: config.forward_speed,
            reverse_speed: config.reverse_speed,
            turn_speed: config.turn_speed,
        }
    }

    fn forward_rotation(&self, wheel: Wheel) -> Rotation {
        match wheel {
            Wheel::Left => self.left_forward,
            Wheel::Right => self.right_forward,
        }
    }

    /// Drive one wheel forward (`forward == true`) or backward.
    fn spin(&mut self, wheel: Wheel, forward: bool, magnitude: f32) -> Result<()> {
        let rotation = if forward {
            self.forward_rotation(wheel)
        } else {
            self.forward_rotation(wheel).reversed()
        };
        tracing::trace!(
            "{:?} wheel {:?} at {:.3} ({})",
            wheel,
            rotation,
            magnitude,
            if forward { "fwd" } else { "rev" }
        );
        self.driver.set_speed(wheel, rotation, magnitude)
    }

    pub fn move_forward(&mut self) -> Result<()> {
        tracing::debug!("Drive: forward");
        self.spin(Wheel::Left, true, self.forward_speed)?;
        self.spin(Wheel::Right, true, self.forward_speed)
    }

    pub fn move_backward(&mut self) -> Result<()> {
        tracing::debug!("Drive: backward");
        self.spin(Wheel::Left, false, self.reverse_speed)?;
        self.spin(Wheel::Right, false, self.reverse_speed)
    }

    /// Spin in place to the left: left wheel back, right wheel forward
    pub fn turn_left(&mut self) -> Result<()> {
        tracing::debug!("Drive: spin left");
        self.spin(Wheel::Left, false, self.turn_speed)?;
        self.spin(Wheel::Right, true, self.turn_speed)
    }

    /// Spin in place to the right: left wheel forward, right wheel back
    pub fn turn_right(&mut self) -> Result<()> {
        tracing::debug!("Drive: spin right");
        self.spin(Wheel::Left, true, self.turn_speed)?;
        self.spin(Wheel::Right, false, self.turn_speed)
    }

    /// Stop both wheels. Tries the right wheel even if the left one fails.
    pub fn stop(&mut self) -> Result<()> {
        tracing::debug!("Drive: stop");
        let left = self.driver.stop(Wheel::Left);
        let right = self.driver.stop(Wheel::Right);
        left.and(right)
    }
}
