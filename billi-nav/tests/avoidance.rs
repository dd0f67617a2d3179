//! Obstacle Avoidance Scenarios
//!
//! Drives the navigator through complete maneuvers on a virtual clock:
//! - Threshold crossing and the stop/back-up/turn/forward sequence
//! - Cornered detection routing through the look-around
//! - Manual turns, deferred completion notices and forced stops
//! - Closed loop against the simulated ranger
//!
//! Run with: `cargo test --test avoidance`

use billi_nav::config::{AvoidanceConfig, DriveConfig, SimulationConfig};
use billi_nav::sensor::SimulatedRange;
use billi_nav::{
    Drivetrain, FixedCoin, Message, MockWheels, MotionState, Navigator, RandomCoin, Rotation,
    Wheel, WheelCommand,
};
use std::time::Duration;

// ============================================================================
// Harness
// ============================================================================

const SAMPLE_MS: u64 = 100;

/// Navigator plus a virtual clock advancing in sensor-sample steps
struct Rig {
    nav: Navigator,
    wheels: MockWheels,
    now: Duration,
}

impl Rig {
    fn new(heads: bool) -> Self {
        let wheels = MockWheels::new();
        let drive = Drivetrain::new(Box::new(wheels.clone()), &DriveConfig::default());
        let mut nav = Navigator::new(
            &AvoidanceConfig::default(),
            drive,
            Box::new(FixedCoin(heads)),
        );
        nav.start();
        wheels.clear();
        Self {
            nav,
            wheels,
            now: Duration::ZERO,
        }
    }

    /// Advance one sample period and deliver `reading`
    fn sample(&mut self, reading: f32) {
        self.now += Duration::from_millis(SAMPLE_MS);
        self.nav.fire_due(self.now);
        self.nav.on_proximity(reading, self.now);
    }

    /// Advance `ms` with the sensor reporting open space
    fn idle(&mut self, ms: u64) {
        for _ in 0..ms / SAMPLE_MS {
            self.sample(100.0);
        }
    }

    fn message(&mut self, message: Message) {
        self.nav.on_message(message, self.now);
    }

    /// Count how many times the robot started reversing
    fn backups(&self) -> usize {
        self.wheels
            .history()
            .iter()
            .filter(|c| matches!(c, WheelCommand::Spin(Wheel::Left, Rotation::Ccw, s) if *s == 0.025))
            .count()
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_third_reading_triggers_avoidance() {
    let mut rig = Rig::new(true);

    rig.sample(20.0);
    rig.sample(20.0);
    assert_eq!(rig.nav.motion(), MotionState::MovingForward);
    assert!(rig.wheels.history().is_empty());

    rig.sample(5.0);
    assert_eq!(rig.nav.motion(), MotionState::MovingBackward);
    assert_eq!(rig.backups(), 1);

    // 650ms back-up, then a 1s turn
    rig.idle(700);
    assert_eq!(rig.nav.motion(), MotionState::TurningLeft);
    rig.idle(1000);
    assert_eq!(rig.nav.motion(), MotionState::MovingForward);
    assert!(!rig.nav.is_turning());
}

#[test]
fn test_sentinel_readings_are_ignored() {
    let mut rig = Rig::new(true);
    for _ in 0..20 {
        rig.sample(-1.0);
        rig.sample(0.0);
    }
    assert_eq!(rig.backups(), 0);
    assert_eq!(rig.nav.motion(), MotionState::MovingForward);
}

#[test]
fn test_obstacle_during_maneuver_is_ignored() {
    let mut rig = Rig::new(false);
    rig.sample(3.0);
    for _ in 0..10 {
        rig.sample(3.0);
    }
    assert_eq!(rig.backups(), 1);
    assert_eq!(rig.nav.turn_log().len(), 1);
}

#[test]
fn test_three_quick_turns_route_through_look_around() {
    let mut rig = Rig::new(true);

    for _ in 0..2 {
        rig.sample(5.0);
        rig.idle(2000);
        assert_eq!(rig.nav.motion(), MotionState::MovingForward);
    }

    rig.sample(5.0);
    rig.idle(700);
    assert_eq!(rig.nav.motion(), MotionState::TurningLeft);
    rig.idle(1000);
    assert_eq!(rig.nav.motion(), MotionState::LookingLeft);

    // Left side: ~23cm
    for r in [22.0, 24.0, 23.0].repeat(5) {
        rig.sample(r);
    }
    assert!(!rig.nav.is_recording());
    assert_eq!(rig.nav.motion(), MotionState::TurningRight);

    rig.idle(2000);
    assert_eq!(rig.nav.motion(), MotionState::LookingRight);

    // Right side: ~41cm
    for _ in 0..15 {
        rig.sample(41.0);
    }
    assert_eq!(rig.nav.motion(), MotionState::MovingForward);
    assert!(!rig.nav.is_turning());
}

#[test]
fn test_manual_turn_notices() {
    let mut rig = Rig::new(true);

    rig.message(Message::TurnRight);
    rig.idle(500);
    rig.message(Message::TurnLeft);
    rig.idle(600);

    assert_eq!(
        rig.nav.take_notices(),
        vec![
            Message::TurningRight,
            Message::TurnInProgress,
            Message::TurnCompleted
        ]
    );
    assert_eq!(rig.nav.motion(), MotionState::MovingForward);
}

#[test]
fn test_shutdown_while_turning_left() {
    let mut rig = Rig::new(true);
    rig.message(Message::TurnLeft);
    rig.idle(300);
    assert_eq!(rig.nav.motion(), MotionState::TurningLeft);
    rig.wheels.clear();

    rig.message(Message::ShuttingDown);
    assert_eq!(
        rig.wheels.history(),
        vec![WheelCommand::Stop(Wheel::Left), WheelCommand::Stop(Wheel::Right)]
    );

    // Nothing restarts the wheels: not the pending timer, not obstacles
    rig.sample(2.0);
    rig.idle(5000);
    assert_eq!(rig.wheels.history().len(), 2);
    assert_eq!(rig.nav.motion(), MotionState::Stopped);
}

#[test]
fn test_error_state_mid_look_around() {
    let mut rig = Rig::new(false);
    for _ in 0..2 {
        rig.sample(5.0);
        rig.idle(2000);
    }
    rig.sample(5.0);
    rig.idle(1700);
    assert_eq!(rig.nav.motion(), MotionState::LookingRight);

    rig.message(Message::ErrorState);
    rig.idle(10_000);

    assert_eq!(rig.nav.motion(), MotionState::Stopped);
    assert!(rig.wheels.is_stopped());
    assert!(!rig.nav.is_recording());
    assert_eq!(rig.nav.next_deadline(), None);
}

// ============================================================================
// Closed loop
// ============================================================================

#[test]
fn test_closed_loop_with_simulated_ranger() {
    let avoidance = AvoidanceConfig::default();
    let wheels = MockWheels::new();
    let drive = Drivetrain::new(Box::new(wheels.clone()), &DriveConfig::default());
    let mut nav = Navigator::new(&avoidance, drive, Box::new(RandomCoin::new(7)));

    let sim_config = SimulationConfig {
        seed: 11,
        ..Default::default()
    };
    let step = Duration::from_millis(SAMPLE_MS);
    let mut sim = SimulatedRange::new(&sim_config, step, wheels.clone());

    nav.start();
    let mut now = Duration::ZERO;
    let mut looked = false;

    // Five minutes of wandering
    for _ in 0..3000 {
        now += step;
        nav.fire_due(now);
        let reading = sim.step(step);
        nav.on_proximity(reading, now);

        assert_eq!(nav.is_turning(), nav.motion().is_maneuvering());
        assert!(nav.turn_log().len() <= avoidance.max_recent_turns);
        assert!(nav.take_notices().is_empty());
        looked |= matches!(
            nav.motion(),
            MotionState::LookingLeft | MotionState::LookingRight
        );
    }

    assert!(!nav.turn_log().is_empty());
    assert!(looked);

    nav.on_message(Message::ShuttingDown, now);
    let commands = wheels.history().len();
    for _ in 0..100 {
        now += step;
        nav.fire_due(now);
        nav.on_proximity(sim.step(step), now);
    }
    assert_eq!(wheels.history().len(), commands);
    assert!(wheels.is_stopped());
}
