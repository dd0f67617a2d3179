//! Obstacle-avoidance state machine.
//!
//! The navigator is the only writer of motion state and the only caller of
//! the drivetrain. It reacts to three kinds of input, each handled to
//! completion before the next:
//!
//! - proximity samples ([`Navigator::on_proximity`])
//! - bus messages ([`Navigator::on_message`])
//! - due maneuver timers ([`Navigator::fire_due`])
//!
//! Time is passed in by the caller as an offset from startup, so the same
//! code runs under the real event loop and under a virtual clock in tests.
//!
//! ## Maneuvers
//!
//! ```text
//! obstacle:  stop, reverse ──backup──▶ stop, spin L/R ──turn──▶ forward
//!                                  └─ cornered ─▶ look around ──▶ forward
//! manual:    stop, spin L/R ──turn──▶ forward + TURN_COMPLETED
//! halt:      stop (pending timers become no-ops)
//! ```
//!
//! Each step schedules its continuation tagged with the current maneuver
//! generation. A halt bumps the generation, so continuations that were
//! already queued fire into nothing instead of restarting the wheels.

use std::time::Duration;

use crate::bus::Message;
use crate::coin::CoinFlip;
use crate::config::AvoidanceConfig;
use crate::drive::Drivetrain;
use crate::error::{NavError, Result};
use crate::look_around::{LookAction, LookAround, LookEvent};
use crate::motion::{MotionState, TurnDirection};
use crate::proximity::{self, ProximitySampler};
use crate::timer::TimerQueue;
use crate::turn_log::RecentTurnLog;

/// Continuation of a maneuver, run when its timer elapses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    /// Reversing finished; pick a direction
    BackupComplete,
    /// Random evasive turn finished
    EvasiveTurnComplete,
    /// Remote-requested turn finished
    ManualTurnComplete,
    /// One turn of the look-around finished
    LookTurnComplete,
    /// A look window closed
    LookRecordingComplete,
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    generation: u64,
    step: Step,
}

/// Snapshot of navigator state for status reporting
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavigatorStatus {
    pub motion: MotionState,
    pub turning: bool,
    pub pending_turn_display: bool,
    pub recording: bool,
    pub recent_turns: usize,
    pub pending_timers: usize,
}

/// Obstacle-avoidance navigator.
pub struct Navigator {
    min_proximity_cm: f32,
    backup_duration: Duration,
    turn_duration: Duration,
    recording_duration: Duration,

    drive: Drivetrain,
    coin: Box<dyn CoinFlip>,

    motion: MotionState,
    /// Latched from the start of any maneuver until forward motion resumes
    turning: bool,
    /// A manual request was turned away; a completion notice is owed
    pending_turn_display: bool,

    sampler: ProximitySampler,
    turn_log: RecentTurnLog,
    look: Option<LookAround>,

    timers: TimerQueue<Timer>,
    generation: u64,

    /// Outbound notices, drained by the caller
    notices: Vec<Message>,
}

impl Navigator {
    pub fn new(config: &AvoidanceConfig, drive: Drivetrain, coin: Box<dyn CoinFlip>) -> Self {
        tracing::debug!(
            "Navigator: min proximity {:.1}cm, backup {}ms, turn {}ms, look window {}ms, {} turns in {}ms = cornered",
            config.min_proximity_cm,
            config.backup_ms,
            config.turn_ms,
            config.recording_ms,
            config.max_recent_turns,
            config.recent_turns_timeframe_ms
        );

        Self {
            min_proximity_cm: config.min_proximity_cm,
            backup_duration: config.backup_duration(),
            turn_duration: config.turn_duration(),
            recording_duration: config.recording_duration(),
            drive,
            coin,
            motion: MotionState::Stopped,
            turning: false,
            pending_turn_display: false,
            sampler: ProximitySampler::new(config.max_proximity_cm),
            turn_log: RecentTurnLog::new(
                config.max_recent_turns,
                config.recent_turns_timeframe(),
            ),
            look: None,
            timers: TimerQueue::new(),
            generation: 0,
            notices: Vec::new(),
        }
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    /// Start driving forward
    pub fn start(&mut self) {
        tracing::info!("Moving forward...");
        let result = self.drive.move_forward();
        if result.is_ok() {
            self.motion = MotionState::MovingForward;
        }
        self.guard("starting to move", result);
    }

    /// Handle one proximity sample (cm, non-positive = no echo)
    pub fn on_proximity(&mut self, reading_cm: f32, now: Duration) {
        if self.sampler.is_recording() {
            self.sampler.record(reading_cm);
            return;
        }

        if !self.should_avoid(reading_cm) {
            return;
        }

        tracing::info!("Obstacle detected (proximity: {:.1}cm)", reading_cm);
        let result = self.begin_avoidance(now);
        self.guard("reacting to proximity event", result);
    }

    /// Handle one bus message
    pub fn on_message(&mut self, message: Message, now: Duration) {
        match message {
            m if m.is_halt() => self.halt(m),
            Message::TurnLeft => self.request_turn(TurnDirection::Left, now),
            Message::TurnRight => self.request_turn(TurnDirection::Right, now),
            other => tracing::trace!("Ignoring {}", other),
        }
    }

    /// Run every maneuver step due at `now`, returning how many timers fired
    pub fn fire_due(&mut self, now: Duration) -> usize {
        let mut fired = 0;
        while let Some((_, timer)) = self.timers.pop_due(now) {
            fired += 1;

            if timer.generation != self.generation || self.motion == MotionState::Stopped {
                tracing::debug!("Dropping stale {:?} timer", timer.step);
                continue;
            }

            // Durations count from when the step actually runs
            let result = self.run_step(timer.step, now);
            self.guard("executing maneuver", result);
        }
        fired
    }

    // ========================================================================
    // Outputs and inspection
    // ========================================================================

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Drain notices produced since the last call, oldest first
    pub fn take_notices(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.notices)
    }

    pub fn motion(&self) -> MotionState {
        self.motion
    }

    pub fn is_turning(&self) -> bool {
        self.turning
    }

    pub fn pending_turn_display(&self) -> bool {
        self.pending_turn_display
    }

    pub fn is_recording(&self) -> bool {
        self.sampler.is_recording()
    }

    pub fn turn_log(&self) -> &RecentTurnLog {
        &self.turn_log
    }

    pub fn status(&self) -> NavigatorStatus {
        NavigatorStatus {
            motion: self.motion,
            turning: self.turning,
            pending_turn_display: self.pending_turn_display,
            recording: self.sampler.is_recording(),
            recent_turns: self.turn_log.len(),
            pending_timers: self.timers.len(),
        }
    }

    // ========================================================================
    // Obstacle avoidance
    // ========================================================================

    fn should_avoid(&self, reading_cm: f32) -> bool {
        !self.turning
            && self.motion != MotionState::Stopped
            && proximity::is_valid(reading_cm)
            && reading_cm < self.min_proximity_cm
    }

    fn begin_avoidance(&mut self, now: Duration) -> Result<()> {
        self.turning = true;
        self.turn_log.push(now);

        tracing::debug!("Backing up...");
        self.drive.stop()?;
        self.drive.move_backward()?;
        self.motion = MotionState::MovingBackward;

        self.schedule(now + self.backup_duration, Step::BackupComplete);
        Ok(())
    }

    fn run_step(&mut self, step: Step, now: Duration) -> Result<()> {
        match step {
            Step::BackupComplete => {
                self.drive.stop()?;

                if self.turn_log.needs_look_around(now) {
                    tracing::info!("Possibly in a corner, looking around...");
                    let first = TurnDirection::from_coin(self.coin.flip());
                    let (look, action) = LookAround::start(first);
                    self.look = Some(look);
                    self.apply_look_action(action, now)
                } else {
                    let direction = TurnDirection::from_coin(self.coin.flip());
                    self.spin(direction)?;
                    self.schedule(now + self.turn_duration, Step::EvasiveTurnComplete);
                    Ok(())
                }
            }
            Step::EvasiveTurnComplete => self.resume_forward(false),
            Step::ManualTurnComplete => self.resume_forward(true),
            Step::LookTurnComplete => {
                let action = self.look_mut()?.advance(LookEvent::TurnComplete)?;
                self.apply_look_action(action, now)
            }
            Step::LookRecordingComplete => {
                let mean = self.sampler.end_recording();
                tracing::info!("Average proximity: {:.2}cm", mean);
                let action = self
                    .look_mut()?
                    .advance(LookEvent::RecordingComplete(mean))?;
                self.apply_look_action(action, now)
            }
        }
    }

    fn look_mut(&mut self) -> Result<&mut LookAround> {
        self.look
            .as_mut()
            .ok_or_else(|| NavError::Other("no look-around in progress".to_string()))
    }

    fn apply_look_action(&mut self, action: LookAction, now: Duration) -> Result<()> {
        match action {
            LookAction::Turn(direction) => {
                self.spin(direction)?;
                self.schedule(now + self.turn_duration, Step::LookTurnComplete);
            }
            LookAction::Record(direction) => {
                self.drive.stop()?;
                self.sampler.begin_recording();
                self.motion = MotionState::looking(direction);
                self.schedule(now + self.recording_duration, Step::LookRecordingComplete);
            }
            LookAction::Resolved(direction) => {
                if let Some(look) = self.look.take() {
                    tracing::info!(
                        "Choosing {} ({} {:.1}cm, {} {:.1}cm)",
                        direction,
                        look.first(),
                        look.first_mean().unwrap_or_default(),
                        look.other(),
                        look.other_mean().unwrap_or_default()
                    );
                }
                self.resume_forward(false)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Manual turns and halts
    // ========================================================================

    fn request_turn(&mut self, direction: TurnDirection, now: Duration) {
        if self.turning {
            tracing::info!("Rejecting {} turn request, already turning", direction);
            self.pending_turn_display = true;
            self.notices.push(Message::TurnInProgress);
            return;
        }

        self.turning = true;
        self.notices.push(match direction {
            TurnDirection::Left => Message::TurningLeft,
            TurnDirection::Right => Message::TurningRight,
        });

        let result = self.begin_manual_turn(direction, now);
        self.guard("starting requested turn", result);
    }

    fn begin_manual_turn(&mut self, direction: TurnDirection, now: Duration) -> Result<()> {
        self.drive.stop()?;
        self.spin(direction)?;
        self.schedule(now + self.turn_duration, Step::ManualTurnComplete);
        Ok(())
    }

    fn halt(&mut self, reason: Message) {
        tracing::info!("{} received, stopping", reason);

        self.generation += 1;
        self.motion = MotionState::Stopped;
        self.turning = false;
        self.pending_turn_display = false;
        self.look = None;
        self.sampler.cancel();

        // Not reported on the bus: an ERROR_STATE here would halt us again
        if let Err(e) = self.drive.stop() {
            tracing::error!("Failed to stop wheels: {}", e);
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn spin(&mut self, direction: TurnDirection) -> Result<()> {
        tracing::info!("Turning {}...", direction);
        match direction {
            TurnDirection::Left => self.drive.turn_left()?,
            TurnDirection::Right => self.drive.turn_right()?,
        }
        self.motion = MotionState::turning(direction);
        Ok(())
    }

    /// End the current maneuver. A requested turn always reports completion;
    /// any other maneuver only pays off a deferred notice.
    fn resume_forward(&mut self, manual: bool) -> Result<()> {
        tracing::info!("Moving forward...");
        self.drive.move_forward()?;
        self.motion = MotionState::MovingForward;
        self.turning = false;

        if manual || self.pending_turn_display {
            self.notices.push(Message::TurnCompleted);
            self.pending_turn_display = false;
        }
        Ok(())
    }

    fn schedule(&mut self, due: Duration, step: Step) {
        self.timers.schedule(
            due,
            Timer {
                generation: self.generation,
                step,
            },
        );
    }

    /// Convert a failed maneuver into an ERROR_STATE notice; the motion
    /// state stays wherever the failure left it
    fn guard(&mut self, context: &str, result: Result<()>) {
        if let Err(e) = result {
            tracing::error!("An error occurred {}: {}", context, e);
            self.notices.push(Message::ErrorState);
        }
    }
}
