//! Navigation service: wires the navigator to the outside world.
//!
//! One thread, one loop. Each iteration fires due maneuver timers, then
//! blocks on whichever comes first of a proximity sample, a bus message or
//! the next timer deadline. Every event runs to completion before the next
//! is looked at, so the navigator needs no locking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, select};

use crate::bus::{Message, MessageBus};
use crate::coin::CoinFlip;
use crate::config::NavConfig;
use crate::drive::{Drivetrain, WheelDriver};
use crate::error::{NavError, Result};
use crate::motion::MotionState;
use crate::navigator::Navigator;

/// Longest the loop blocks before re-checking the running flag
const IDLE_POLL: Duration = Duration::from_millis(100);

/// How often a status line is logged at debug level
const STATUS_INTERVAL: Duration = Duration::from_secs(5);

/// Event loop around a [`Navigator`].
pub struct NavigationService {
    bus: Box<dyn MessageBus>,
    navigator: Navigator,
    proximity: Receiver<f32>,
    inbox: Option<Receiver<Message>>,
    epoch: Instant,
}

impl NavigationService {
    pub fn new(
        config: &NavConfig,
        bus: Box<dyn MessageBus>,
        driver: Box<dyn WheelDriver>,
        coin: Box<dyn CoinFlip>,
        proximity: Receiver<f32>,
    ) -> Self {
        let drive = Drivetrain::new(driver, &config.drive);
        Self {
            bus,
            navigator: Navigator::new(&config.avoidance, drive, coin),
            proximity,
            inbox: None,
            epoch: Instant::now(),
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Subscribe to the bus and start driving forward.
    ///
    /// If the subscription can't be set up, ERROR_STATE is published once and
    /// the error is returned; the wheels are never started.
    pub fn startup(&mut self) -> Result<()> {
        let inbox = match self.bus.subscribe() {
            Ok(rx) => rx,
            Err(e) => {
                tracing::error!("Failed to subscribe to message bus: {}", e);
                if let Err(pe) = self.bus.publish(Message::ErrorState) {
                    tracing::warn!("Could not report subscription failure: {}", pe);
                }
                return Err(e);
            }
        };
        self.inbox = Some(inbox);
        self.epoch = Instant::now();

        self.navigator.start();
        self.flush_notices();
        Ok(())
    }

    /// Process events until `running` clears.
    ///
    /// Returns an error if an input channel disconnects while still running.
    pub fn run(&mut self, running: &AtomicBool) -> Result<()> {
        let inbox = self
            .inbox
            .clone()
            .ok_or_else(|| NavError::Bus("service not started".to_string()))?;
        let proximity = self.proximity.clone();

        tracing::info!("Navigation service running");
        let mut last_status = Instant::now();

        while running.load(Ordering::Relaxed) {
            let now = self.elapsed();
            self.navigator.fire_due(now);
            self.flush_notices();

            let timeout = self
                .navigator
                .next_deadline()
                .map(|due| due.saturating_sub(now))
                .unwrap_or(IDLE_POLL)
                .min(IDLE_POLL);

            select! {
                recv(proximity) -> reading => match reading {
                    Ok(cm) => {
                        let now = self.elapsed();
                        self.navigator.fire_due(now);
                        self.navigator.on_proximity(cm, now);
                    }
                    Err(_) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        return Err(NavError::Sensor("proximity channel closed".to_string()));
                    }
                },
                recv(inbox) -> message => match message {
                    Ok(message) => {
                        let now = self.elapsed();
                        self.navigator.fire_due(now);
                        self.navigator.on_message(message, now);
                    }
                    Err(_) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        return Err(NavError::Bus("message channel closed".to_string()));
                    }
                },
                default(timeout) => {}
            }
            self.flush_notices();

            if last_status.elapsed() >= STATUS_INTERVAL {
                tracing::debug!("Status: {:?}", self.navigator.status());
                last_status = Instant::now();
            }
        }

        if self.navigator.motion() != MotionState::Stopped {
            let now = self.elapsed();
            self.navigator.on_message(Message::ShuttingDown, now);
        }
        tracing::info!("Navigation service stopped");
        Ok(())
    }

    fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn flush_notices(&mut self) {
        for notice in self.navigator.take_notices() {
            tracing::debug!("Publishing {}", notice);
            if let Err(e) = self.bus.publish(notice) {
                tracing::warn!("Failed to publish {}: {}", notice, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ChannelBus;
    use crate::coin::FixedCoin;
    use crate::drive::mock::MockWheels;

    fn service(bus: &ChannelBus) -> (NavigationService, MockWheels, crossbeam_channel::Sender<f32>) {
        let wheels = MockWheels::new();
        let (tx, rx) = crossbeam_channel::unbounded();
        let service = NavigationService::new(
            &NavConfig::default(),
            Box::new(bus.clone()),
            Box::new(wheels.clone()),
            Box::new(FixedCoin(true)),
            rx,
        );
        (service, wheels, tx)
    }

    #[test]
    fn test_startup_moves_forward() {
        let bus = ChannelBus::new();
        let (mut service, wheels, _tx) = service(&bus);

        service.startup().unwrap();

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(wheels.motion(), Some((true, true)));
        assert_eq!(service.navigator().motion(), MotionState::MovingForward);
    }

    #[test]
    fn test_subscription_failure_returns_error() {
        let bus = ChannelBus::new();
        let (mut service, wheels, _tx) = service(&bus);
        bus.close();

        assert!(matches!(service.startup(), Err(NavError::Bus(_))));
        assert!(wheels.history().is_empty());
        assert_eq!(service.navigator().motion(), MotionState::Stopped);
    }

    #[test]
    fn test_run_requires_startup() {
        let bus = ChannelBus::new();
        let (mut service, _wheels, _tx) = service(&bus);
        let running = AtomicBool::new(true);
        assert!(service.run(&running).is_err());
    }

    #[test]
    fn test_run_exits_when_flag_cleared() {
        let bus = ChannelBus::new();
        let (mut service, wheels, _tx) = service(&bus);
        service.startup().unwrap();

        let running = AtomicBool::new(false);
        service.run(&running).unwrap();

        assert!(wheels.is_stopped());
        assert_eq!(service.navigator().motion(), MotionState::Stopped);
    }
}
