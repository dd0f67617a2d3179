//! Simulated IR ranger.
//!
//! A one-dimensional world: the only thing that exists is the distance to
//! whatever is straight ahead. The distance follows the mock wheels:
//!
//! - Both wheels forward: distance shrinks
//! - Both wheels backward: distance grows
//! - Spinning in place: the robot ends up facing something new, so the
//!   distance is re-drawn once the spin ends
//!
//! Samples go through the GP2Y0A41SK0F transfer curve with ADC jitter and
//! occasional dropouts, so the navigator sees the same kind of readings
//! (including the "no echo" sentinel) it gets from the hardware.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;

use super::gp2y0a41::{self, ADC_MAX};
use super::noise::AdcNoise;
use crate::config::SimulationConfig;
use crate::drive::Wheel;
use crate::drive::mock::MockWheels;
use crate::error::Result;

/// Closest wall a re-draw can produce
const MIN_REDRAW_CM: f32 = 3.0;

/// The robot can't get closer than its own bumper
const MIN_DISTANCE_CM: f32 = 1.0;

/// Synthetic proximity sensor.
pub struct SimulatedRange {
    wheels: MockWheels,
    noise: AdcNoise,
    interval: Duration,

    distance_cm: f32,
    room_depth_cm: f32,
    cm_per_speed_sec: f32,
    noise_stddev_adc: f32,
    dropout_rate: f32,

    spinning: bool,
}

impl SimulatedRange {
    pub fn new(config: &SimulationConfig, interval: Duration, wheels: MockWheels) -> Self {
        Self {
            wheels,
            noise: AdcNoise::new(config.seed),
            interval,
            distance_cm: config.start_distance_cm.min(config.room_depth_cm).max(MIN_DISTANCE_CM),
            room_depth_cm: config.room_depth_cm,
            cm_per_speed_sec: config.cm_per_speed_sec,
            noise_stddev_adc: config.noise_stddev_adc,
            dropout_rate: config.dropout_rate,
            spinning: false,
        }
    }

    /// True distance to the obstacle ahead
    pub fn distance_cm(&self) -> f32 {
        self.distance_cm
    }

    /// Advance the world by `dt` and take one sample
    pub fn step(&mut self, dt: Duration) -> f32 {
        let left = self.wheels.signed_speed(Wheel::Left);
        let right = self.wheels.signed_speed(Wheel::Right);

        if left * right < 0.0 {
            self.spinning = true;
        } else {
            if self.spinning {
                self.spinning = false;
                self.distance_cm = self.noise.distance(MIN_REDRAW_CM, self.room_depth_cm);
                tracing::debug!("Sim: new heading, wall at {:.1}cm", self.distance_cm);
            }

            let speed = (left + right) / 2.0;
            let travelled = speed * self.cm_per_speed_sec * dt.as_secs_f32();
            self.distance_cm =
                (self.distance_cm - travelled).min(self.room_depth_cm).max(MIN_DISTANCE_CM);
        }

        self.sample()
    }

    fn sample(&mut self) -> f32 {
        if self.noise.dropout(self.dropout_rate) {
            return gp2y0a41::adc_to_cm(0);
        }
        let raw = gp2y0a41::cm_to_adc(self.distance_cm) as f32
            + self.noise.jitter(self.noise_stddev_adc);
        gp2y0a41::adc_to_cm(raw.round().clamp(0.0, ADC_MAX as f32) as u16)
    }

    /// Run on a dedicated thread, sending one sample per interval until
    /// `running` clears or the receiver hangs up.
    pub fn spawn(self, tx: Sender<f32>, running: Arc<AtomicBool>) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("proximity-sim".into())
            .spawn(move || self.run(tx, running))?;
        Ok(handle)
    }

    fn run(mut self, tx: Sender<f32>, running: Arc<AtomicBool>) {
        tracing::info!(
            "Simulated proximity sensor started ({}ms cadence, wall at {:.1}cm)",
            self.interval.as_millis(),
            self.distance_cm
        );

        while running.load(Ordering::Relaxed) {
            thread::sleep(self.interval);
            let reading = self.step(self.interval);
            tracing::trace!("Sim: {:.1}cm (true {:.1}cm)", reading, self.distance_cm);
            if tx.send(reading).is_err() {
                tracing::debug!("Proximity receiver dropped");
                break;
            }
        }

        tracing::info!("Simulated proximity sensor stopped");
    }
}
