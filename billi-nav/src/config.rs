//! Configuration loading for BilliNav

use crate::drive::Rotation;
use crate::error::{NavError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NavConfig {
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub avoidance: AvoidanceConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Wheel speeds and mounting calibration
#[derive(Clone, Debug, Deserialize)]
pub struct DriveConfig {
    /// Cruising speed as a fraction of full servo speed (default: 0.04)
    #[serde(default = "default_forward_speed")]
    pub forward_speed: f32,

    /// Backing-up speed (default: 0.025)
    #[serde(default = "default_reverse_speed")]
    pub reverse_speed: f32,

    /// Spin-in-place speed (default: 0.03)
    #[serde(default = "default_turn_speed")]
    pub turn_speed: f32,

    /// Rotation that drives the left wheel forward (default: cw)
    #[serde(default = "default_left_forward")]
    pub left_forward: Rotation,

    /// Rotation that drives the right wheel forward (default: ccw, the
    /// right servo is mounted mirrored)
    #[serde(default = "default_right_forward")]
    pub right_forward: Rotation,
}

/// Obstacle avoidance thresholds and maneuver timing
#[derive(Clone, Debug, Deserialize)]
pub struct AvoidanceConfig {
    /// Closest allowed obstacle while moving, in cm (default: 8)
    #[serde(default = "default_min_proximity")]
    pub min_proximity_cm: f32,

    /// Distance substituted for "no echo" readings, in cm (default: 25)
    #[serde(default = "default_max_proximity")]
    pub max_proximity_cm: f32,

    /// How long to reverse after an obstacle (default: 650)
    #[serde(default = "default_backup_ms")]
    pub backup_ms: u64,

    /// Duration of a single turn (default: 1000)
    #[serde(default = "default_turn_ms")]
    pub turn_ms: u64,

    /// Length of one look window (default: 1500)
    #[serde(default = "default_recording_ms")]
    pub recording_ms: u64,

    /// Number of recent evasive turns tracked (default: 3)
    #[serde(default = "default_max_recent_turns")]
    pub max_recent_turns: usize,

    /// Window in which `max_recent_turns` turns mean "cornered" (default: 15000)
    #[serde(default = "default_recent_turns_timeframe_ms")]
    pub recent_turns_timeframe_ms: u64,

    /// Seed for the direction coin flip, 0 = entropy (default: 0)
    #[serde(default)]
    pub random_seed: u64,
}

/// Proximity sensor settings
#[derive(Clone, Debug, Deserialize)]
pub struct SensorConfig {
    /// Sampling period in milliseconds (default: 100)
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Sensor model name (default: gp2y0a41sk0f)
    #[serde(default = "default_sensor_model")]
    pub model: String,
}

/// Simulated world used when no hardware is attached
#[derive(Clone, Debug, Deserialize)]
pub struct SimulationConfig {
    /// Run against the simulated sensor and mock wheels (default: true)
    #[serde(default = "default_simulation_enabled")]
    pub enabled: bool,

    /// Distance to the first wall at startup, in cm (default: 40)
    #[serde(default = "default_start_distance")]
    pub start_distance_cm: f32,

    /// Upper bound for the distance re-drawn after each turn, in cm (default: 60)
    #[serde(default = "default_room_depth")]
    pub room_depth_cm: f32,

    /// Robot travel per unit of servo speed per second, in cm (default: 250)
    #[serde(default = "default_cm_per_speed_sec")]
    pub cm_per_speed_sec: f32,

    /// Gaussian noise on raw ADC counts (default: 2.0)
    #[serde(default = "default_noise_stddev_adc")]
    pub noise_stddev_adc: f32,

    /// Probability of a sample reading "no echo" (default: 0.02)
    #[serde(default = "default_dropout_rate")]
    pub dropout_rate: f32,

    /// Noise seed, 0 = entropy (default: 0)
    #[serde(default)]
    pub seed: u64,
}

/// Logging configuration
#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    /// Default log level for the crate (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            forward_speed: default_forward_speed(),
            reverse_speed: default_reverse_speed(),
            turn_speed: default_turn_speed(),
            left_forward: default_left_forward(),
            right_forward: default_right_forward(),
        }
    }
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            min_proximity_cm: default_min_proximity(),
            max_proximity_cm: default_max_proximity(),
            backup_ms: default_backup_ms(),
            turn_ms: default_turn_ms(),
            recording_ms: default_recording_ms(),
            max_recent_turns: default_max_recent_turns(),
            recent_turns_timeframe_ms: default_recent_turns_timeframe_ms(),
            random_seed: 0,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
            model: default_sensor_model(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: default_simulation_enabled(),
            start_distance_cm: default_start_distance(),
            room_depth_cm: default_room_depth(),
            cm_per_speed_sec: default_cm_per_speed_sec(),
            noise_stddev_adc: default_noise_stddev_adc(),
            dropout_rate: default_dropout_rate(),
            seed: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_forward_speed() -> f32 {
    0.04
}
fn default_reverse_speed() -> f32 {
    0.025
}
fn default_turn_speed() -> f32 {
    0.03
}
fn default_left_forward() -> Rotation {
    Rotation::Cw
}
fn default_right_forward() -> Rotation {
    Rotation::Ccw
}

// Avoidance defaults
fn default_min_proximity() -> f32 {
    8.0
}
fn default_max_proximity() -> f32 {
    25.0
}
fn default_backup_ms() -> u64 {
    650
}
fn default_turn_ms() -> u64 {
    1000
}
fn default_recording_ms() -> u64 {
    1500
}
fn default_max_recent_turns() -> usize {
    3
}
fn default_recent_turns_timeframe_ms() -> u64 {
    15_000
}

fn default_sample_interval_ms() -> u64 {
    100
}
fn default_sensor_model() -> String {
    "gp2y0a41sk0f".to_string()
}

// Simulation defaults
fn default_simulation_enabled() -> bool {
    true
}
fn default_start_distance() -> f32 {
    40.0
}
fn default_room_depth() -> f32 {
    60.0
}
fn default_cm_per_speed_sec() -> f32 {
    250.0
} // 0.04 speed ≈ 10 cm/s
fn default_noise_stddev_adc() -> f32 {
    2.0
}
fn default_dropout_rate() -> f32 {
    0.02
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AvoidanceConfig {
    pub fn backup_duration(&self) -> Duration {
        Duration::from_millis(self.backup_ms)
    }

    pub fn turn_duration(&self) -> Duration {
        Duration::from_millis(self.turn_ms)
    }

    pub fn recording_duration(&self) -> Duration {
        Duration::from_millis(self.recording_ms)
    }

    pub fn recent_turns_timeframe(&self) -> Duration {
        Duration::from_millis(self.recent_turns_timeframe_ms)
    }
}

impl SensorConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}

impl NavConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("Failed to read config file: {}", e)))?;
        let config: NavConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the navigator cannot run with
    pub fn validate(&self) -> Result<()> {
        let a = &self.avoidance;
        if a.max_recent_turns == 0 {
            return Err(NavError::Config(
                "avoidance.max_recent_turns must be at least 1".to_string(),
            ));
        }
        if !(a.min_proximity_cm > 0.0 && a.min_proximity_cm < a.max_proximity_cm) {
            return Err(NavError::Config(format!(
                "avoidance.min_proximity_cm ({}) must be positive and below max_proximity_cm ({})",
                a.min_proximity_cm, a.max_proximity_cm
            )));
        }
        for (name, ms) in [
            ("backup_ms", a.backup_ms),
            ("turn_ms", a.turn_ms),
            ("recording_ms", a.recording_ms),
            ("recent_turns_timeframe_ms", a.recent_turns_timeframe_ms),
        ] {
            if ms == 0 {
                return Err(NavError::Config(format!("avoidance.{} must be non-zero", name)));
            }
        }

        let d = &self.drive;
        for (name, speed) in [
            ("forward_speed", d.forward_speed),
            ("reverse_speed", d.reverse_speed),
            ("turn_speed", d.turn_speed),
        ] {
            if !(speed > 0.0 && speed <= 1.0) {
                return Err(NavError::Config(format!(
                    "drive.{} must be in (0, 1], got {}",
                    name, speed
                )));
            }
        }

        if self.sensor.sample_interval_ms == 0 {
            return Err(NavError::Config(
                "sensor.sample_interval_ms must be non-zero".to_string(),
            ));
        }
        let s = &self.simulation;
        if s.room_depth_cm < 5.0 || s.start_distance_cm <= 0.0 {
            return Err(NavError::Config(format!(
                "simulation.room_depth_cm ({}) must be at least 5 and start_distance_cm ({}) positive",
                s.room_depth_cm, s.start_distance_cm
            )));
        }
        if !(0.0..=1.0).contains(&s.dropout_rate) {
            return Err(NavError::Config(format!(
                "simulation.dropout_rate must be in [0, 1], got {}",
                s.dropout_rate
            )));
        }

        if self.sensor.model != "gp2y0a41sk0f" {
            return Err(NavError::Config(format!(
                "unsupported sensor model: {}",
                self.sensor.model
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = NavConfig::default();
        assert_eq!(config.avoidance.min_proximity_cm, 8.0);
        assert_eq!(config.avoidance.backup_duration(), Duration::from_millis(650));
        assert_eq!(config.avoidance.turn_duration(), Duration::from_millis(1000));
        assert_eq!(config.avoidance.max_recent_turns, 3);
        assert_eq!(config.drive.left_forward, Rotation::Cw);
        assert_eq!(config.drive.right_forward, Rotation::Ccw);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let toml_content = r#"
[avoidance]
min_proximity_cm = 12.0
turn_ms = 800

[drive]
right_forward = "cw"
"#;

        let config: NavConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.avoidance.min_proximity_cm, 12.0);
        assert_eq!(config.avoidance.turn_ms, 800);
        assert_eq!(config.avoidance.backup_ms, 650);
        assert_eq!(config.drive.right_forward, Rotation::Cw);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sensor]\nsample_interval_ms = 50\n\n[logging]\nlevel = \"debug\"").unwrap();

        let config = NavConfig::load(file.path()).unwrap();
        assert_eq!(config.sensor.sample_interval(), Duration::from_millis(50));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_rejects_bad_thresholds() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[avoidance]\nmin_proximity_cm = 30.0\nmax_proximity_cm = 25.0").unwrap();

        let err = NavConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, NavError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_nan_threshold() {
        let mut config = NavConfig::default();
        config.avoidance.min_proximity_cm = f32::NAN;
        assert!(matches!(config.validate(), Err(NavError::Config(_))));

        config.avoidance.min_proximity_cm = 8.0;
        config.avoidance.max_proximity_cm = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_turn_log() {
        let mut config = NavConfig::default();
        config.avoidance.max_recent_turns = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_speed_out_of_range() {
        let mut config = NavConfig::default();
        config.drive.turn_speed = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_simulation() {
        let mut config = NavConfig::default();
        config.simulation.dropout_rate = 1.5;
        assert!(config.validate().is_err());

        let mut config = NavConfig::default();
        config.simulation.room_depth_cm = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shipped_config_is_defaults() {
        let config: NavConfig = toml::from_str(include_str!("../billi.toml")).unwrap();
        let defaults = NavConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.avoidance.backup_ms, defaults.avoidance.backup_ms);
        assert_eq!(config.avoidance.recording_ms, defaults.avoidance.recording_ms);
        assert_eq!(config.drive.reverse_speed, defaults.drive.reverse_speed);
        assert_eq!(config.simulation.room_depth_cm, defaults.simulation.room_depth_cm);
        assert_eq!(config.sensor.model, defaults.sensor.model);
    }

    #[test]
    fn test_malformed_toml() {
        let err = toml::from_str::<NavConfig>("[avoidance\nturn_ms = ").unwrap_err();
        let nav: NavError = err.into();
        assert!(matches!(nav, NavError::Config(_)));
    }
}
