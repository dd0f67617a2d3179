//! BilliNav - Obstacle-avoidance controller daemon
//!
//! Drives forward, backs away from anything the IR ranger sees too close,
//! and looks both ways when it seems to be cornered. Listens on the message
//! bus for manual turn requests and shutdown notices.
//!
//! Without hardware attached the daemon runs against mock wheels and a
//! simulated ranger (`[simulation] enabled = true`).

use billi_nav::config::NavConfig;
use billi_nav::error::{NavError, Result};
use billi_nav::sensor::SimulatedRange;
use billi_nav::{ChannelBus, Message, MessageBus, MockWheels, NavigationService, RandomCoin};

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Config file picked up from the working directory when no path is given
const DEFAULT_CONFIG: &str = "billi.toml";

/// Time between publishing SHUTTING_DOWN and stopping the loop, so the
/// notice reaches the navigator before it exits
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// Parse config path from command line arguments.
///
/// Supports:
/// - `billi-nav <path>` (positional)
/// - `billi-nav --config <path>` (flag-based)
/// - `billi-nav -c <path>` (short flag)
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    None
}

fn load_config() -> Result<(NavConfig, String)> {
    if let Some(path) = parse_config_path() {
        let config = NavConfig::load(Path::new(&path))?;
        return Ok((config, path));
    }
    if Path::new(DEFAULT_CONFIG).exists() {
        let config = NavConfig::load(Path::new(DEFAULT_CONFIG))?;
        return Ok((config, DEFAULT_CONFIG.to_string()));
    }
    Ok((NavConfig::default(), "built-in defaults".to_string()))
}

fn main() -> Result<()> {
    let (config, source) = load_config()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("billi_nav={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("BilliNav v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", source);
    info!(
        "Obstacle threshold {:.1}cm, backup {}ms, turn {}ms",
        config.avoidance.min_proximity_cm, config.avoidance.backup_ms, config.avoidance.turn_ms
    );

    if !config.simulation.enabled {
        return Err(NavError::Config(
            "no hardware backend available, set [simulation] enabled = true".to_string(),
        ));
    }

    let bus = ChannelBus::new();
    let wheels = MockWheels::with_calibration(config.drive.left_forward, config.drive.right_forward);
    let running = Arc::new(AtomicBool::new(true));

    // Set up shutdown signal handler
    let handler_bus = bus.clone();
    let handler_running = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        if let Err(e) = handler_bus.publish(Message::ShuttingDown) {
            warn!("Failed to announce shutdown: {}", e);
        }
        std::thread::sleep(SHUTDOWN_GRACE);
        handler_running.store(false, Ordering::Relaxed);
    })
    .map_err(|e| NavError::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    // Sensor
    let (proximity_tx, proximity_rx) = crossbeam_channel::bounded(16);
    let sensor = SimulatedRange::new(
        &config.simulation,
        config.sensor.sample_interval(),
        wheels.clone(),
    );
    let sensor_handle = sensor.spawn(proximity_tx, Arc::clone(&running))?;

    let mut service = NavigationService::new(
        &config,
        Box::new(bus.clone()),
        Box::new(wheels),
        Box::new(RandomCoin::new(config.avoidance.random_seed)),
        proximity_rx,
    );

    let result = service.startup().and_then(|_| service.run(&running));
    if let Err(e) = &result {
        error!("Navigation service failed: {}", e);
    }

    // Dropping the service hangs up the sensor channel
    running.store(false, Ordering::Relaxed);
    drop(service);
    if sensor_handle.join().is_err() {
        error!("Sensor thread panicked");
    }

    bus.close();
    info!("BilliNav finished");
    result
}
