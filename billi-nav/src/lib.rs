//! # BilliNav: Obstacle-Avoidance Controller
//!
//! Reactive navigation for a small two-wheel robot with a single forward
//! IR ranger. The robot drives forward until something is closer than a
//! threshold, backs up, turns away and carries on. When it keeps turning in
//! quick succession it assumes it is cornered, looks both ways, and heads
//! toward the side with more room.
//!
//! ## Architecture
//!
//! ```text
//!  IR sensor ──cm──┐                      ┌──▶ Drivetrain ──▶ WheelDriver
//!                  ▼                      │
//!         NavigationService ──▶ Navigator ┤
//!                  ▲    │                 └──▶ notices
//!  MessageBus ─────┘    └──────── publish ◀────────┘
//! ```
//!
//! - [`navigator`]: The state machine; owns all motion state
//! - [`look_around`]: Two-sided probe that picks the clearer heading
//! - [`proximity`]: Look-window averaging of readings
//! - [`turn_log`]: Recent-turn history behind the cornered check
//! - [`drive`]: Wheel actuator trait and mirrored-servo drivetrain
//! - [`bus`]: Message vocabulary and broadcast bus
//! - [`service`]: Single-threaded event loop
//! - [`sensor`]: IR conversion and a simulated ranger
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use billi_nav::{ChannelBus, FixedCoin, MockWheels, NavConfig, NavigationService};
//! use std::sync::atomic::AtomicBool;
//!
//! let (_tx, rx) = crossbeam_channel::unbounded::<f32>();
//! let mut service = NavigationService::new(
//!     &NavConfig::default(),
//!     Box::new(ChannelBus::new()),
//!     Box::new(MockWheels::new()),
//!     Box::new(FixedCoin(true)),
//!     rx,
//! );
//! service.startup()?;
//! service.run(&AtomicBool::new(true))?;
//! # Ok::<(), billi_nav::NavError>(())
//! ```

pub mod bus;
pub mod coin;
pub mod config;
pub mod drive;
pub mod error;
pub mod look_around;
pub mod motion;
pub mod navigator;
pub mod proximity;
pub mod sensor;
pub mod service;
pub mod timer;
pub mod turn_log;

pub use bus::{ChannelBus, Message, MessageBus};
pub use coin::{CoinFlip, FixedCoin, RandomCoin};
pub use config::NavConfig;
pub use drive::mock::{MockWheels, WheelCommand};
pub use drive::{Drivetrain, Rotation, Wheel, WheelDriver};
pub use error::{NavError, Result};
pub use motion::{MotionState, TurnDirection};
pub use navigator::{Navigator, NavigatorStatus};
pub use service::NavigationService;
