//! Proximity sensor sources.
//!
//! The navigator only ever sees distances in centimeters arriving on a
//! channel; a source owns the conversion from whatever the hardware reports.
//!
//! - [`gp2y0a41`]: ADC conversion for the Sharp IR ranger
//! - [`sim::SimulatedRange`]: Synthetic sensor driven by mock wheel state

pub mod gp2y0a41;
mod noise;
pub mod sim;

pub use sim::SimulatedRange;
