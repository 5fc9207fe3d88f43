//! Domain core of the environmental-monitoring station.
//!
//! Everything in this crate is free of database and HTTP concerns: sensor
//! and actuator capabilities are traits, so the threshold evaluation and the
//! alarm state machine can be exercised against test doubles.

pub mod alarm;
pub mod error;
pub mod hardware;
pub mod sensor;
pub mod station;
pub mod thresholds;
pub mod types;

#[cfg(test)]
mod test_support;
