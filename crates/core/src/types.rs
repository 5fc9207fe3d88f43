use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// `sensor_data` primary keys are SQLite integer row ids.
pub type DbId = i64;

/// Wall-clock format used for reading timestamps (station local time).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One timestamped sample of temperature, humidity and light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: String,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Illuminance, lux.
    pub light: f64,
}

impl Reading {
    /// Build a reading stamped with the given instant.
    pub fn at(at: DateTime<Local>, temperature: f64, humidity: f64, light: f64) -> Self {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            temperature,
            humidity,
            light,
        }
    }

    /// Build a reading stamped with the current local time.
    pub fn now(temperature: f64, humidity: f64, light: f64) -> Self {
        Self::at(Local::now(), temperature, humidity, light)
    }
}
