//! Row model for the `sensor_data` table.

use envmon_core::types::{DbId, Reading};
use serde::Serialize;
use sqlx::FromRow;

/// A persisted reading.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SensorRecord {
    pub id: DbId,
    pub timestamp: String,
    pub temperature: f64,
    pub humidity: f64,
    pub light: f64,
}

impl SensorRecord {
    pub fn to_reading(&self) -> Reading {
        Reading {
            timestamp: self.timestamp.clone(),
            temperature: self.temperature,
            humidity: self.humidity,
            light: self.light,
        }
    }
}
