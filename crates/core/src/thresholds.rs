//! Alert thresholds and the evaluation policy.
//!
//! [`evaluate`] is pure: the caller snapshots the thresholds and passes them
//! in together with the reading.

use std::sync::RwLock;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::Reading;

/// Default upper temperature bound, degrees Celsius.
pub const DEFAULT_TEMPERATURE_HIGH: f64 = 35.0;

/// Default upper humidity bound, percent.
pub const DEFAULT_HUMIDITY_HIGH: f64 = 80.0;

/// Default lower light bound, lux.
pub const DEFAULT_LIGHT_LOW: f64 = 30.0;

/// The three boundaries whose violation raises the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub temperature_high: f64,
    pub humidity_high: f64,
    pub light_low: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature_high: DEFAULT_TEMPERATURE_HIGH,
            humidity_high: DEFAULT_HUMIDITY_HIGH,
            light_low: DEFAULT_LIGHT_LOW,
        }
    }
}

/// Partial threshold update. `None` fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdUpdate {
    pub temperature_high: Option<f64>,
    pub humidity_high: Option<f64>,
    pub light_low: Option<f64>,
}

impl ThresholdUpdate {
    pub fn is_empty(&self) -> bool {
        self.temperature_high.is_none() && self.humidity_high.is_none() && self.light_low.is_none()
    }

    /// Reject NaN and infinities; any finite value is accepted.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [
            ("temperature", self.temperature_high),
            ("humidity", self.humidity_high),
            ("light", self.light_low),
        ];
        for (name, value) in fields {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(CoreError::Validation(format!(
                        "{name} threshold must be a finite number"
                    )));
                }
            }
        }
        Ok(())
    }

    fn apply_to(&self, thresholds: &mut Thresholds) {
        if let Some(v) = self.temperature_high {
            thresholds.temperature_high = v;
        }
        if let Some(v) = self.humidity_high {
            thresholds.humidity_high = v;
        }
        if let Some(v) = self.light_low {
            thresholds.light_low = v;
        }
    }
}

/// Process-wide threshold triple.
///
/// Readers always get a whole copy; the lock is never held beyond the copy.
#[derive(Debug, Default)]
pub struct ThresholdStore {
    current: RwLock<Thresholds>,
}

impl ThresholdStore {
    pub fn new(initial: Thresholds) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Atomic snapshot of the current triple.
    pub fn get(&self) -> Thresholds {
        *self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply the provided fields and return the resulting triple.
    ///
    /// Validation happens before the write lock is taken, so a rejected
    /// update leaves every field untouched.
    pub fn set(&self, update: &ThresholdUpdate) -> Result<Thresholds, CoreError> {
        update.validate()?;
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        update.apply_to(&mut guard);
        Ok(*guard)
    }
}

/// Per-predicate outcome of one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    /// `temperature > temperature_high`
    pub temperature: bool,
    /// `humidity > humidity_high`
    pub humidity: bool,
    /// `light < light_low`
    pub light: bool,
}

impl Evaluation {
    /// At least one predicate fired.
    pub fn violated(&self) -> bool {
        self.temperature || self.humidity || self.light
    }
}

/// Compare a reading against a threshold snapshot.
pub fn evaluate(reading: &Reading, thresholds: &Thresholds) -> Evaluation {
    Evaluation {
        temperature: reading.temperature > thresholds.temperature_high,
        humidity: reading.humidity > thresholds.humidity_high,
        light: reading.light < thresholds.light_low,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
