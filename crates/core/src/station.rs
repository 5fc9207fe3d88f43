//! Shared station state handed to the sampling loop and the HTTP handlers.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::alarm::{AlarmController, AlarmStatus, Transition};
use crate::error::CoreError;
use crate::thresholds::{evaluate, Evaluation, ThresholdStore, ThresholdUpdate, Thresholds};
use crate::types::Reading;

/// Thresholds plus the alarm they drive.
///
/// Evaluation and threshold updates both run under the alarm controller's
/// lock (alarm first, thresholds second), so they never interleave.
pub struct Station {
    thresholds: ThresholdStore,
    alarm: Arc<AlarmController>,
}

impl Station {
    pub fn new(initial: Thresholds, alarm: AlarmController) -> Self {
        Self {
            thresholds: ThresholdStore::new(initial),
            alarm: Arc::new(alarm),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds.get()
    }

    pub fn alarm_status(&self) -> AlarmStatus {
        self.alarm.status()
    }

    /// Evaluate a fresh reading against the current thresholds and drive the
    /// alarm accordingly.
    pub fn evaluate(&self, reading: &Reading) -> (Evaluation, Transition) {
        let (evaluation, transition) = self
            .alarm
            .drive(|| evaluate(reading, &self.thresholds.get()));

        match transition {
            Transition::Started => tracing::warn!(
                temperature = reading.temperature,
                humidity = reading.humidity,
                light = reading.light,
                ?evaluation,
                "Alarm triggered"
            ),
            Transition::Stopped => tracing::info!("Readings back within thresholds"),
            Transition::Unchanged => {}
        }
        (evaluation, transition)
    }

    /// Apply a partial threshold update and silence the alarm.
    ///
    /// The alarm is silenced even if the new thresholds are still violated;
    /// the next sampling cycle re-arms it.
    pub fn update_thresholds(&self, update: &ThresholdUpdate) -> Result<Thresholds, CoreError> {
        let (thresholds, _) = self
            .alarm
            .silence_after(|| self.thresholds.set(update))?;
        tracing::info!(
            temperature_high = thresholds.temperature_high,
            humidity_high = thresholds.humidity_high,
            light_low = thresholds.light_low,
            "Updated thresholds"
        );
        Ok(thresholds)
    }

    /// External silence request.
    pub fn silence(&self) -> Transition {
        self.alarm.stop()
    }

    /// Fire the diagnostic buzzer/LED pattern.
    pub fn trigger_alarm_pattern(&self) -> Result<JoinHandle<()>, CoreError> {
        self.alarm.spawn_pattern()
    }
}
