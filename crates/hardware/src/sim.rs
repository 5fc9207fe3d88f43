//! Simulated sensors and actuators for running the station off-target.
//!
//! Readings follow a bounded random walk around indoor values, and the
//! climate source occasionally reports a checksum failure the way a real
//! DHT11 does.

use std::sync::{Arc, Mutex};

use envmon_core::hardware::{HardwareError, Level, OutputPin, TonePin};
use envmon_core::sensor::{LightSource, SensorError, TemperatureHumiditySource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Probability that a simulated climate read fails its checksum.
const CHECKSUM_FAILURE_RATE: f64 = 0.05;

fn step(rng: &mut StdRng, value: f64, max_step: f64, min: f64, max: f64) -> f64 {
    (value + rng.random_range(-max_step..=max_step)).clamp(min, max)
}

/// Random-walk temperature/humidity source.
pub struct SimulatedClimate {
    rng: StdRng,
    temperature: f64,
    humidity: f64,
    failure_rate: f64,
}

impl SimulatedClimate {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng(), CHECKSUM_FAILURE_RATE)
    }

    /// Deterministic source for tests.
    pub fn seeded(seed: u64, failure_rate: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), failure_rate)
    }

    fn with_rng(rng: StdRng, failure_rate: f64) -> Self {
        Self {
            rng,
            temperature: 24.0,
            humidity: 55.0,
            failure_rate,
        }
    }
}

impl Default for SimulatedClimate {
    fn default() -> Self {
        Self::new()
    }
}

impl TemperatureHumiditySource for SimulatedClimate {
    fn read_temperature_humidity(&mut self) -> Result<(f64, f64), SensorError> {
        if self.rng.random_bool(self.failure_rate) {
            return Err(SensorError::InvalidData(
                "simulated checksum failure".to_string(),
            ));
        }
        self.temperature = step(&mut self.rng, self.temperature, 0.5, 5.0, 45.0);
        self.humidity = step(&mut self.rng, self.humidity, 1.5, 10.0, 95.0);
        // DHT11 resolution is whole units.
        Ok((self.temperature.round(), self.humidity.round()))
    }
}

/// Random-walk ambient light source.
pub struct SimulatedLight {
    rng: StdRng,
    lux: f64,
}

impl SimulatedLight {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            lux: 180.0,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            lux: 180.0,
        }
    }
}

impl Default for SimulatedLight {
    fn default() -> Self {
        Self::new()
    }
}

impl LightSource for SimulatedLight {
    fn read_light(&mut self) -> Result<f64, SensorError> {
        self.lux = step(&mut self.rng, self.lux, 15.0, 0.0, 1000.0);
        Ok(self.lux)
    }
}

#[derive(Debug)]
struct PinState {
    level: Level,
    tone: Option<(f64, f64)>,
}

/// Output line that only logs what it would do.
///
/// Clones share state, so a caller can keep a handle to observe the line
/// after handing the pin to the alarm controller.
#[derive(Debug, Clone)]
pub struct SimulatedPin {
    name: &'static str,
    state: Arc<Mutex<PinState>>,
}

impl SimulatedPin {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::new(Mutex::new(PinState {
                level: Level::Low,
                tone: None,
            })),
        }
    }

    /// `(frequency_hz, duty_cycle)` of the running tone, if any.
    pub fn tone(&self) -> Option<(f64, f64)> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).tone
    }
}

impl OutputPin for SimulatedPin {
    fn write(&mut self, level: Level) -> Result<(), HardwareError> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).level = level;
        tracing::debug!(pin = self.name, ?level, "Simulated pin write");
        Ok(())
    }

    fn level(&self) -> Level {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).level
    }
}

impl TonePin for SimulatedPin {
    fn start_tone(&mut self, frequency_hz: f64, duty_cycle: f64) -> Result<(), HardwareError> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).tone = Some((frequency_hz, duty_cycle));
        tracing::debug!(pin = self.name, frequency_hz, duty_cycle, "Simulated tone on");
        Ok(())
    }

    fn stop_tone(&mut self) -> Result<(), HardwareError> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).tone = None;
        tracing::debug!(pin = self.name, "Simulated tone off");
        Ok(())
    }
}
