//! Sensor capability traits and the composite station reader.

use crate::types::Reading;

/// Why a sensor read produced no usable sample.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The device answered but the frame failed validation (DHT checksum).
    #[error("Invalid sensor data: {0}")]
    InvalidData(String),

    /// The device could not be talked to.
    #[error("Sensor I/O error: {0}")]
    Io(String),

    /// The read did not finish within the allotted time.
    #[error("Sensor read timed out after {0} ms")]
    Timeout(u64),
}

/// Source of temperature (°C) and relative humidity (%).
pub trait TemperatureHumiditySource: Send {
    fn read_temperature_humidity(&mut self) -> Result<(f64, f64), SensorError>;
}

/// Source of ambient light (lux).
pub trait LightSource: Send {
    fn read_light(&mut self) -> Result<f64, SensorError>;
}

/// One blocking read of every station sensor.
pub trait SensorReader: Send {
    fn read(&mut self) -> Result<Reading, SensorError>;
}

/// Combines a temperature/humidity source with a light source.
///
/// The light sensor is only consulted once the temperature/humidity frame
/// is valid, and its value is rounded to one decimal place.
pub struct StationSensors {
    climate: Box<dyn TemperatureHumiditySource>,
    light: Box<dyn LightSource>,
}

impl StationSensors {
    pub fn new(
        climate: Box<dyn TemperatureHumiditySource>,
        light: Box<dyn LightSource>,
    ) -> Self {
        Self { climate, light }
    }
}

impl SensorReader for StationSensors {
    fn read(&mut self) -> Result<Reading, SensorError> {
        let (temperature, humidity) = self.climate.read_temperature_humidity()?;
        let light = round_tenths(self.light.read_light()?);
        Ok(Reading::now(temperature, humidity, light))
    }
}

/// Round to one decimal place.
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
