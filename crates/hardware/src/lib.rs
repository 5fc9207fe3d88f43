//! Sensor drivers and actuator adapters for the station.
//!
//! [`build`] assembles the sensor reader and the buzzer/LED handles for the
//! configured [`Backend`]. The simulated backend works everywhere; the
//! Raspberry Pi backend needs the `rpi` feature.

use std::path::PathBuf;

use envmon_core::hardware::{HardwareError, OutputPin, TonePin};
use envmon_core::sensor::{SensorReader, StationSensors};

#[cfg(feature = "rpi")]
pub mod apds9930;
#[cfg(feature = "rpi")]
pub mod gpio;
pub mod iio;
pub mod sim;

/// Which hardware the station talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Simulated,
    RaspberryPi,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulated" | "sim" => Ok(Backend::Simulated),
            "rpi" | "raspberry-pi" => Ok(Backend::RaspberryPi),
            other => Err(format!("unknown hardware backend '{other}'")),
        }
    }
}

/// Pin assignments and device locations.
#[derive(Debug, Clone)]
pub struct HardwareConfig {
    pub backend: Backend,
    /// IIO device directory exposed by the `dht11` kernel driver.
    pub dht_iio_device: PathBuf,
    pub light_i2c_bus: u8,
    /// BCM pin numbers.
    pub buzzer_pin: u8,
    pub led_pin: u8,
}

/// Everything the station needs from the board.
pub struct Hardware {
    pub sensors: Box<dyn SensorReader>,
    pub buzzer: Box<dyn TonePin>,
    pub led: Box<dyn OutputPin>,
}

/// Open the configured backend.
pub fn build(config: &HardwareConfig) -> Result<Hardware, HardwareError> {
    match config.backend {
        Backend::Simulated => {
            tracing::info!("Using simulated sensors and actuators");
            Ok(Hardware {
                sensors: Box::new(StationSensors::new(
                    Box::new(sim::SimulatedClimate::new()),
                    Box::new(sim::SimulatedLight::new()),
                )),
                buzzer: Box::new(sim::SimulatedPin::new("buzzer")),
                led: Box::new(sim::SimulatedPin::new("led")),
            })
        }
        Backend::RaspberryPi => build_rpi(config),
    }
}

#[cfg(feature = "rpi")]
fn build_rpi(config: &HardwareConfig) -> Result<Hardware, HardwareError> {
    let light = apds9930::Apds9930::open(config.light_i2c_bus)?;
    tracing::info!(bus = config.light_i2c_bus, "APDS9930 light sensor initialized");

    let climate = iio::IioDht11::open(&config.dht_iio_device)?;
    tracing::info!(device = %config.dht_iio_device.display(), "DHT11 sensor initialized");

    let gpio = gpio::open()?;
    let buzzer = gpio::RppalPin::output(&gpio, config.buzzer_pin)?;
    let led = gpio::RppalPin::output(&gpio, config.led_pin)?;
    tracing::info!(
        buzzer_pin = config.buzzer_pin,
        led_pin = config.led_pin,
        "GPIO outputs configured"
    );

    Ok(Hardware {
        sensors: Box::new(StationSensors::new(Box::new(climate), Box::new(light))),
        buzzer: Box::new(buzzer),
        led: Box::new(led),
    })
}

#[cfg(not(feature = "rpi"))]
fn build_rpi(_config: &HardwareConfig) -> Result<Hardware, HardwareError> {
    Err(HardwareError::Unavailable(
        "built without the `rpi` feature".to_string(),
    ))
}
