//! DHT11 temperature/humidity through the Linux IIO `dht11` driver.
//!
//! With `dtoverlay=dht11,gpiopin=4` the kernel exposes the sensor as an IIO
//! device. Each attribute read triggers a conversion; values are in milli
//! units. A failed checksum or a missed edge surfaces as `EIO`/`ETIMEDOUT`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use envmon_core::hardware::HardwareError;
use envmon_core::sensor::{SensorError, TemperatureHumiditySource};

const TEMPERATURE_ATTR: &str = "in_temp_input";
const HUMIDITY_ATTR: &str = "in_humidityrelative_input";

const EIO: i32 = 5;
const ETIMEDOUT: i32 = 110;

#[derive(Debug)]
pub struct IioDht11 {
    device: PathBuf,
}

impl IioDht11 {
    /// Bind to an IIO device directory, checking the attributes exist.
    pub fn open(device: &Path) -> Result<Self, HardwareError> {
        for attr in [TEMPERATURE_ATTR, HUMIDITY_ATTR] {
            if !device.join(attr).exists() {
                return Err(HardwareError::Unavailable(format!(
                    "{} has no {attr} attribute",
                    device.display()
                )));
            }
        }
        Ok(Self {
            device: device.to_path_buf(),
        })
    }

    fn read_milli(&self, attr: &str) -> Result<f64, SensorError> {
        let raw = fs::read_to_string(self.device.join(attr)).map_err(classify_io_error)?;
        let milli: i64 = raw
            .trim()
            .parse()
            .map_err(|_| SensorError::InvalidData(format!("{attr}: unparsable value {raw:?}")))?;
        Ok(milli as f64 / 1000.0)
    }
}

/// The driver reports bad frames as I/O errors; keep them distinguishable
/// from the device being absent.
fn classify_io_error(err: io::Error) -> SensorError {
    match err.raw_os_error() {
        Some(EIO) | Some(ETIMEDOUT) => {
            SensorError::InvalidData(format!("DHT11 frame rejected: {err}"))
        }
        _ => SensorError::Io(err.to_string()),
    }
}

impl TemperatureHumiditySource for IioDht11 {
    fn read_temperature_humidity(&mut self) -> Result<(f64, f64), SensorError> {
        let temperature = self.read_milli(TEMPERATURE_ATTR)?;
        let humidity = self.read_milli(HUMIDITY_ATTR)?;
        Ok((temperature, humidity))
    }
}
