//! APDS-9930 ambient light sensor over I2C.
//!
//! Only the ALS engine is used. Lux is computed from the CH0 (visible + IR)
//! and CH1 (IR) counts with the coefficients from the datasheet's lux
//! equation for an open-air part.

use std::thread;
use std::time::Duration;

use envmon_core::hardware::HardwareError;
use envmon_core::sensor::{LightSource, SensorError};
use rppal::i2c::I2c;

const ADDRESS: u16 = 0x39;

/// Command bit plus auto-increment protocol.
const CMD_AUTO_INCREMENT: u8 = 0xA0;

const REG_ENABLE: u8 = 0x00;
const REG_ATIME: u8 = 0x01;
const REG_CONTROL: u8 = 0x0F;
const REG_CH0DATAL: u8 = 0x14;
const REG_CH1DATAL: u8 = 0x16;

/// Power on + ALS enable.
const ENABLE_PON_AEN: u8 = 0x03;
/// 256 - 0xDB = 37 integration cycles, about 101 ms.
const ATIME: u8 = 0xDB;
/// ALS gain 1x.
const CONTROL_AGAIN_1X: u8 = 0x00;
const AGAIN: f64 = 1.0;

const GA: f64 = 0.49;
const DF: f64 = 52.0;
const COEF_B: f64 = 1.862;
const COEF_C: f64 = 0.746;
const COEF_D: f64 = 1.291;

pub struct Apds9930 {
    i2c: I2c,
}

impl Apds9930 {
    /// Open the bus, power the sensor up and enable the ALS engine.
    pub fn open(bus: u8) -> Result<Self, HardwareError> {
        let mut i2c = I2c::with_bus(bus).map_err(|e| HardwareError::I2c(e.to_string()))?;
        i2c.set_slave_address(ADDRESS)
            .map_err(|e| HardwareError::I2c(e.to_string()))?;

        let sensor = Self { i2c };
        sensor.write_register(REG_ATIME, ATIME)?;
        sensor.write_register(REG_CONTROL, CONTROL_AGAIN_1X)?;
        sensor.write_register(REG_ENABLE, ENABLE_PON_AEN)?;
        // Give the first integration cycle time to complete.
        thread::sleep(Duration::from_secs(1));
        Ok(sensor)
    }

    fn write_register(&self, register: u8, value: u8) -> Result<(), HardwareError> {
        self.i2c
            .smbus_write_byte(CMD_AUTO_INCREMENT | register, value)
            .map_err(|e| HardwareError::I2c(format!("register {register:#04x}: {e}")))
    }

    fn read_channel(&self, register: u8) -> Result<u16, SensorError> {
        self.i2c
            .smbus_read_word(CMD_AUTO_INCREMENT | register)
            .map_err(|e| SensorError::Io(format!("APDS9930 register {register:#04x}: {e}")))
    }
}

/// Integration time in milliseconds for an ATIME register value.
fn integration_time_ms(atime: u8) -> f64 {
    2.73 * f64::from(256 - u16::from(atime))
}

/// Datasheet lux equation.
pub fn lux(ch0: u16, ch1: u16) -> f64 {
    let ch0 = f64::from(ch0);
    let ch1 = f64::from(ch1);
    let iac1 = ch0 - COEF_B * ch1;
    let iac2 = COEF_C * ch0 - COEF_D * ch1;
    let iac = iac1.max(iac2).max(0.0);
    let lpc = GA * DF / (integration_time_ms(ATIME) * AGAIN);
    iac * lpc
}

impl LightSource for Apds9930 {
    fn read_light(&mut self) -> Result<f64, SensorError> {
        let ch0 = self.read_channel(REG_CH0DATAL)?;
        let ch1 = self.read_channel(REG_CH1DATAL)?;
        Ok(lux(ch0, ch1))
    }
}
