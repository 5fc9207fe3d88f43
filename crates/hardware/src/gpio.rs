//! Raspberry Pi GPIO outputs via `rppal`.

use envmon_core::hardware::{HardwareError, Level, OutputPin, TonePin};
use rppal::gpio::Gpio;

pub fn open() -> Result<Gpio, HardwareError> {
    Gpio::new().map_err(|e| HardwareError::Gpio(e.to_string()))
}

/// A BCM pin configured as output. Software PWM carries the buzzer tone.
pub struct RppalPin {
    pin: rppal::gpio::OutputPin,
}

impl RppalPin {
    pub fn output(gpio: &Gpio, bcm: u8) -> Result<Self, HardwareError> {
        let mut pin = gpio
            .get(bcm)
            .map_err(|e| HardwareError::Gpio(format!("pin {bcm}: {e}")))?
            .into_output();
        // Leave the line where the alarm controller put it on shutdown.
        pin.set_reset_on_drop(false);
        Ok(Self { pin })
    }
}

impl OutputPin for RppalPin {
    fn write(&mut self, level: Level) -> Result<(), HardwareError> {
        match level {
            Level::High => self.pin.set_high(),
            Level::Low => self.pin.set_low(),
        }
        Ok(())
    }

    fn level(&self) -> Level {
        if self.pin.is_set_high() {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl TonePin for RppalPin {
    fn start_tone(&mut self, frequency_hz: f64, duty_cycle: f64) -> Result<(), HardwareError> {
        self.pin
            .set_pwm_frequency(frequency_hz, duty_cycle)
            .map_err(|e| HardwareError::Gpio(e.to_string()))
    }

    fn stop_tone(&mut self) -> Result<(), HardwareError> {
        self.pin
            .clear_pwm()
            .map_err(|e| HardwareError::Gpio(e.to_string()))
    }
}
