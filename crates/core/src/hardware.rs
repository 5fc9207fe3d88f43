//! Actuator capability traits.
//!
//! The alarm logic only ever sees these traits. `envmon-hardware` provides
//! the Raspberry Pi GPIO implementation and a simulated one; tests use
//! recording doubles.

/// Logic level of a digital output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Errors from actuator or driver I/O.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    #[error("GPIO error: {0}")]
    Gpio(String),

    #[error("I2C error: {0}")]
    I2c(String),

    #[error("Hardware unavailable: {0}")]
    Unavailable(String),
}

/// A digital output line.
pub trait OutputPin: Send {
    fn write(&mut self, level: Level) -> Result<(), HardwareError>;

    /// The level last driven onto the line.
    fn level(&self) -> Level;
}

/// An output line that can also carry a PWM tone (the buzzer).
pub trait TonePin: OutputPin {
    fn start_tone(&mut self, frequency_hz: f64, duty_cycle: f64) -> Result<(), HardwareError>;

    fn stop_tone(&mut self) -> Result<(), HardwareError>;
}

/// Buzzer tone frequency while the alarm sounds.
pub const TONE_FREQUENCY_HZ: f64 = 1000.0;

/// Buzzer PWM duty cycle while the alarm sounds (0.0 – 1.0).
pub const TONE_DUTY_CYCLE: f64 = 0.5;
