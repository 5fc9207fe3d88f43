//! Recording actuator double shared by the unit tests in this crate.

use std::sync::{Arc, Mutex};

use crate::hardware::{HardwareError, Level, OutputPin, TonePin};

#[derive(Debug, Clone, PartialEq)]
pub enum PinEvent {
    Write(Level),
    ToneStarted { frequency_hz: f64, duty_cycle: f64 },
    ToneStopped,
}

#[derive(Debug)]
struct PinLog {
    level: Level,
    tone_on: bool,
    fail_writes: bool,
    events: Vec<PinEvent>,
}

/// Clones share the same log, so a test keeps one handle while the
/// controller owns the other.
#[derive(Debug, Clone)]
pub struct RecordingPin {
    log: Arc<Mutex<PinLog>>,
}

impl RecordingPin {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(PinLog {
                level: Level::Low,
                tone_on: false,
                fail_writes: false,
                events: Vec::new(),
            })),
        }
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().events.clear();
    }

    pub fn events(&self) -> Vec<PinEvent> {
        self.log.lock().unwrap().events.clone()
    }

    pub fn tone_on(&self) -> bool {
        self.log.lock().unwrap().tone_on
    }

    pub fn fail_writes(&self, fail: bool) {
        self.log.lock().unwrap().fail_writes = fail;
    }
}

impl OutputPin for RecordingPin {
    fn write(&mut self, level: Level) -> Result<(), HardwareError> {
        let mut log = self.log.lock().unwrap();
        if log.fail_writes {
            return Err(HardwareError::Gpio("injected write failure".into()));
        }
        log.level = level;
        log.events.push(PinEvent::Write(level));
        Ok(())
    }

    fn level(&self) -> Level {
        self.log.lock().unwrap().level
    }
}

impl TonePin for RecordingPin {
    fn start_tone(&mut self, frequency_hz: f64, duty_cycle: f64) -> Result<(), HardwareError> {
        let mut log = self.log.lock().unwrap();
        log.tone_on = true;
        log.events.push(PinEvent::ToneStarted {
            frequency_hz,
            duty_cycle,
        });
        Ok(())
    }

    fn stop_tone(&mut self) -> Result<(), HardwareError> {
        let mut log = self.log.lock().unwrap();
        log.tone_on = false;
        log.events.push(PinEvent::ToneStopped);
        Ok(())
    }
}
