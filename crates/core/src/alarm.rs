//! Buzzer/LED alarm state machine.
//!
//! ```text
//!            evaluation violated
//!   Idle ─────────────────────────▶ Alarming
//!     ▲                                │
//!     └────────────────────────────────┘
//!      evaluation passed, or stop()
//! ```
//!
//! [`AlarmController`] owns the actuator handles and the only copy of the
//! alarm state. The diagnostic pattern ([`AlarmController::spawn_pattern`])
//! borrows the same handles, so there is a single source of truth for what
//! the buzzer and LED are doing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::CoreError;
use crate::hardware::{HardwareError, Level, OutputPin, TonePin, TONE_DUTY_CYCLE, TONE_FREQUENCY_HZ};
use crate::thresholds::Evaluation;

/// How long the diagnostic pattern sounds the buzzer.
pub const PATTERN_BUZZ_DURATION: Duration = Duration::from_secs(3);

/// Number of LED blinks in the diagnostic pattern.
pub const PATTERN_BLINK_COUNT: usize = 3;

/// LED on (and off) time per blink.
pub const PATTERN_BLINK_INTERVAL: Duration = Duration::from_millis(500);

/// Whether the continuous alarm is sounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    Idle,
    Alarming,
}

impl AlarmState {
    pub fn is_active(self) -> bool {
        self == AlarmState::Alarming
    }

    /// Dashboard rendering of the buzzer line.
    pub fn buzzer_label(self) -> &'static str {
        match self {
            AlarmState::Idle => "OFF",
            AlarmState::Alarming => "ON",
        }
    }
}

/// Outcome of feeding an evaluation or a stop request to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Stopped,
    Unchanged,
}

/// Consistent view of the controller for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlarmStatus {
    pub state: AlarmState,
    /// Predicates of the most recent evaluation (all false before the first).
    pub evaluation: Evaluation,
}

struct Actuators {
    state: AlarmState,
    last_evaluation: Evaluation,
    buzzer: Box<dyn TonePin>,
    led: Box<dyn OutputPin>,
    /// Level that makes the buzzer sound; the opposite level silences it.
    buzzer_active: Level,
}

impl Actuators {
    fn sound_buzzer(&mut self) -> Result<(), HardwareError> {
        self.buzzer.write(self.buzzer_active)?;
        self.buzzer.start_tone(TONE_FREQUENCY_HZ, TONE_DUTY_CYCLE)
    }

    fn silence_buzzer(&mut self) -> Result<(), HardwareError> {
        let stopped = self.buzzer.stop_tone();
        // The inactive level is asserted even when stopping the tone failed.
        self.buzzer.write(self.buzzer_active.inverted())?;
        stopped
    }

    fn start(&mut self) -> Transition {
        if self.state == AlarmState::Alarming {
            return Transition::Unchanged;
        }
        self.state = AlarmState::Alarming;
        if let Err(e) = self.sound_buzzer() {
            tracing::error!(error = %e, "Failed to sound buzzer");
        }
        Transition::Started
    }

    fn stop(&mut self) -> Transition {
        let was = self.state;
        self.state = AlarmState::Idle;
        if let Err(e) = self.silence_buzzer() {
            tracing::error!(error = %e, "Failed to silence buzzer");
        }
        if was == AlarmState::Alarming {
            tracing::info!("Buzzer silenced");
            Transition::Stopped
        } else {
            Transition::Unchanged
        }
    }

    /// Bring the buzzer back in line with the state machine.
    fn restore_buzzer(&mut self) -> Result<(), HardwareError> {
        match self.state {
            AlarmState::Alarming => self.sound_buzzer(),
            AlarmState::Idle => self.silence_buzzer(),
        }
    }

    /// Restore the buzzer and turn the LED off, attempting both.
    fn reset_after_pattern(&mut self) -> Result<(), HardwareError> {
        let buzzer = self.restore_buzzer();
        let led = self.led.write(Level::Low);
        buzzer.and(led)
    }
}

/// Owns the buzzer/LED and the alarm state.
pub struct AlarmController {
    inner: Mutex<Actuators>,
    pattern_running: AtomicBool,
}

impl AlarmController {
    /// Take ownership of the actuators and drive the buzzer to its inactive
    /// level.
    pub fn new(buzzer: Box<dyn TonePin>, led: Box<dyn OutputPin>, buzzer_active: Level) -> Self {
        let mut actuators = Actuators {
            state: AlarmState::Idle,
            last_evaluation: Evaluation::default(),
            buzzer,
            led,
            buzzer_active,
        };
        if let Err(e) = actuators.silence_buzzer() {
            tracing::error!(error = %e, "Failed to initialise buzzer to silent");
        }
        if let Err(e) = actuators.led.write(Level::Low) {
            tracing::error!(error = %e, "Failed to initialise LED");
        }
        Self {
            inner: Mutex::new(actuators),
            pattern_running: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Actuators> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> AlarmState {
        self.lock().state
    }

    pub fn status(&self) -> AlarmStatus {
        let guard = self.lock();
        AlarmStatus {
            state: guard.state,
            evaluation: guard.last_evaluation,
        }
    }

    /// Run `evaluate` under the controller lock and apply its outcome.
    ///
    /// Holding the lock while the caller snapshots thresholds is what keeps a
    /// concurrent [`silence_after`](Self::silence_after) from being undone by
    /// an evaluation against the old thresholds.
    pub fn drive(&self, evaluate: impl FnOnce() -> Evaluation) -> (Evaluation, Transition) {
        let mut guard = self.lock();
        let evaluation = evaluate();
        guard.last_evaluation = evaluation;
        let transition = if evaluation.violated() {
            guard.start()
        } else if guard.state == AlarmState::Alarming {
            guard.stop()
        } else {
            Transition::Unchanged
        };
        (evaluation, transition)
    }

    /// Silence the alarm. Idempotent: while idle the inactive level is
    /// re-asserted and [`Transition::Unchanged`] is returned.
    pub fn stop(&self) -> Transition {
        self.lock().stop()
    }

    /// Run `f` under the controller lock and, if it succeeds, stop the alarm.
    pub fn silence_after<T, E>(
        &self,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<(T, Transition), E> {
        let mut guard = self.lock();
        let value = f()?;
        Ok((value, guard.stop()))
    }

    pub fn pattern_running(&self) -> bool {
        self.pattern_running.load(Ordering::SeqCst)
    }

    /// Start the one-shot diagnostic pattern on a background task.
    ///
    /// Sounds the buzzer for [`PATTERN_BUZZ_DURATION`], then blinks the LED
    /// [`PATTERN_BLINK_COUNT`] times. The alarm state is never changed.
    /// Returns [`CoreError::Conflict`] if a pattern is already running.
    pub fn spawn_pattern(self: &Arc<Self>) -> Result<JoinHandle<()>, CoreError> {
        if self
            .pattern_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CoreError::Conflict(
                "Alarm pattern is already running".to_string(),
            ));
        }

        let controller = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let _running = PatternGuard(&controller.pattern_running);
            tracing::info!("Triggering alarm pattern");
            if let Err(e) = controller.run_pattern().await {
                tracing::error!(error = %e, "Alarm pattern failed");
                if let Err(e) = controller.lock().reset_after_pattern() {
                    tracing::error!(error = %e, "Failed to reset actuators after pattern");
                }
            }
        }))
    }

    async fn run_pattern(&self) -> Result<(), HardwareError> {
        self.lock().sound_buzzer()?;
        tokio::time::sleep(PATTERN_BUZZ_DURATION).await;
        self.lock().restore_buzzer()?;

        for _ in 0..PATTERN_BLINK_COUNT {
            self.lock().led.write(Level::High)?;
            tokio::time::sleep(PATTERN_BLINK_INTERVAL).await;
            self.lock().led.write(Level::Low)?;
            tokio::time::sleep(PATTERN_BLINK_INTERVAL).await;
        }
        Ok(())
    }
}

/// Clears the running flag when the pattern task ends, however it ends.
struct PatternGuard<'a>(&'a AtomicBool);

impl Drop for PatternGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::test_support::{PinEvent, RecordingPin};

    fn violated() -> Evaluation {
        Evaluation {
            temperature: true,
            humidity: false,
            light: false,
        }
    }

    fn controller() -> (AlarmController, RecordingPin, RecordingPin) {
        let buzzer = RecordingPin::new();
        let led = RecordingPin::new();
        let alarm = AlarmController::new(
            Box::new(buzzer.clone()),
            Box::new(led.clone()),
            Level::Low,
        );
        buzzer.clear();
        led.clear();
        (alarm, buzzer, led)
    }

    #[test]
    fn construction_silences_active_low_buzzer() {
        let buzzer = RecordingPin::new();
        let led = RecordingPin::new();
        let _alarm = AlarmController::new(
            Box::new(buzzer.clone()),
            Box::new(led.clone()),
            Level::Low,
        );
        assert_eq!(buzzer.level(), Level::High);
        assert!(!buzzer.tone_on());
        assert_eq!(led.level(), Level::Low);
    }

    #[test]
    fn violation_starts_tone_once() {
        let (alarm, buzzer, _led) = controller();

        let (_, first) = alarm.drive(violated);
        let (_, second) = alarm.drive(violated);

        assert_eq!(first, Transition::Started);
        assert_eq!(second, Transition::Unchanged);
        assert_eq!(alarm.state(), AlarmState::Alarming);
        assert_eq!(buzzer.level(), Level::Low);
        assert!(buzzer.tone_on());
        let starts = buzzer
            .events()
            .iter()
            .filter(|e| matches!(e, PinEvent::ToneStarted { .. }))
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn passing_evaluation_stops_alarm() {
        let (alarm, buzzer, _led) = controller();
        alarm.drive(violated);

        let (eval, transition) = alarm.drive(Evaluation::default);

        assert!(!eval.violated());
        assert_eq!(transition, Transition::Stopped);
        assert_eq!(alarm.state(), AlarmState::Idle);
        assert!(!buzzer.tone_on());
        assert_eq!(buzzer.level(), Level::High);
    }

    #[test]
    fn stop_twice_is_idempotent() {
        let (alarm, buzzer, _led) = controller();
        alarm.drive(violated);

        assert_eq!(alarm.stop(), Transition::Stopped);
        assert_eq!(alarm.stop(), Transition::Unchanged);
        assert_eq!(alarm.state(), AlarmState::Idle);
        assert_eq!(buzzer.level(), Level::High);
    }

    #[test]
    fn status_retains_predicates() {
        let (alarm, _buzzer, _led) = controller();
        assert_eq!(alarm.status().evaluation, Evaluation::default());

        alarm.drive(|| Evaluation {
            temperature: false,
            humidity: true,
            light: true,
        });

        let status = alarm.status();
        assert_eq!(status.state, AlarmState::Alarming);
        assert!(status.evaluation.humidity);
        assert!(status.evaluation.light);
        assert!(!status.evaluation.temperature);
    }

    #[test]
    fn silence_after_only_stops_on_success() {
        let (alarm, _buzzer, _led) = controller();
        alarm.drive(violated);

        let failed: Result<((), Transition), &str> = alarm.silence_after(|| Err("rejected"));
        assert!(failed.is_err());
        assert_eq!(alarm.state(), AlarmState::Alarming);

        let ok: Result<(u8, Transition), &str> = alarm.silence_after(|| Ok(7));
        assert_eq!(ok, Ok((7, Transition::Stopped)));
        assert_eq!(alarm.state(), AlarmState::Idle);
    }

    #[test]
    fn actuator_failure_still_transitions() {
        let (alarm, buzzer, _led) = controller();
        buzzer.fail_writes(true);

        let (_, transition) = alarm.drive(violated);

        assert_eq!(transition, Transition::Started);
        assert_eq!(alarm.state(), AlarmState::Alarming);
    }

    #[tokio::test(start_paused = true)]
    async fn pattern_buzzes_then_blinks_without_changing_state() {
        let (alarm, buzzer, led) = controller();
        let alarm = Arc::new(alarm);

        let handle = alarm.spawn_pattern().unwrap();
        assert!(alarm.pattern_running());
        handle.await.unwrap();

        assert!(!alarm.pattern_running());
        assert_eq!(alarm.state(), AlarmState::Idle);
        assert!(!buzzer.tone_on());
        assert_eq!(buzzer.level(), Level::High);

        let highs = led
            .events()
            .iter()
            .filter(|e| **e == PinEvent::Write(Level::High))
            .count();
        assert_eq!(highs, PATTERN_BLINK_COUNT);
        assert_eq!(led.level(), Level::Low);
    }

    #[tokio::test(start_paused = true)]
    async fn pattern_keeps_continuous_alarm_sounding() {
        let (alarm, buzzer, _led) = controller();
        let alarm = Arc::new(alarm);
        alarm.drive(violated);

        alarm.spawn_pattern().unwrap().await.unwrap();

        assert_eq!(alarm.state(), AlarmState::Alarming);
        assert!(buzzer.tone_on());
        assert_eq!(buzzer.level(), Level::Low);
    }

    #[tokio::test(start_paused = true)]
    async fn second_pattern_is_rejected_while_running() {
        let (alarm, _buzzer, _led) = controller();
        let alarm = Arc::new(alarm);

        let handle = alarm.spawn_pattern().unwrap();
        assert_matches!(alarm.spawn_pattern(), Err(CoreError::Conflict(_)));
        handle.await.unwrap();

        let again = alarm.spawn_pattern().unwrap();
        again.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn pattern_failure_is_contained() {
        let (alarm, _buzzer, led) = controller();
        let alarm = Arc::new(alarm);
        led.fail_writes(true);

        alarm.spawn_pattern().unwrap().await.unwrap();

        assert!(!alarm.pattern_running());
        assert_eq!(alarm.state(), AlarmState::Idle);
    }

    #[test]
    fn reset_after_pattern_reports_led_failure_and_still_restores_buzzer() {
        let (alarm, buzzer, led) = controller();
        led.fail_writes(true);

        let result = alarm.lock().reset_after_pattern();

        assert_matches!(result, Err(HardwareError::Gpio(_)));
        assert!(!buzzer.tone_on());
        assert_eq!(
            buzzer.events(),
            vec![PinEvent::ToneStopped, PinEvent::Write(Level::High)]
        );
    }
}
