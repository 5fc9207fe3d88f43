//! Periodic sensor sampling.
//!
//! Each cycle reads the sensors on the blocking pool, evaluates the reading
//! against the thresholds (driving the alarm), then appends it to the
//! record store. Cycles never overlap: the next one starts a fixed pause
//! after the previous one finished.

use std::sync::{Arc, Mutex, TryLockError};
use std::time::Duration;

use envmon_core::alarm::Transition;
use envmon_core::sensor::{SensorError, SensorReader};
use envmon_core::station::Station;
use envmon_core::types::Reading;
use envmon_db::RecordStore;
use tokio_util::sync::CancellationToken;

/// Sensor reader shared with the blocking pool.
pub type SharedReader = Arc<Mutex<Box<dyn SensorReader>>>;

/// What a single cycle did.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Reading evaluated and persisted.
    Recorded { id: i64, transition: Transition },
    /// Reading evaluated but the append failed.
    PersistFailed { transition: Transition },
    /// No usable reading; nothing evaluated or stored.
    SensorFailed(SensorError),
}

/// Everything the loop needs, bundled so `main` can hand it over in one go.
pub struct Sampler {
    pub reader: SharedReader,
    pub station: Arc<Station>,
    pub store: Arc<RecordStore>,
    pub interval: Duration,
    pub read_timeout: Duration,
}

impl Sampler {
    pub fn new(
        reader: Box<dyn SensorReader>,
        station: Arc<Station>,
        store: Arc<RecordStore>,
        interval: Duration,
        read_timeout: Duration,
    ) -> Self {
        Self {
            reader: Arc::new(Mutex::new(reader)),
            station,
            store,
            interval,
            read_timeout,
        }
    }

    /// Run the sampling loop until `cancel` is triggered.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs_f64(),
            read_timeout_secs = self.read_timeout.as_secs_f64(),
            "Sampling loop started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.run_cycle() => {
                    if let CycleOutcome::SensorFailed(e) = &outcome {
                        tracing::warn!(error = %e, "Sensor read failed, retrying next cycle");
                    }
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Sampling loop stopping");
    }

    /// One read → evaluate → persist cycle.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let reading = match read_sensors(&self.reader, self.read_timeout).await {
            Ok(reading) => reading,
            Err(e) => return CycleOutcome::SensorFailed(e),
        };

        tracing::info!(
            temperature = reading.temperature,
            humidity = reading.humidity,
            light = reading.light,
            "Collected data"
        );

        // Alarm first; a failed append must not affect it.
        let (_, transition) = self.station.evaluate(&reading);

        match self.store.append(&reading).await {
            Ok(record) => CycleOutcome::Recorded {
                id: record.id,
                transition,
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to save reading");
                CycleOutcome::PersistFailed { transition }
            }
        }
    }
}

/// Read all sensors on the blocking pool, bounded by `timeout`.
///
/// A read that is still running from a previous timed-out cycle makes this
/// one fail immediately instead of queueing behind it.
pub async fn read_sensors(reader: &SharedReader, timeout: Duration) -> Result<Reading, SensorError> {
    let reader = Arc::clone(reader);
    let task = tokio::task::spawn_blocking(move || {
        let mut guard = match reader.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                return Err(SensorError::Io(
                    "previous sensor read still in progress".to_string(),
                ))
            }
        };
        guard.read()
    });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(SensorError::Io(format!("sensor read task failed: {join_err}"))),
        Err(_) => Err(SensorError::Timeout(
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}
