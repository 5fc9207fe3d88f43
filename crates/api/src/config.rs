use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use envmon_core::hardware::Level;
use envmon_core::thresholds::Thresholds;
use envmon_hardware::{Backend, HardwareConfig};
use envmon_report::{ReportClientConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

/// A configuration value that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{var} has an invalid value '{value}': {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for a bench setup with simulated
/// hardware. On the station, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// SQLite database URL (default: `sqlite://data.db`).
    pub database_url: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`).
    pub request_timeout_secs: u64,
    /// Pause between sampling cycles.
    pub sampling_interval: Duration,
    /// Upper bound on a single sensor read.
    pub sensor_read_timeout: Duration,
    pub hardware: HardwareConfig,
    /// Level that makes the buzzer sound.
    pub buzzer_active: Level,
    /// Start-up thresholds; reset on every restart.
    pub thresholds: Thresholds,
    pub report: ReportClientConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                                  |
    /// |------------------------------|------------------------------------------|
    /// | `HOST`                       | `0.0.0.0`                                |
    /// | `PORT`                       | `5000`                                   |
    /// | `DATABASE_URL`               | `sqlite://data.db`                       |
    /// | `CORS_ORIGINS`               | `http://localhost:5000`                  |
    /// | `REQUEST_TIMEOUT_SECS`       | `60`                                     |
    /// | `SAMPLING_INTERVAL_SECS`     | `2`                                      |
    /// | `SENSOR_READ_TIMEOUT_SECS`   | `5`                                      |
    /// | `HARDWARE`                   | `simulated`                              |
    /// | `DHT_IIO_DEVICE`             | `/sys/bus/iio/devices/iio:device0`       |
    /// | `LIGHT_I2C_BUS`              | `1`                                      |
    /// | `BUZZER_PIN`                 | `19`                                     |
    /// | `LED_PIN`                    | `18`                                     |
    /// | `BUZZER_ACTIVE_LOW`          | `true`                                   |
    /// | `THRESHOLD_TEMPERATURE_HIGH` | `35`                                     |
    /// | `THRESHOLD_HUMIDITY_HIGH`    | `80`                                     |
    /// | `THRESHOLD_LIGHT_LOW`        | `30`                                     |
    /// | `REPORT_API_KEY`             | unset (reports disabled)                 |
    /// | `REPORT_BASE_URL`            | Gemini OpenAI-compatible endpoint        |
    /// | `REPORT_MODEL`               | `gemini-2.0-flash`                       |
    /// | `REPORT_LANGUAGE`            | `English`                                |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads from an arbitrary source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("HOST", "0.0.0.0");
        let port: u16 = parse("PORT", var("PORT", "5000"))?;
        let database_url = var("DATABASE_URL", "sqlite://data.db");

        let cors_origins = parse_origins(var("CORS_ORIGINS", "http://localhost:5000"))?;

        let request_timeout_secs =
            parse_positive("REQUEST_TIMEOUT_SECS", var("REQUEST_TIMEOUT_SECS", "60"))?;
        let sampling_interval_secs =
            parse_positive("SAMPLING_INTERVAL_SECS", var("SAMPLING_INTERVAL_SECS", "2"))?;
        let sensor_read_timeout_secs =
            parse_positive("SENSOR_READ_TIMEOUT_SECS", var("SENSOR_READ_TIMEOUT_SECS", "5"))?;

        let hardware = HardwareConfig {
            backend: parse::<Backend>("HARDWARE", var("HARDWARE", "simulated"))?,
            dht_iio_device: PathBuf::from(var(
                "DHT_IIO_DEVICE",
                "/sys/bus/iio/devices/iio:device0",
            )),
            light_i2c_bus: parse("LIGHT_I2C_BUS", var("LIGHT_I2C_BUS", "1"))?,
            buzzer_pin: parse("BUZZER_PIN", var("BUZZER_PIN", "19"))?,
            led_pin: parse("LED_PIN", var("LED_PIN", "18"))?,
        };

        let buzzer_active_low: bool =
            parse("BUZZER_ACTIVE_LOW", var("BUZZER_ACTIVE_LOW", "true"))?;
        let buzzer_active = if buzzer_active_low {
            Level::Low
        } else {
            Level::High
        };

        let thresholds = Thresholds {
            temperature_high: parse_finite(
                "THRESHOLD_TEMPERATURE_HIGH",
                var("THRESHOLD_TEMPERATURE_HIGH", "35"),
            )?,
            humidity_high: parse_finite(
                "THRESHOLD_HUMIDITY_HIGH",
                var("THRESHOLD_HUMIDITY_HIGH", "80"),
            )?,
            light_low: parse_finite("THRESHOLD_LIGHT_LOW", var("THRESHOLD_LIGHT_LOW", "30"))?,
        };

        let report = ReportClientConfig {
            api_key: lookup("REPORT_API_KEY").filter(|k| !k.trim().is_empty()),
            base_url: var("REPORT_BASE_URL", DEFAULT_BASE_URL),
            model: var("REPORT_MODEL", DEFAULT_MODEL),
            language: var("REPORT_LANGUAGE", "English"),
        };

        Ok(Self {
            host,
            port,
            database_url,
            cors_origins,
            request_timeout_secs,
            sampling_interval: Duration::from_secs(sampling_interval_secs),
            sensor_read_timeout: Duration::from_secs(sensor_read_timeout_secs),
            hardware,
            buzzer_active,
            thresholds,
            report,
        })
    }
}

fn parse<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError {
        var,
        reason: e.to_string(),
        value,
    })
}

fn parse_finite(var: &'static str, value: String) -> Result<f64, ConfigError> {
    let parsed: f64 = parse(var, value.clone())?;
    if !parsed.is_finite() {
        return Err(ConfigError {
            var,
            value,
            reason: "must be a finite number".to_string(),
        });
    }
    Ok(parsed)
}

fn parse_positive(var: &'static str, value: String) -> Result<u64, ConfigError> {
    let parsed: u64 = parse(var, value.clone())?;
    if parsed == 0 {
        return Err(ConfigError {
            var,
            value,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(parsed)
}

/// Credentialed CORS cannot use a wildcard, so origins must be listed.
fn parse_origins(value: String) -> Result<Vec<String>, ConfigError> {
    let origins: Vec<String> = value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if origins.iter().any(|o| o == "*") {
        return Err(ConfigError {
            var: "CORS_ORIGINS",
            value,
            reason: "wildcard origin is not allowed; list origins explicitly".to_string(),
        });
    }
    Ok(origins)
}
