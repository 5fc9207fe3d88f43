//! Natural-language reports over recent readings.
//!
//! [`ReportGenerator`] is the seam the HTTP layer depends on;
//! [`ChatCompletionsClient`] implements it against any OpenAI-compatible
//! `/chat/completions` endpoint.

pub mod client;

use async_trait::async_trait;
use envmon_core::types::Reading;
use serde::Serialize;

pub use client::{ChatCompletionsClient, ReportClientConfig};

/// Default base URL: Gemini's OpenAI-compatible surface.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Column-oriented view of the readings handed to the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorContext {
    pub timestamps: Vec<String>,
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    pub light: Vec<f64>,
}

impl SensorContext {
    /// Build from readings already in chronological order.
    pub fn from_readings<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> Self {
        let mut context = Self::default();
        for r in readings {
            context.timestamps.push(r.timestamp.clone());
            context.temperature.push(r.temperature);
            context.humidity.push(r.humidity);
            context.light.push(r.light);
        }
        context
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Errors from report generation.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// No API key was configured.
    #[error("Report generation is not configured")]
    NotConfigured,

    /// There is nothing to report on yet.
    #[error("No sensor data available for a report")]
    NoData,

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The model endpoint returned a non-2xx status code.
    #[error("Report API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The endpoint answered without any message content.
    #[error("Report API returned no content")]
    EmptyResponse,
}

/// Turns recent readings into a written summary.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, context: &SensorContext) -> Result<String, ReportError>;
}
