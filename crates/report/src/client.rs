//! HTTP client for OpenAI-compatible chat-completions endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ReportError, ReportGenerator, SensorContext, DEFAULT_BASE_URL, DEFAULT_MODEL};

/// HTTP request timeout for a single report request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Connection settings for the model endpoint.
#[derive(Debug, Clone)]
pub struct ReportClientConfig {
    /// `None` disables report generation.
    pub api_key: Option<String>,
    /// Base URL without the `/chat/completions` suffix.
    pub base_url: String,
    pub model: String,
    /// Language the report should be written in.
    pub language: String,
}

impl Default for ReportClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            language: "English".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseMessage {
    pub content: Option<String>,
}

/// Report generator backed by a chat-completions endpoint.
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    config: ReportClientConfig,
}

impl ChatCompletionsClient {
    pub fn new(config: ReportClientConfig) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    pub(crate) fn build_request(&self, context: &SensorContext) -> ChatRequest {
        let data = serde_json::to_string(context).unwrap_or_default();
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: format!(
                        "You are an expert analyst of environmental sensor data. \
                         Answer in {}.",
                        self.config.language
                    ),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Here is the latest sensor data: {data}. Analyse the trends \
                         and anomalies in temperature, humidity and light."
                    ),
                },
            ],
        }
    }

    /// Pull the first choice's text out of a response body.
    pub(crate) fn extract_message(response: ChatResponse) -> Result<String, ReportError> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(ReportError::EmptyResponse)
    }

    /// Ensure the response has a success status code, otherwise return a
    /// [`ReportError::Api`] with the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ReportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ReportError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ReportGenerator for ChatCompletionsClient {
    async fn generate(&self, context: &SensorContext) -> Result<String, ReportError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ReportError::NotConfigured)?;
        if context.is_empty() {
            return Err(ReportError::NoData);
        }

        tracing::info!(
            records = context.len(),
            model = %self.config.model,
            "Requesting sensor report"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&self.build_request(context))
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let body: ChatResponse = response.json().await?;
        Self::extract_message(body)
    }
}
