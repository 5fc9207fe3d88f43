use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use envmon_core::error::CoreError;
use envmon_report::ReportError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `envmon_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Report generation failed.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            },

            // --- Database errors ---
            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                internal()
            }

            // --- Report errors ---
            AppError::Report(err) => classify_report_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Classify a report failure into an HTTP status, error code, and message.
///
/// - Missing configuration maps to 503.
/// - Nothing recorded yet maps to 409.
/// - Upstream and transport failures map to 502; the upstream body is
///   logged but not returned.
fn classify_report_error(err: &ReportError) -> (StatusCode, &'static str, String) {
    match err {
        ReportError::NotConfigured => (
            StatusCode::SERVICE_UNAVAILABLE,
            "REPORT_NOT_CONFIGURED",
            err.to_string(),
        ),
        ReportError::NoData => (StatusCode::CONFLICT, "NO_DATA", err.to_string()),
        ReportError::Api { status, body } => {
            tracing::error!(status, body = %body, "Report API returned an error");
            (
                StatusCode::BAD_GATEWAY,
                "REPORT_UPSTREAM_ERROR",
                format!("Report service returned status {status}"),
            )
        }
        ReportError::Request(e) => {
            tracing::error!(error = %e, "Report request failed");
            (
                StatusCode::BAD_GATEWAY,
                "REPORT_UPSTREAM_ERROR",
                "Report service is unreachable".to_string(),
            )
        }
        ReportError::EmptyResponse => (
            StatusCode::BAD_GATEWAY,
            "REPORT_UPSTREAM_ERROR",
            err.to_string(),
        ),
    }
}
