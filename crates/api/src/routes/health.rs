use axum::extract::State;
use axum::{routing::get, Json, Router};
use envmon_core::alarm::AlarmState;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Current alarm state.
    pub alarm: AlarmState,
    /// Configured pause between sampling cycles.
    pub sampling_interval_secs: u64,
}

/// GET /health -- returns service, database and alarm health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = envmon_db::health_check(state.store.pool()).await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        alarm: state.station.alarm_status().state,
        sampling_interval_secs: state.config.sampling_interval.as_secs(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
