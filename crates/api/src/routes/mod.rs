pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the station route tree.
///
/// Route hierarchy:
///
/// ```text
/// /                    dashboard page (GET)
/// /data                chart series + alarm status (GET)
/// /thresholds          current thresholds (GET)
/// /set_thresholds      partial threshold update, silences alarm (POST)
/// /create_report       natural-language report (POST)
/// /alarm/silence       silence the alarm (POST)
/// /alarm/test          diagnostic buzzer/LED pattern (POST)
/// ```
pub fn station_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::dashboard::index))
        .route("/data", get(handlers::dashboard::data))
        .route("/thresholds", get(handlers::thresholds::get_thresholds))
        .route("/set_thresholds", post(handlers::thresholds::set_thresholds))
        .route("/create_report", post(handlers::report::create_report))
        .route("/alarm/silence", post(handlers::alarm::silence))
        .route("/alarm/test", post(handlers::alarm::test_pattern))
}
