//! Manual alarm controls.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SilenceResponse {
    pub success: bool,
    pub buzzer: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PatternResponse {
    pub success: bool,
    pub message: &'static str,
}

/// POST /alarm/silence -- stop the alarm until the next violating reading.
pub async fn silence(State(state): State<AppState>) -> Json<SilenceResponse> {
    let transition = state.station.silence();
    tracing::info!(?transition, "Alarm silenced on request");

    Json(SilenceResponse {
        success: true,
        buzzer: state.station.alarm_status().state.buzzer_label(),
    })
}

/// POST /alarm/test -- run the diagnostic buzzer/LED pattern.
pub async fn test_pattern(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<PatternResponse>)> {
    // Runs detached; the handle is not awaited.
    let _pattern = state.station.trigger_alarm_pattern()?;

    Ok((
        StatusCode::ACCEPTED,
        Json(PatternResponse {
            success: true,
            message: "Alarm pattern started",
        }),
    ))
}
