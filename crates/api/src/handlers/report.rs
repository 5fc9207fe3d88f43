use axum::extract::State;
use axum::Json;
use envmon_report::SensorContext;
use serde::Serialize;

use crate::error::AppResult;
use crate::handlers::RECENT_WINDOW;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub success: bool,
    pub message: String,
}

/// POST /create_report -- summarise the most recent records.
pub async fn create_report(State(state): State<AppState>) -> AppResult<Json<ReportResponse>> {
    let records = state.store.latest(RECENT_WINDOW).await?;
    let readings: Vec<_> = records.iter().map(|r| r.to_reading()).collect();
    let context = SensorContext::from_readings(&readings);

    let message = state.reporter.generate(&context).await?;
    tracing::info!(records = context.len(), chars = message.len(), "Report created");

    Ok(Json(ReportResponse {
        success: true,
        message,
    }))
}
