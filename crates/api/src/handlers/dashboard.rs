//! Handlers for the dashboard page and its polling endpoint.

use std::fmt::Write as _;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use envmon_db::models::sensor_record::SensorRecord;
use serde::Serialize;

use crate::error::AppResult;
use crate::handlers::RECENT_WINDOW;
use crate::state::AppState;

const DASHBOARD_TEMPLATE: &str = include_str!("../../assets/dashboard.html");

/// Placeholder in the template replaced by the history table rows.
const ROWS_PLACEHOLDER: &str = "<!-- history-rows -->";

/// Chart series plus alarm status, polled by the page every two seconds.
#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub labels: Vec<String>,
    pub temps: Vec<f64>,
    pub hums: Vec<f64>,
    pub lights: Vec<f64>,
    /// `"ON"` while the alarm is sounding.
    pub buzzer: &'static str,
    pub tem: bool,
    pub hum: bool,
    pub lig: bool,
}

impl DataResponse {
    fn from_records(records: Vec<SensorRecord>, buzzer: &'static str) -> Self {
        let mut response = Self {
            labels: Vec::with_capacity(records.len()),
            temps: Vec::with_capacity(records.len()),
            hums: Vec::with_capacity(records.len()),
            lights: Vec::with_capacity(records.len()),
            buzzer,
            tem: false,
            hum: false,
            lig: false,
        };
        for r in records {
            response.labels.push(r.timestamp);
            response.temps.push(r.temperature);
            response.hums.push(r.humidity);
            response.lights.push(r.light);
        }
        response
    }
}

/// GET / -- full history page, newest record first.
pub async fn index(State(state): State<AppState>) -> Response {
    match state.store.all().await {
        Ok(records) => {
            tracing::info!(count = records.len(), "Loaded records for web display");
            Html(render_dashboard(&records)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load web data");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error: Unable to load data, check logs",
            )
                .into_response()
        }
    }
}

/// GET /data -- the most recent records in chronological order with the
/// current alarm status.
pub async fn data(State(state): State<AppState>) -> AppResult<Json<DataResponse>> {
    let records = state.store.latest(RECENT_WINDOW).await?;
    let status = state.station.alarm_status();

    let mut response = DataResponse::from_records(records, status.state.buzzer_label());
    response.tem = status.evaluation.temperature;
    response.hum = status.evaluation.humidity;
    response.lig = status.evaluation.light;
    Ok(Json(response))
}

pub fn render_dashboard(records: &[SensorRecord]) -> String {
    let mut rows = String::with_capacity(records.len() * 96);
    for r in records {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td></tr>",
            escape_html(&r.timestamp),
            r.temperature,
            r.humidity,
            r.light
        );
    }
    DASHBOARD_TEMPLATE.replacen(ROWS_PLACEHOLDER, &rows, 1)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
