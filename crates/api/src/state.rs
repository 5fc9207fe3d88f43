use std::sync::Arc;

use envmon_core::station::Station;
use envmon_db::RecordStore;
use envmon_report::ReportGenerator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Append-only readings table.
    pub store: Arc<RecordStore>,
    /// Thresholds and the alarm they drive.
    pub station: Arc<Station>,
    /// Natural-language report backend.
    pub reporter: Arc<dyn ReportGenerator>,
    /// Loaded settings, surfaced on `/health`.
    pub config: Arc<ServerConfig>,
}
