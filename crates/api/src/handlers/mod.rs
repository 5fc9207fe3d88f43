pub mod alarm;
pub mod dashboard;
pub mod report;
pub mod thresholds;

/// Number of most recent records served to the chart and the report.
pub const RECENT_WINDOW: i64 = 50;
