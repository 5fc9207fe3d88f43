//! Handlers for reading and updating the alarm thresholds.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use envmon_core::thresholds::{ThresholdUpdate, Thresholds};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Wire names of the three thresholds.
#[derive(Debug, Serialize)]
pub struct ThresholdValues {
    pub temperature: f64,
    pub humidity: f64,
    pub light: f64,
}

impl From<Thresholds> for ThresholdValues {
    fn from(t: Thresholds) -> Self {
        Self {
            temperature: t.temperature_high,
            humidity: t.humidity_high,
            light: t.light_low,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThresholdsResponse {
    pub success: bool,
    pub thresholds: ThresholdValues,
}

/// GET /thresholds
pub async fn get_thresholds(State(state): State<AppState>) -> Json<ThresholdsResponse> {
    Json(ThresholdsResponse {
        success: true,
        thresholds: state.station.thresholds().into(),
    })
}

/// POST /set_thresholds -- partial update; always silences the alarm.
///
/// Accepts `{"temperature"?, "humidity"?, "light"?}` where each value is a
/// number or a numeric string. Unknown keys are ignored.
pub async fn set_thresholds(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<ThresholdsResponse>> {
    let update = parse_update(&body)?;
    let thresholds = state.station.update_thresholds(&update)?;

    Ok(Json(ThresholdsResponse {
        success: true,
        thresholds: thresholds.into(),
    }))
}

fn no_data() -> AppError {
    AppError::BadRequest("No data received".to_string())
}

/// Parse a request body into a [`ThresholdUpdate`].
///
/// An empty body, `null`, or an empty object is "no data".
pub fn parse_update(body: &[u8]) -> AppResult<ThresholdUpdate> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(no_data());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;

    let fields = match value {
        Value::Null => return Err(no_data()),
        Value::Object(map) if map.is_empty() => return Err(no_data()),
        Value::Object(map) => map,
        _ => {
            return Err(AppError::BadRequest(
                "Expected a JSON object".to_string(),
            ))
        }
    };

    Ok(ThresholdUpdate {
        temperature_high: field(&fields, "temperature")?,
        humidity_high: field(&fields, "humidity")?,
        light_low: field(&fields, "light")?,
    })
}

fn field(fields: &Map<String, Value>, name: &str) -> AppResult<Option<f64>> {
    let Some(value) = fields.get(name) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| AppError::BadRequest(format!("{name} must be a number, got {value}")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_inputs_are_no_data() {
        for body in [&b""[..], &b"  \n"[..], &b"null"[..], &b"{}"[..]] {
            let err = parse_update(body).unwrap_err();
            assert_matches!(err, AppError::BadRequest(msg) if msg == "No data received");
        }
    }

    #[test]
    fn numbers_and_numeric_strings_are_accepted() {
        let update = parse_update(br#"{"temperature": 40, "humidity": " 72.5 "}"#).unwrap();

        assert_eq!(update.temperature_high, Some(40.0));
        assert_eq!(update.humidity_high, Some(72.5));
        assert_eq!(update.light_low, None);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let update = parse_update(br#"{"light": 12, "pressure": 1013}"#).unwrap();
        assert_eq!(update.light_low, Some(12.0));
        assert!(update.temperature_high.is_none());
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        assert_matches!(
            parse_update(br#"{"temperature": "hot"}"#),
            Err(AppError::BadRequest(msg)) if msg.starts_with("temperature")
        );
        assert_matches!(
            parse_update(br#"{"light": null}"#),
            Err(AppError::BadRequest(_))
        );
        assert_matches!(parse_update(b"[1, 2]"), Err(AppError::BadRequest(_)));
        assert_matches!(parse_update(b"{not json"), Err(AppError::BadRequest(_)));
    }
}
