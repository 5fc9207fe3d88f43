//! HTTP-level tests for reading and updating thresholds.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, post_json, post_raw};
use envmon_core::alarm::AlarmState;
use envmon_core::hardware::{Level, OutputPin};
use envmon_core::types::Reading;
use serde_json::json;
use sqlx::SqlitePool;

// ---------------------------------------------------------------------------
// Test: GET /thresholds returns the defaults
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_thresholds_returns_defaults(pool: SqlitePool) {
    let app = build_test_app(pool);

    let response = get(app.app(), "/thresholds").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["thresholds"]["temperature"], 35.0);
    assert_eq!(json["thresholds"]["humidity"], 80.0);
    assert_eq!(json["thresholds"]["light"], 30.0);
}

// ---------------------------------------------------------------------------
// Test: partial update while alarming silences and keeps other fields
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn partial_update_while_alarming_silences(pool: SqlitePool) {
    let app = build_test_app(pool);
    app.station().evaluate(&Reading::now(36.0, 50.0, 50.0));
    assert_eq!(app.station().alarm_status().state, AlarmState::Alarming);
    assert!(app.buzzer.tone().is_some());

    let response = post_json(app.app(), "/set_thresholds", json!({ "temperature": 40 })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["thresholds"]["temperature"], 40.0);
    assert_eq!(json["thresholds"]["humidity"], 80.0);
    assert_eq!(json["thresholds"]["light"], 30.0);

    assert_eq!(app.station().alarm_status().state, AlarmState::Idle);
    assert!(app.buzzer.tone().is_none());
    // Active-low buzzer: silent means the line is high.
    assert_eq!(app.buzzer.level(), Level::High);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_silences_even_if_still_violated(pool: SqlitePool) {
    let app = build_test_app(pool);
    app.station().evaluate(&Reading::now(20.0, 50.0, 10.0));

    let response = post_json(app.app(), "/set_thresholds", json!({ "humidity": 90 })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.station().alarm_status().state, AlarmState::Idle);

    // The next evaluation re-arms it.
    app.station().evaluate(&Reading::now(20.0, 50.0, 10.0));
    assert_eq!(app.station().alarm_status().state, AlarmState::Alarming);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn numeric_strings_are_accepted(pool: SqlitePool) {
    let app = build_test_app(pool);

    let response = post_json(
        app.app(),
        "/set_thresholds",
        json!({ "temperature": "30.5", "humidity": 70, "light": "12" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let thresholds = app.station().thresholds();
    assert_eq!(thresholds.temperature_high, 30.5);
    assert_eq!(thresholds.humidity_high, 70.0);
    assert_eq!(thresholds.light_low, 12.0);
}

// ---------------------------------------------------------------------------
// Test: rejected bodies leave thresholds untouched
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_body_is_no_data_received(pool: SqlitePool) {
    let app = build_test_app(pool);

    for body in ["", "{}", "null"] {
        let response = post_raw(app.app(), "/set_thresholds", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
        let json = body_json(response).await;
        assert_eq!(json["error"], "No data received");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_value_is_rejected_without_side_effects(pool: SqlitePool) {
    let app = build_test_app(pool);
    app.station().evaluate(&Reading::now(36.0, 50.0, 50.0));

    let response = post_json(
        app.app(),
        "/set_thresholds",
        json!({ "temperature": 40, "humidity": "very" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.station().thresholds().temperature_high, 35.0);
    assert_eq!(app.station().alarm_status().state, AlarmState::Alarming);
}
