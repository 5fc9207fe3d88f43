#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use tower::ServiceExt;

use envmon_api::config::ServerConfig;
use envmon_api::router::build_app_router;
use envmon_api::state::AppState;
use envmon_core::alarm::AlarmController;
use envmon_core::hardware::Level;
use envmon_core::sensor::{SensorError, SensorReader};
use envmon_core::station::Station;
use envmon_core::thresholds::Thresholds;
use envmon_core::types::Reading;
use envmon_db::RecordStore;
use envmon_hardware::sim::SimulatedPin;
use envmon_report::{ReportError, ReportGenerator, SensorContext};

pub const TEST_ORIGIN: &str = "http://localhost:5000";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig::from_lookup(|key| {
        match key {
            "HOST" => Some("127.0.0.1"),
            "PORT" => Some("0"),
            "CORS_ORIGINS" => Some(TEST_ORIGIN),
            "REQUEST_TIMEOUT_SECS" => Some("30"),
            _ => None,
        }
        .map(str::to_string)
    })
    .expect("test config is valid")
}

// ---------------------------------------------------------------------------
// Doubles
// ---------------------------------------------------------------------------

/// What the stub report generator answers with.
pub enum StubReply {
    Text(String),
    NotConfigured,
    Upstream(u16),
}

/// Report generator that records the contexts it was asked about.
pub struct StubReporter {
    reply: StubReply,
    pub contexts: Mutex<Vec<SensorContext>>,
}

impl StubReporter {
    pub fn new(reply: StubReply) -> Self {
        Self {
            reply,
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_context(&self) -> Option<SensorContext> {
        self.contexts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ReportGenerator for StubReporter {
    async fn generate(&self, context: &SensorContext) -> Result<String, ReportError> {
        if matches!(self.reply, StubReply::NotConfigured) {
            return Err(ReportError::NotConfigured);
        }
        if context.is_empty() {
            return Err(ReportError::NoData);
        }
        self.contexts.lock().unwrap().push(context.clone());
        match &self.reply {
            StubReply::Text(text) => Ok(text.clone()),
            StubReply::Upstream(status) => Err(ReportError::Api {
                status: *status,
                body: "upstream exploded".to_string(),
            }),
            StubReply::NotConfigured => Err(ReportError::NotConfigured),
        }
    }
}

/// Sensor reader that replays a fixed script, then fails forever.
pub struct ScriptedReader {
    script: VecDeque<Result<(f64, f64, f64), &'static str>>,
}

impl ScriptedReader {
    pub fn new(script: Vec<Result<(f64, f64, f64), &'static str>>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl SensorReader for ScriptedReader {
    fn read(&mut self) -> Result<Reading, SensorError> {
        match self.script.pop_front() {
            Some(Ok((t, h, l))) => Ok(Reading::now(t, h, l)),
            Some(Err(msg)) => Err(SensorError::InvalidData(msg.to_string())),
            None => Err(SensorError::Io("script exhausted".to_string())),
        }
    }
}

/// Sensor reader that blocks longer than any sensible read timeout.
pub struct StuckReader(pub std::time::Duration);

impl SensorReader for StuckReader {
    fn read(&mut self) -> Result<Reading, SensorError> {
        std::thread::sleep(self.0);
        Ok(Reading::now(20.0, 50.0, 100.0))
    }
}

// ---------------------------------------------------------------------------
// Station and app
// ---------------------------------------------------------------------------

/// A station on simulated pins, with observer handles on the buzzer and LED.
pub struct TestStation {
    pub station: Arc<Station>,
    pub buzzer: SimulatedPin,
    pub led: SimulatedPin,
}

/// Active-low buzzer, default thresholds.
pub fn test_station() -> TestStation {
    let buzzer = SimulatedPin::new("buzzer");
    let led = SimulatedPin::new("led");
    let alarm = AlarmController::new(Box::new(buzzer.clone()), Box::new(led.clone()), Level::Low);
    TestStation {
        station: Arc::new(Station::new(Thresholds::default(), alarm)),
        buzzer,
        led,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub buzzer: SimulatedPin,
    pub led: SimulatedPin,
    pub reporter: Arc<StubReporter>,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn store(&self) -> &RecordStore {
        &self.state.store
    }

    pub fn station(&self) -> &Station {
        &self.state.station
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: SqlitePool) -> TestApp {
    build_test_app_with_reporter(pool, StubReply::Text("All readings nominal.".to_string()))
}

pub fn build_test_app_with_reporter(pool: SqlitePool, reply: StubReply) -> TestApp {
    let config = test_config();
    let TestStation {
        station,
        buzzer,
        led,
    } = test_station();
    let reporter = Arc::new(StubReporter::new(reply));

    let state = AppState {
        store: Arc::new(RecordStore::new(pool)),
        station,
        reporter: Arc::clone(&reporter) as Arc<dyn ReportGenerator>,
        config: Arc::new(config.clone()),
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
        buzzer,
        led,
        reporter,
    }
}

/// A reading with a fixed, ordered timestamp.
pub fn reading(seq: u32, temperature: f64, humidity: f64, light: f64) -> Reading {
    Reading {
        timestamp: format!("2024-05-01 10:{:02}:{:02}", seq / 60, seq % 60),
        temperature,
        humidity,
        light,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, json.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: impl Into<Body>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
