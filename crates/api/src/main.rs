use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use envmon_api::background::sampling::Sampler;
use envmon_api::config::ServerConfig;
use envmon_api::router::build_app_router;
use envmon_api::state::AppState;
use envmon_core::alarm::AlarmController;
use envmon_core::station::Station;
use envmon_db::RecordStore;
use envmon_report::ChatCompletionsClient;

/// Number of records echoed to the log at start-up.
const STARTUP_LOG_RECORDS: i64 = 10;

/// Exit the process after logging a fatal start-up error.
fn fatal(what: &str, err: impl std::fmt::Display) -> ! {
    tracing::error!(error = %err, "{what}");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "envmon_api=debug,envmon_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().unwrap_or_else(|e| fatal("Invalid configuration", e));
    tracing::info!(
        host = %config.host,
        port = %config.port,
        hardware = ?config.hardware.backend,
        "Loaded server configuration"
    );

    // --- Database ---
    let pool = envmon_db::create_pool(&config.database_url)
        .await
        .unwrap_or_else(|e| fatal("Failed to open database", e));
    tracing::info!(url = %config.database_url, "Database connection pool created");

    envmon_db::run_migrations(&pool)
        .await
        .unwrap_or_else(|e| fatal("Failed to run database migrations", e));
    tracing::info!("Database and sensor_data table ready");

    let count = envmon_db::verify_schema(&pool)
        .await
        .unwrap_or_else(|e| fatal("Failed to verify sensor_data table", e));
    tracing::info!(count, "Existing sensor_data table schema is compatible");

    let store = Arc::new(RecordStore::new(pool));
    log_recent_records(&store).await;

    // --- Hardware ---
    let hardware = envmon_hardware::build(&config.hardware)
        .unwrap_or_else(|e| fatal("Failed to initialise hardware", e));
    let alarm = AlarmController::new(hardware.buzzer, hardware.led, config.buzzer_active);
    let station = Arc::new(Station::new(config.thresholds, alarm));

    // --- Report generator ---
    let reporter = ChatCompletionsClient::new(config.report.clone())
        .unwrap_or_else(|e| fatal("Failed to build report client", e));
    if reporter.is_configured() {
        tracing::info!(model = %config.report.model, "Report generation enabled");
    } else {
        tracing::warn!("REPORT_API_KEY not set, report generation disabled");
    }

    // --- Sampling loop ---
    let cancel = CancellationToken::new();
    let sampler = Sampler::new(
        hardware.sensors,
        Arc::clone(&station),
        Arc::clone(&store),
        config.sampling_interval,
        config.sensor_read_timeout,
    );
    let sampling_handle = tokio::spawn(sampler.run(cancel.clone()));

    // --- App state ---
    let state = AppState {
        store,
        station: Arc::clone(&station),
        reporter: Arc::new(reporter),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host = config
        .host
        .parse()
        .unwrap_or_else(|e| fatal("Invalid HOST address", e));
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| fatal("Failed to bind to address", e));

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sampling_handle).await;
    tracing::info!("Sampling loop stopped");

    station.silence();
    tracing::info!("Graceful shutdown complete");
}

/// Log the most recent stored records, newest first.
async fn log_recent_records(store: &RecordStore) {
    match store.latest(STARTUP_LOG_RECORDS).await {
        Ok(records) => {
            tracing::info!("Last {} database records:", records.len());
            for r in records.iter().rev() {
                tracing::info!(
                    id = r.id,
                    timestamp = %r.timestamp,
                    temperature = r.temperature,
                    humidity = r.humidity,
                    light = r.light,
                    "Stored record"
                );
            }
        }
        Err(e) => tracing::error!(error = %e, "Failed to check database contents"),
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
