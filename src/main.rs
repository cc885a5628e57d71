use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iot_monitor::common::AppState;
use iot_monitor::config::Config;
use iot_monitor::device::DeviceClient;
use iot_monitor::routes;
use iot_monitor::sync;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG overrides; alert engine and poller log at debug by default
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,iot_monitor=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting iot-monitor...");

    let config = Config::from_env()?;
    tracing::info!(
        deployment = ?config.deployment,
        host = %config.api_host,
        port = config.api_port,
        poll_enabled = config.poll_enabled,
        poll_interval_seconds = config.poll_interval_seconds,
        poll_concurrency = config.poll_concurrency,
        "Configuration loaded"
    );

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connection established");

    // Creates devices, thresholds, readings and alerts plus the open-alert
    // unique index before anything can evaluate a reading
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Schema is up to date");

    let device_client = DeviceClient::new(&config)?;
    tracing::info!(
        timeout_seconds = config.device_request_timeout_seconds,
        "Device client initialized"
    );

    // Alert engine runs on the PostgreSQL-backed store
    let state = AppState::new(db, config.clone(), device_client);

    // Pulls readings from every active sensor endpoint; returns at once when
    // polling is disabled
    tokio::spawn(sync::scheduler::run_sensor_polling(state.clone()));

    let app = routes::build_router(state);

    let addr = config.bind_address();
    tracing::info!(address = %addr, docs = "/docs", "Serving API");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("iot-monitor stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM. A handler that cannot be installed is
/// logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
            tracing::info!("Received Ctrl+C, draining requests");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, draining requests");
        },
    }
}
