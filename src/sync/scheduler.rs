use std::time::Duration;
use tokio::time::interval;

use crate::common::AppState;
use crate::sync::worker;

/// Run the sensor polling task on a schedule.
///
/// Every interval, pulls the current value of each active sensor that has an
/// endpoint URL and ingests it as an automatic reading. A failing cycle is
/// logged and the loop waits for the next tick.
pub async fn run_sensor_polling(state: AppState) {
    if !state.config.poll_enabled {
        tracing::info!("Sensor polling disabled");
        return;
    }

    let interval_secs = state.config.poll_interval_seconds;
    let concurrency = state.config.poll_concurrency;

    tracing::info!(interval_secs, concurrency, "Starting sensor polling scheduler");

    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        // First tick completes immediately
        ticker.tick().await;

        let sensors = match worker::pollable_sensors(&state.db).await {
            Ok(sensors) => sensors,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load sensors for polling");
                continue;
            }
        };

        if sensors.is_empty() {
            tracing::debug!("No pollable sensors");
            continue;
        }

        let summary = worker::poll_sensors(
            state.store.as_ref(),
            state.device_client.as_ref(),
            sensors,
            concurrency,
        )
        .await;

        if summary.failed > 0 {
            tracing::warn!(
                polled = summary.polled,
                succeeded = summary.succeeded,
                failed = summary.failed,
                alerts_created = summary.alerts_created,
                alerts_resolved = summary.alerts_resolved,
                "Sensor polling cycle finished with failures"
            );
        } else {
            tracing::info!(
                polled = summary.polled,
                alerts_created = summary.alerts_created,
                alerts_resolved = summary.alerts_resolved,
                "Sensor polling cycle completed"
            );
        }
    }
}
