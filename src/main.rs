//! Field-node telemetry recorder utility

use telemetry_recorder::api::ApiClient;
use telemetry_recorder::config::{AppConfig, Credential};
use telemetry_recorder::database::Database;
use telemetry_recorder::errors::RecorderError;
use telemetry_recorder::ingest;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), RecorderError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration, preferring environment variables and config files
    let config = AppConfig::load()?;
    config.validate()?;

    // Failure to reach the database at startup is fatal; later call
    // failures are logged and skipped past.
    let db = Database::connect(&config.database.url, config.database.max_connections).await?;

    // Setup signal handling for graceful shutdown
    let shutdown_signal = signal::ctrl_c();

    tokio::select! {
        result = run_recorder(&config, &db) => {
            info!("Recorder completed: {:?}", result);
        }
        _ = shutdown_signal => {
            info!("Received shutdown signal");
        }
    }

    Ok(())
}

/// Repeat poll passes until the configured iteration bound (if any).
async fn run_recorder(config: &AppConfig, db: &Database) -> Result<(), RecorderError> {
    let mut iteration: u64 = 0;
    loop {
        info!(iteration, "Starting poll pass");
        for credential in &config.api.credentials {
            if let Err(e) = run_pass(config, credential, db).await {
                error!(username = %credential.username, error = %e, "Poll pass failed");
            }
        }

        iteration += 1;
        if let Some(bound) = config.poll.iterations {
            if iteration >= bound {
                break;
            }
        }
        tokio::time::sleep(config.poll.interval).await;
    }

    Ok(())
}

/// One pass for one credential set: walk groups, then devices, then
/// messages, sequentially. Per-device failures never end the pass.
async fn run_pass(
    config: &AppConfig,
    credential: &Credential,
    db: &Database,
) -> Result<(), RecorderError> {
    let client = ApiClient::new(&config.api, credential)?;

    for group_id in client.device_groups().await? {
        let devices = match client.devices(&group_id).await {
            Ok(devices) => devices,
            Err(e) => {
                error!(group_id, error = %e, "Device listing failed");
                continue;
            }
        };

        for external_id in devices {
            let messages = match client.messages(&external_id).await {
                Ok(messages) => messages,
                Err(e) => {
                    error!(external_id, error = %e, "Message listing failed");
                    continue;
                }
            };

            match ingest::ingest_device(db, &external_id, &messages).await {
                Ok(report) => info!(
                    external_id,
                    messages = report.messages_seen,
                    history = report.history_written,
                    latest_updated = report.latest_state_updated,
                    "Device ingested"
                ),
                Err(e) => error!(external_id, error = %e, "Device ingestion failed"),
            }
        }
    }

    Ok(())
}
