//! Ingestion pipeline.
//!
//! Turns the ordered message sequence of one device into storage effects:
//! every message is appended to history, and the first message of the
//! sequence (upstream delivers newest first) is the only candidate for
//! the latest-state and linked-asset updates. Failures of individual
//! writes are logged and never abort the device, let alone the pass.

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::codec;
use crate::database::TelemetryStore;
use crate::errors::RecorderError;
use crate::models::{NodeId, RawMessage};

/// Outcome summary for one device ingestion, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceIngestReport {
    pub messages_seen: usize,
    pub history_written: usize,
    pub latest_state_updated: bool,
}

/// Ingest the message sequence of one device.
///
/// The node is registered (or reactivated) first; a node that cannot be
/// resolved afterwards is the only error that skips the device entirely.
pub async fn ingest_device<S: TelemetryStore>(
    store: &S,
    external_id: &str,
    messages: &[RawMessage],
) -> Result<DeviceIngestReport, RecorderError> {
    match store.upsert_node(external_id, false).await {
        Ok(true) => debug!(external_id, "Node upserted"),
        Ok(false) => error!(external_id, "Node could not be upserted"),
        Err(e) => error!(external_id, error = %e, "Node upsert failed"),
    }

    let node_id = store
        .node_id_by_external_id(external_id)
        .await?
        .ok_or_else(|| RecorderError::NodeNotFound(external_id.to_string()))?;

    let mut report = DeviceIngestReport {
        messages_seen: messages.len(),
        ..Default::default()
    };

    for (index, message) in messages.iter().enumerate() {
        let decoded = codec::decode_payload(&message.payload_hex);
        if decoded.decode_failed {
            warn!(
                external_id,
                payload = %message.payload_hex,
                "Recording undecodable payload verbatim"
            );
        }

        // History takes every message, even undecodable or structurally
        // invalid ones, for audit.
        match store
            .append_history(node_id, &decoded.text, message.sent_at_utc())
            .await
        {
            Ok(true) => report.history_written += 1,
            Ok(false) => warn!(external_id, "History row was not written"),
            Err(e) => error!(external_id, error = %e, "History append failed"),
        }

        if index == 0 {
            report.latest_state_updated =
                ingest_latest(store, node_id, &decoded.text, message.sent_at_utc()).await;
        }
    }

    Ok(report)
}

/// Run the latest-state leg for the designated newest message.
///
/// Returns whether latest state was overwritten. Invalid readings touch
/// nothing; a candidate older than the stored state leaves both the
/// latest state and the buoy check alone.
async fn ingest_latest<S: TelemetryStore>(
    store: &S,
    node_id: NodeId,
    text: &str,
    as_of: DateTime<Utc>,
) -> bool {
    let reading = codec::decode_reading(text);
    if !reading.valid {
        debug!(?node_id, text, "Reading invalid, latest state untouched");
        return false;
    }

    let updated = match store.upsert_latest_state(node_id, &reading, as_of).await {
        Ok(true) => true,
        Ok(false) => {
            debug!(?node_id, "Stored latest state is newer, keeping it");
            return false;
        }
        Err(e) => {
            error!(?node_id, error = %e, "Latest state upsert failed");
            false
        }
    };

    if let Err(e) = store
        .update_linked_asset_check(node_id, as_of, reading.button.is_pressed())
        .await
    {
        error!(?node_id, error = %e, "Linked asset check update failed");
    }

    updated
}
