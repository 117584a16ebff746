//! Persistence layer.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::errors::RecorderError;
use crate::models::{NodeId, Reading};

/// Narrow persistence capability consumed by the ingestion pipeline.
///
/// Writes report success as a boolean. Expected conflict shapes
/// (re-upserting a known node, replaying a latest-state row) are absorbed
/// by the implementation and never surface as errors; a `false` return
/// means the write was refused and prior state is intact.
#[allow(async_fn_in_trait)]
pub trait TelemetryStore {
    /// Insert a node keyed by its upstream external id, or update its
    /// `active` flag if already present.
    async fn upsert_node(&self, external_id: &str, active: bool) -> Result<bool, RecorderError>;

    /// Resolve the internal node key for an upstream external id.
    async fn node_id_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<NodeId>, RecorderError>;

    /// Append one history row. No deduplication: replays create
    /// duplicate rows.
    async fn append_history(
        &self,
        node_id: NodeId,
        decoded_text: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, RecorderError>;

    /// Overwrite the single latest-state row for a node.
    ///
    /// Refused (returns `false`) when the stored row carries a strictly
    /// newer `as_of`; an equal timestamp still overwrites, so replaying
    /// the same message leaves the replay's values in place.
    async fn upsert_latest_state(
        &self,
        node_id: NodeId,
        reading: &Reading,
        as_of: DateTime<Utc>,
    ) -> Result<bool, RecorderError>;

    /// Record a presence check on the buoy linked to a node.
    async fn update_linked_asset_check(
        &self,
        node_id: NodeId,
        checked_at: DateTime<Utc>,
        present: bool,
    ) -> Result<bool, RecorderError>;
}

/// PostgreSQL-backed store.
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to the database and bring the schema up to date.
    ///
    /// Connection failure here is the one fatal persistence error; after
    /// startup, individual call failures are reported to the caller and
    /// the poll pass moves on.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RecorderError> {
        info!(max_connections, "Connecting to database");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| RecorderError::DatabaseConnectionError(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| RecorderError::MigrationError(e.to_string()))?;

        Ok(Self::new(pool))
    }

    /// Wrap an existing pool. Migrations are the caller's concern.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TelemetryStore for Database {
    async fn upsert_node(&self, external_id: &str, active: bool) -> Result<bool, RecorderError> {
        let result = sqlx::query(
            "INSERT INTO node (external_id, active) VALUES ($1, $2) \
             ON CONFLICT (external_id) DO UPDATE SET active = excluded.active",
        )
        .bind(external_id)
        .bind(active)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn node_id_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<NodeId>, RecorderError> {
        let node_id = sqlx::query_scalar::<_, NodeId>(
            "SELECT node_id FROM node WHERE external_id = $1",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(node_id)
    }

    async fn append_history(
        &self,
        node_id: NodeId,
        decoded_text: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, RecorderError> {
        let result = sqlx::query(
            "INSERT INTO message_history (node_id, decoded_text, sent_at) VALUES ($1, $2, $3)",
        )
        .bind(node_id)
        .bind(decoded_text)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_latest_state(
        &self,
        node_id: NodeId,
        reading: &Reading,
        as_of: DateTime<Utc>,
    ) -> Result<bool, RecorderError> {
        // Values are NULL whenever the matching sensed flag is false; SQL
        // NULL is the only storage-side "not sensed" representation.
        let result = sqlx::query(
            "INSERT INTO latest_state (
                node_id, button, temperature_sensed, temperature,
                vibration_sensed, vibration, as_of
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (node_id) DO UPDATE SET
                button = excluded.button,
                temperature_sensed = excluded.temperature_sensed,
                temperature = excluded.temperature,
                vibration_sensed = excluded.vibration_sensed,
                vibration = excluded.vibration,
                as_of = excluded.as_of
            WHERE latest_state.as_of <= excluded.as_of",
        )
        .bind(node_id)
        .bind(reading.button.as_str())
        .bind(reading.temperature.is_sensed())
        .bind(reading.temperature.value())
        .bind(reading.vibration.is_sensed())
        .bind(reading.vibration.value())
        .bind(as_of)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_linked_asset_check(
        &self,
        node_id: NodeId,
        checked_at: DateTime<Utc>,
        present: bool,
    ) -> Result<bool, RecorderError> {
        let result = sqlx::query(
            "INSERT INTO buoy_check (node_id, checked_at, present) VALUES ($1, $2, $3) \
             ON CONFLICT (node_id) DO UPDATE SET \
                 checked_at = excluded.checked_at, \
                 present = excluded.present",
        )
        .bind(node_id)
        .bind(checked_at)
        .bind(present)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
