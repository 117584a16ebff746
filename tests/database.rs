//! Postgres adapter tests. They need a live database: set DATABASE_URL
//! (dotenv is honored) and run with `cargo test -- --ignored`.

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use std::env;

use telemetry_recorder::{
    database::{Database, TelemetryStore},
    models::{Button, NodeId, Reading, Temperature, Vibration},
};

async fn setup_test_db() -> Pool<Postgres> {
    dotenvy::dotenv().ok();
    let database_url =
        env::var("DATABASE_URL").expect("Environment variable DATABASE_URL required");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

fn utc(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap()
}

fn pressed_reading() -> Reading {
    Reading {
        button: Button::Pressed,
        temperature: Temperature::Sensed(0),
        vibration: Vibration::NotSensed,
        valid: true,
    }
}

async fn node_for(db: &Database, external_id: &str) -> NodeId {
    db.upsert_node(external_id, false).await.unwrap();
    db.node_id_by_external_id(external_id)
        .await
        .unwrap()
        .expect("node should exist after upsert")
}

#[ignore]
#[sqlx::test]
async fn test_upsert_node_is_conflict_safe() {
    let pool = setup_test_db().await;
    let db = Database::new(pool.clone());

    assert!(db.upsert_node("IT-NODE-1", false).await.unwrap());
    assert!(db.upsert_node("IT-NODE-1", true).await.unwrap());

    let (count, active): (i64, bool) = sqlx::query_as(
        "SELECT COUNT(*) OVER (), active FROM node WHERE external_id = $1",
    )
    .bind("IT-NODE-1")
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(count, 1);
    assert!(active);
}

#[ignore]
#[sqlx::test]
async fn test_history_is_append_only() {
    let pool = setup_test_db().await;
    let db = Database::new(pool.clone());
    let node_id = node_for(&db, "IT-NODE-2").await;

    assert!(db.append_history(node_id, "BAZ", utc(1000)).await.unwrap());
    assert!(db.append_history(node_id, "BAZ", utc(1000)).await.unwrap());

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM message_history WHERE node_id = $1 AND decoded_text = 'BAZ'",
    )
    .bind(node_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(count, 2);
}

#[ignore]
#[sqlx::test]
async fn test_latest_state_single_row_and_stale_guard() {
    let pool = setup_test_db().await;
    let db = Database::new(pool.clone());
    let node_id = node_for(&db, "IT-NODE-3").await;

    // Replay at the same timestamp overwrites
    assert!(db
        .upsert_latest_state(node_id, &pressed_reading(), utc(2000))
        .await
        .unwrap());
    assert!(db
        .upsert_latest_state(node_id, &pressed_reading(), utc(2000))
        .await
        .unwrap());

    // A strictly older candidate is refused
    let older = Reading {
        button: Button::NotPressed,
        ..pressed_reading()
    };
    assert!(!db.upsert_latest_state(node_id, &older, utc(1000)).await.unwrap());

    let (count, button, temperature, vibration): (i64, String, Option<i32>, Option<f64>) =
        sqlx::query_as(
            "SELECT COUNT(*) OVER (), button, temperature, vibration \
             FROM latest_state WHERE node_id = $1",
        )
        .bind(node_id)
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(button, "pressed");
    assert_eq!(temperature, Some(0));
    // Not-sensed vibration is stored as NULL, never as a numeric sentinel
    assert_eq!(vibration, None);
}

#[ignore]
#[sqlx::test]
async fn test_linked_asset_check_upsert() {
    let pool = setup_test_db().await;
    let db = Database::new(pool.clone());
    let node_id = node_for(&db, "IT-NODE-4").await;

    assert!(db
        .update_linked_asset_check(node_id, utc(1000), true)
        .await
        .unwrap());
    assert!(db
        .update_linked_asset_check(node_id, utc(2000), false)
        .await
        .unwrap());

    let (count, checked_at, present): (i64, DateTime<Utc>, bool) = sqlx::query_as(
        "SELECT COUNT(*) OVER (), checked_at, present FROM buoy_check WHERE node_id = $1",
    )
    .bind(node_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(count, 1);
    assert_eq!(checked_at, utc(2000));
    assert!(!present);
}
