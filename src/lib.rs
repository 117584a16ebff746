//! Field-node telemetry recorder.
//!
//! Polls the upstream telemetry network for device groups, devices and
//! their hex-encoded sensor messages, decodes the three-character sensor
//! encoding and records message history, per-node latest state and the
//! linked buoy check in PostgreSQL.

pub mod api;
pub mod codec;
pub mod config;
pub mod database;
pub mod errors;
pub mod ingest;
pub mod models;
