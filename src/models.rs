//! Data models.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Internal node key, assigned by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct NodeId(i64);

impl NodeId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw key value
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// A raw device message as returned by the telemetry network.
///
/// The payload is an ASCII-hex string encoding a short textual sensor
/// code; `sent_at` is seconds from Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawMessage {
    #[serde(rename = "data")]
    pub payload_hex: String,
    #[serde(rename = "time")]
    pub sent_at: i64,
}

impl RawMessage {
    /// Message timestamp as UTC.
    ///
    /// Timestamps outside chrono's representable range clamp to the range
    /// boundary instead of failing; upstream only ever sends recent epochs.
    pub fn sent_at_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.sent_at, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Result of hex-decoding a message payload.
///
/// On malformed hex the original payload string is carried verbatim and
/// `decode_failed` is set; the text is still recorded to history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub decode_failed: bool,
}

/// Button state from the first message character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    Pressed,
    NotPressed,
    #[default]
    Unrecognized,
}

impl Button {
    pub fn is_pressed(&self) -> bool {
        matches!(self, Button::Pressed)
    }

    /// Storage-side label
    pub fn as_str(&self) -> &'static str {
        match self {
            Button::Pressed => "pressed",
            Button::NotPressed => "not_pressed",
            Button::Unrecognized => "unrecognized",
        }
    }
}

/// Temperature reading, degrees.
///
/// Sensed-ness lives in the variant and is never inferred from the
/// numeric value; `Unrecognized` behaves as not-sensed everywhere
/// downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Temperature {
    Sensed(i32),
    #[default]
    NotSensed,
    Unrecognized,
}

impl Temperature {
    pub fn is_sensed(&self) -> bool {
        matches!(self, Temperature::Sensed(_))
    }

    pub fn value(&self) -> Option<i32> {
        match self {
            Temperature::Sensed(value) => Some(*value),
            Temperature::NotSensed | Temperature::Unrecognized => None,
        }
    }
}

/// Vibration reading, dimensionless ramp value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Vibration {
    Sensed(f64),
    #[default]
    NotSensed,
    Unrecognized,
}

impl Vibration {
    pub fn is_sensed(&self) -> bool {
        matches!(self, Vibration::Sensed(_))
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Vibration::Sensed(value) => Some(*value),
            Vibration::NotSensed | Vibration::Unrecognized => None,
        }
    }
}

/// Structured result of decoding a three-character message text.
///
/// `valid` is true only when the text was exactly three characters long
/// and the button code was recognized; only valid readings may drive
/// latest-state and linked-asset updates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    pub button: Button,
    pub temperature: Temperature,
    pub vibration: Vibration,
    pub valid: bool,
}
