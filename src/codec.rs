//! Message codec.
//!
//! Field nodes send a three-character text, hex-encoded on the wire:
//! button, temperature and vibration, one character per sensor. The
//! character tables here are closed; anything outside them decodes to an
//! unrecognized marker that behaves as not-sensed, never as a measured
//! value.

use tracing::warn;

use crate::models::{Button, DecodedText, Reading, Temperature, Vibration};

const BUTTON_PRESSED: char = 'B';
const BUTTON_NOT_PRESSED: char = 'N';

/// Reserved "not sensed" code, shared by both sensor tables.
const NOT_SENSED: char = 'Z';

/// Vibration beyond the top of the ramp.
const VIBRATION_OFF_SCALE: char = 'V';

/// Temperature magnitudes addressed by codes `A..=N`, ascending.
///
/// The letter case of the code carries the sign: lowercase negates the
/// magnitude, uppercase keeps it positive. Magnitude 0 is sign-invariant.
const TEMPERATURE_MAGNITUDES: [i32; 14] = [0, 1, 2, 3, 4, 5, 10, 15, 20, 25, 30, 35, 40, 50];

/// Vibration ramp addressed by codes `A..=K`, case-insensitive.
const VIBRATION_RAMP: [f64; 11] = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// Decode a button character.
///
/// Codes are case-sensitive; anything but `B`/`N` is unrecognized and
/// invalidates the whole reading for latest-state purposes.
pub fn button_value(code: char) -> Button {
    match code {
        BUTTON_PRESSED => Button::Pressed,
        BUTTON_NOT_PRESSED => Button::NotPressed,
        _ => Button::Unrecognized,
    }
}

/// Decode a temperature character against the magnitude table.
pub fn temperature_value(code: char) -> Temperature {
    let upper = code.to_ascii_uppercase();
    if upper == NOT_SENSED {
        return Temperature::NotSensed;
    }
    if !upper.is_ascii_uppercase() {
        return Temperature::Unrecognized;
    }

    let index = (upper as u8 - b'A') as usize;
    match TEMPERATURE_MAGNITUDES.get(index) {
        Some(&magnitude) if code.is_ascii_lowercase() => Temperature::Sensed(-magnitude),
        Some(&magnitude) => Temperature::Sensed(magnitude),
        None => Temperature::Unrecognized,
    }
}

/// Decode a vibration character against the ramp table.
pub fn vibration_value(code: char) -> Vibration {
    let upper = code.to_ascii_uppercase();
    if upper == NOT_SENSED {
        return Vibration::NotSensed;
    }
    if upper == VIBRATION_OFF_SCALE {
        return Vibration::Sensed(2.0);
    }
    if !upper.is_ascii_uppercase() {
        return Vibration::Unrecognized;
    }

    let index = (upper as u8 - b'A') as usize;
    match VIBRATION_RAMP.get(index) {
        Some(&value) => Vibration::Sensed(value),
        None => Vibration::Unrecognized,
    }
}

/// Hex-decode a message payload to text.
///
/// Never fails: malformed hex or non-UTF-8 bytes fall back to the
/// original payload string, flagged, so ingestion can still record it.
pub fn decode_payload(payload_hex: &str) -> DecodedText {
    let bytes = match hex::decode(payload_hex) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(payload = %payload_hex, error = %e, "Payload is not valid hex");
            return DecodedText {
                text: payload_hex.to_string(),
                decode_failed: true,
            };
        }
    };

    match String::from_utf8(bytes) {
        Ok(text) => DecodedText {
            text,
            decode_failed: false,
        },
        Err(e) => {
            warn!(payload = %payload_hex, error = %e, "Payload bytes are not UTF-8");
            DecodedText {
                text: payload_hex.to_string(),
                decode_failed: true,
            }
        }
    }
}

/// Decode a message text into a structured reading.
///
/// Requires exactly three characters (button, temperature, vibration, in
/// that order). Wrong length yields an invalid reading with defaulted
/// fields. An unrecognized button code also marks the reading invalid;
/// the sensor characters are still decoded for diagnostics.
pub fn decode_reading(text: &str) -> Reading {
    let mut chars = text.chars();
    let (Some(button_char), Some(temperature_char), Some(vibration_char), None) =
        (chars.next(), chars.next(), chars.next(), chars.next())
    else {
        return Reading::default();
    };

    let button = button_value(button_char);
    Reading {
        button,
        temperature: temperature_value(temperature_char),
        vibration: vibration_value(vibration_char),
        valid: button != Button::Unrecognized,
    }
}
