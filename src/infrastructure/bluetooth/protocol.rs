//! Inertial Sensor Protocol
//!
//! UUIDs and the notification payload layout of the tilt sensors.

use crate::domain::clamp::{ClampPolicy, FieldClass};
use crate::domain::error::PipelineError;
use crate::domain::models::OrientationReading;
use tracing::trace;
use uuid::Uuid;

pub use crate::domain::settings::{NOTIFY_CHAR_UUID, SERVICE_UUID};

/// Shortest payload that holds every field
pub const MIN_PAYLOAD_LEN: usize = 20;

/// Full-scale divisor for the signed 16-bit fields
const FULL_SCALE: f64 = 32768.0;

/// Multipliers turning a full-scale ratio into physical units
pub mod scale {
    /// Accelerometer range ±16 g
    pub const ACCEL_G: f64 = 16.0;
    /// Euler angle range ±180°
    pub const ANGLE_DEG: f64 = 180.0;
}

/// Position and scaling of one field inside a payload
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub low: usize,
    pub high: usize,
    pub multiplier: f64,
    pub class: FieldClass,
}

impl FieldSpec {
    const fn accel(low: usize) -> Self {
        Self {
            low,
            high: low + 1,
            multiplier: scale::ACCEL_G,
            class: FieldClass::Acceleration,
        }
    }

    const fn angle(low: usize) -> Self {
        Self {
            low,
            high: low + 1,
            multiplier: scale::ANGLE_DEG,
            class: FieldClass::Angle,
        }
    }

    /// Raw two's-complement value of this field
    pub fn raw(&self, bytes: &[u8]) -> i16 {
        i16::from_le_bytes([bytes[self.low], bytes[self.high]])
    }

    /// Scaled value rounded to 3 decimals
    pub fn value(&self, bytes: &[u8]) -> f64 {
        round_millis(scale_raw(self.raw(bytes), self.multiplier))
    }
}

/// Payload layout
///
/// ```text
/// [0-1]   : Frame header (not validated)
/// [2-3]   : Accel X (i16 little-endian)
/// [4-5]   : Accel Y
/// [6-7]   : Accel Z
/// [8-13]  : Angular velocity (unused)
/// [14-15] : Roll
/// [16-17] : Pitch
/// [18-19] : Yaw
/// ```
pub mod layout {
    use super::FieldSpec;

    pub const X: FieldSpec = FieldSpec::accel(2);
    pub const Y: FieldSpec = FieldSpec::accel(4);
    pub const Z: FieldSpec = FieldSpec::accel(6);
    pub const ROLL: FieldSpec = FieldSpec::angle(14);
    pub const PITCH: FieldSpec = FieldSpec::angle(16);
    pub const YAW: FieldSpec = FieldSpec::angle(18);
}

/// `raw / 32768 * multiplier`, unrounded
pub fn scale_raw(raw: i16, multiplier: f64) -> f64 {
    raw as f64 / FULL_SCALE * multiplier
}

fn round_millis(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Decode a payload into physical units without clamping.
pub fn decode_raw(bytes: &[u8]) -> Result<OrientationReading, PipelineError> {
    if bytes.len() < MIN_PAYLOAD_LEN {
        return Err(PipelineError::InsufficientData {
            len: bytes.len(),
            required: MIN_PAYLOAD_LEN,
        });
    }

    #[cfg(debug_assertions)]
    trace!("Raw packet: {:02X?}", bytes);

    Ok(OrientationReading {
        x: layout::X.value(bytes),
        y: layout::Y.value(bytes),
        z: layout::Z.value(bytes),
        roll: layout::ROLL.value(bytes),
        pitch: layout::PITCH.value(bytes),
        yaw: layout::YAW.value(bytes),
    })
}

/// Decode a payload and clamp each field by its class range.
pub fn decode(bytes: &[u8], policy: &ClampPolicy) -> Result<OrientationReading, PipelineError> {
    let raw = decode_raw(bytes)?;
    let accel = policy.range_for(FieldClass::Acceleration);
    let angle = policy.range_for(FieldClass::Angle);

    Ok(OrientationReading {
        x: accel.apply(raw.x),
        y: accel.apply(raw.y),
        z: accel.apply(raw.z),
        roll: angle.apply(raw.roll),
        pitch: angle.apply(raw.pitch),
        yaw: angle.apply(raw.yaw),
    })
}

/// Parse a UUID string, accepting the usual hyphenated form.
pub fn parse_uuid(uuid_str: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(uuid_str.trim())
        .map_err(|e| anyhow::anyhow!("Invalid UUID format '{}': {}", uuid_str, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clamp::ClampRange;

    fn payload_with(field: FieldSpec, word: u16) -> Vec<u8> {
        let mut bytes = vec![0u8; MIN_PAYLOAD_LEN];
        let [lo, hi] = word.to_le_bytes();
        bytes[field.low] = lo;
        bytes[field.high] = hi;
        bytes
    }

    #[test]
    fn test_parse_uuid() {
        let uuid = parse_uuid(SERVICE_UUID).unwrap();
        assert_eq!(uuid.as_fields().0, 0x0000ffe5);
        assert!(parse_uuid("not-a-uuid").is_err());
    }

    #[test]
    fn test_settings_defaults_name_the_sensor_uuids() {
        let settings = crate::domain::settings::Settings::default();
        assert_eq!(
            parse_uuid(&settings.ble_service_uuid).unwrap(),
            parse_uuid(SERVICE_UUID).unwrap()
        );
        assert_eq!(
            parse_uuid(&settings.ble_notify_char_uuid).unwrap().as_fields().0,
            0x0000ffe4
        );
    }

    #[test]
    fn test_short_payload_is_insufficient() {
        let err = decode_raw(&[0u8; 19]).unwrap_err();
        assert_eq!(
            err,
            PipelineError::InsufficientData {
                len: 19,
                required: 20
            }
        );
        assert!(decode(&[], &ClampPolicy::default()).is_err());
    }

    #[test]
    fn test_longer_payload_is_accepted() {
        let mut bytes = payload_with(layout::Y, 0x0800);
        bytes.extend_from_slice(&[0xFF; 12]);
        let reading = decode_raw(&bytes).unwrap();
        assert_eq!(reading.y, 1.0);
    }

    #[test]
    fn test_twos_complement_sweep() {
        for word in (0..=u16::MAX).step_by(97).chain([0x7FFF, 0x8000, 0xFFFF]) {
            let expected_signed = if word < 0x8000 {
                word as i32
            } else {
                word as i32 - 0x1_0000
            };
            for field in [layout::X, layout::ROLL] {
                let bytes = payload_with(field, word);
                assert_eq!(field.raw(&bytes) as i32, expected_signed);

                let expected =
                    (expected_signed as f64 / 32768.0 * field.multiplier * 1000.0).round() / 1000.0;
                assert_eq!(field.value(&bytes), expected, "word {:#06X}", word);
            }
        }
    }

    #[test]
    fn test_positive_full_scale_boundary() {
        let bytes = payload_with(layout::X, 0x7FFF);
        assert_eq!(scale_raw(layout::X.raw(&bytes), scale::ACCEL_G), 15.99951171875);
        assert_eq!(decode_raw(&bytes).unwrap().x, 16.0);
        assert_eq!(decode(&bytes, &ClampPolicy::default()).unwrap().x, 1.0);
    }

    #[test]
    fn test_negative_full_scale_boundary() {
        let bytes = payload_with(layout::X, 0x8000);
        assert_eq!(decode_raw(&bytes).unwrap().x, -16.0);
        assert_eq!(decode(&bytes, &ClampPolicy::default()).unwrap().x, -1.0);
    }

    #[test]
    fn test_acceleration_example_frame() {
        let mut bytes = vec![0u8; MIN_PAYLOAD_LEN];
        bytes[2..8].copy_from_slice(&[0x00, 0x40, 0x00, 0x00, 0x00, 0xC0]);

        let raw = decode_raw(&bytes).unwrap();
        assert_eq!((raw.x, raw.y, raw.z), (8.0, 0.0, -8.0));

        let clamped = decode(&bytes, &ClampPolicy::default()).unwrap();
        assert_eq!((clamped.x, clamped.y, clamped.z), (1.0, 0.0, -1.0));
    }

    #[test]
    fn test_angles_use_degree_scale() {
        // 0x2000 = 8192 -> 45°
        let mut bytes = payload_with(layout::ROLL, 0x2000);
        bytes[layout::PITCH.low..=layout::PITCH.high].copy_from_slice(&0xE000u16.to_le_bytes());
        bytes[layout::YAW.low..=layout::YAW.high].copy_from_slice(&0x0010u16.to_le_bytes());

        let raw = decode_raw(&bytes).unwrap();
        assert_eq!(raw.roll, 45.0);
        assert_eq!(raw.pitch, -45.0);
        // 16 / 32768 * 180 = 0.087890625
        assert_eq!(raw.yaw, 0.088);

        let clamped = decode(&bytes, &ClampPolicy::default()).unwrap();
        assert_eq!((clamped.roll, clamped.pitch, clamped.yaw), (1.0, -1.0, 0.088));
    }

    #[test]
    fn test_wider_angle_policy_keeps_degrees() {
        let bytes = payload_with(layout::ROLL, 0x2000);
        let policy = ClampPolicy {
            angle: ClampRange::new(-180.0, 180.0),
            ..Default::default()
        };
        assert_eq!(decode(&bytes, &policy).unwrap().roll, 45.0);
    }

    #[test]
    fn test_header_bytes_are_ignored() {
        let mut bytes = payload_with(layout::Z, 0x0400);
        bytes[0] = 0x55;
        bytes[1] = 0x61;
        bytes[8..14].copy_from_slice(&[0xAB; 6]);
        let reading = decode_raw(&bytes).unwrap();
        assert_eq!(reading.z, 0.5);
        assert_eq!(reading.x, 0.0);
    }
}
