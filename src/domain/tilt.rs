//! Tilt angle helpers for the comparison view.
//!
//! A sensor's tilt is the angle between its Y axis and gravity, recovered
//! from the clamped Y acceleration as `acos(y)`.

use crate::domain::clamp::clamp_unit;
use crate::domain::models::OrientationReading;

const RAD_TO_DEG: f64 = 57.29578;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Tilt of a sensor in degrees, in [0, 180].
///
/// `y` is clamped defensively; stored readings are already within [-1, 1]
/// under the default policy.
pub fn tilt_degrees(reading: &OrientationReading) -> f64 {
    clamp_unit(reading.y).acos() * RAD_TO_DEG
}

/// Needle rotation, whole degrees.
pub fn needle_rotation(reading: &OrientationReading) -> f64 {
    round_to(tilt_degrees(reading), 0)
}

/// Difference between two tilts to one decimal. Each tilt is rounded first.
pub fn tilt_difference(first: &OrientationReading, second: &OrientationReading) -> f64 {
    round_to(
        round_to(tilt_degrees(first), 1) - round_to(tilt_degrees(second), 1),
        1,
    )
}
