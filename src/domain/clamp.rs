//! Reading Clamp
//!
//! Bounds scaled sensor values to the range the rest of the pipeline
//! expects. The viewer feeds `y` into `acos`, so anything outside [-1, 1]
//! would produce NaN there.

use serde::{Deserialize, Serialize};

/// Inclusive bounds for one class of field.
///
/// `min <= max` always holds; swapped bounds from a settings file are put
/// back in order on load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RangeBounds")]
pub struct ClampRange {
    pub min: f64,
    pub max: f64,
}

/// Bounds exactly as written in the settings file
#[derive(Deserialize)]
struct RangeBounds {
    min: f64,
    max: f64,
}

impl From<RangeBounds> for ClampRange {
    fn from(bounds: RangeBounds) -> Self {
        ClampRange::new(bounds.min, bounds.max)
    }
}

impl ClampRange {
    pub const UNIT: ClampRange = ClampRange {
        min: -1.0,
        max: 1.0,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    /// Clamp `value` into this range.
    ///
    /// Total over finite input. NaN never comes out of the decoder, so it is
    /// treated as a programming error.
    pub fn apply(&self, value: f64) -> f64 {
        debug_assert!(!value.is_nan(), "clamp received NaN");
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

impl Default for ClampRange {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Clamp ranges per field class.
///
/// Both classes default to [-1, 1]. For angles this throws away almost all of
/// the ±180° resolution, but it is what the sensor viewer has always shown.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClampPolicy {
    #[serde(default)]
    pub acceleration: ClampRange,
    #[serde(default)]
    pub angle: ClampRange,
}

impl ClampPolicy {
    pub fn range_for(&self, class: FieldClass) -> ClampRange {
        match class {
            FieldClass::Acceleration => self.acceleration,
            FieldClass::Angle => self.angle,
        }
    }
}

/// Which clamp range a decoded field falls under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    Acceleration,
    Angle,
}

/// Clamp to [-1, 1].
pub fn clamp_unit(value: f64) -> f64 {
    ClampRange::UNIT.apply(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_unit_bounds() {
        assert_eq!(clamp_unit(-1.5), -1.0);
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(-1.0), -1.0);
        assert_eq!(clamp_unit(1.0), 1.0);
    }

    #[test]
    fn test_clamp_is_idempotent_and_bounded() {
        for v in [-1e9, -180.0, -16.0, -1.0001, -0.5, 0.0, 0.999, 3.125, 15.999, 1e9] {
            let once = clamp_unit(v);
            assert_eq!(clamp_unit(once), once);
            assert!((-1.0..=1.0).contains(&once), "{} -> {}", v, once);
        }
    }

    #[test]
    fn test_default_policy_clamps_angles_to_unit_range() {
        // Angles share the acceleration range unless configured otherwise.
        let policy = ClampPolicy::default();
        assert_eq!(policy.acceleration, ClampRange::new(-1.0, 1.0));
        assert_eq!(policy.angle, ClampRange::new(-1.0, 1.0));
        assert_eq!(policy.angle.apply(90.0), 1.0);
        assert_eq!(policy.angle.apply(-179.5), -1.0);
    }

    #[test]
    fn test_custom_angle_range() {
        let policy = ClampPolicy {
            angle: ClampRange::new(-180.0, 180.0),
            ..Default::default()
        };
        assert_eq!(policy.angle.apply(90.0), 90.0);
        assert_eq!(policy.acceleration.apply(2.0), 1.0);
    }

    #[test]
    fn test_policy_deserializes_with_missing_fields() {
        let policy: ClampPolicy =
            serde_json::from_str(r#"{"angle":{"min":-180.0,"max":180.0}}"#).unwrap();
        assert_eq!(policy.acceleration, ClampRange::UNIT);
        assert_eq!(policy.angle.max, 180.0);
    }

    #[test]
    fn test_swapped_bounds_are_reordered() {
        let range = ClampRange::new(1.0, -1.0);
        assert_eq!(range, ClampRange::UNIT);
        assert_eq!(range.apply(5.0), 1.0);
        assert_eq!(range.apply(-5.0), -1.0);

        let policy: ClampPolicy =
            serde_json::from_str(r#"{"angle":{"min":180.0,"max":-180.0}}"#).unwrap();
        assert_eq!(policy.angle, ClampRange::new(-180.0, 180.0));
        assert_eq!(policy.angle.apply(90.0), 90.0);
        assert_eq!(policy.angle.apply(200.0), 180.0);
    }
}
