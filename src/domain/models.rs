use serde::{Deserialize, Serialize};
use std::fmt;

/// Hardware address of a tracked sensor.
///
/// Addresses are normalized to upper case so `e8:96:...` and `E8:96:...`
/// route to the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SensorIdentity(String);

impl SensorIdentity {
    pub fn new(address: impl AsRef<str>) -> Self {
        Self(address.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SensorIdentity {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<SensorIdentity> for String {
    fn from(value: SensorIdentity) -> Self {
        value.0
    }
}

impl fmt::Display for SensorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One decoded, clamped sample from a sensor
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientationReading {
    // Acceleration (g)
    pub x: f64,
    pub y: f64,
    pub z: f64,

    // Euler angles (degrees)
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// A notification payload as delivered by the transport
#[derive(Debug, Clone)]
pub struct RawNotification {
    pub identity: SensorIdentity,
    pub characteristic_uuid: uuid::Uuid,
    pub payload: Vec<u8>,
}

/// Connection progress of a single sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Scanning,
    Connecting,
    DiscoveringServices,
    Subscribing,
    Streaming,
    Failed,
}

impl PipelineState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Scanning => "SCANNING...",
            Self::Connecting => "CONNECTING...",
            Self::DiscoveringServices => "DISCOVERING SERVICES...",
            Self::Subscribing => "SUBSCRIBING...",
            Self::Streaming => "STREAMING",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    PipelineState(SensorIdentity, PipelineState),
    LogMessage(StatusMessage),
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_case_insensitive() {
        assert_eq!(
            SensorIdentity::new("e8:96:68:03:a1:5e"),
            SensorIdentity::new("E8:96:68:03:A1:5E")
        );
    }

    #[test]
    fn test_identity_serde_normalizes() {
        let id: SensorIdentity = serde_json::from_str("\" ee:29:f5:3f:06:a1 \"").unwrap();
        assert_eq!(id.as_str(), "EE:29:F5:3F:06:A1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"EE:29:F5:3F:06:A1\"");
    }

    #[test]
    fn test_default_reading_is_zeroed() {
        let reading = OrientationReading::default();
        assert_eq!(reading.x, 0.0);
        assert_eq!(reading.yaw, 0.0);
    }
}
