use crate::domain::models::{PipelineState, SensorIdentity};

/// Errors raised while turning notifications into stored readings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// Payload too short to hold every field. The frame is dropped.
    #[error("Insufficient data: got {len} bytes, need at least {required}")]
    InsufficientData { len: usize, required: usize },

    /// A transport request was rejected, timed out or the link went away.
    #[error("Transport failure while {stage:?}: {message}")]
    TransportFailure {
        stage: PipelineState,
        message: String,
    },

    /// The identity is not one of the configured sensors.
    #[error("Unknown sensor identity: {0}")]
    UnknownIdentity(SensorIdentity),
}

impl PipelineError {
    pub fn transport(stage: PipelineState, err: impl std::fmt::Display) -> Self {
        Self::TransportFailure {
            stage,
            message: err.to_string(),
        }
    }
}
