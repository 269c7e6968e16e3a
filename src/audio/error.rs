//! Audio error types

use thiserror::Error;

use super::sample::SampleId;

/// Errors that can occur in the audio subsystem
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio output unavailable: {0}")]
    AudioUnavailable(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Missing {0} sample")]
    MissingSample(SampleId),

    #[error("Failed to decode {sample} sample: {reason}")]
    Decode { sample: SampleId, reason: String },

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Output device disconnected")]
    DeviceLost,

    #[error("{0} sample not loaded")]
    SampleUnavailable(SampleId),

    #[error("Audio output is not open")]
    NotOpen,
}

impl AudioError {
    /// Stable identifier for the error, independent of any message language
    pub fn code(&self) -> &'static str {
        match self {
            AudioError::AudioUnavailable(_) | AudioError::DeviceNotFound(_) => "AUDIO_UNAVAILABLE",
            AudioError::MissingSample(_) => "MISSING_SAMPLE",
            AudioError::Decode { .. } => "SAMPLE_DECODE",
            AudioError::StreamError(_) => "STREAM_ERROR",
            AudioError::DeviceLost => "DEVICE_LOST",
            AudioError::SampleUnavailable(_) => "SAMPLE_UNAVAILABLE",
            AudioError::NotOpen => "AUDIO_NOT_OPEN",
        }
    }
}
