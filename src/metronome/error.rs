//! Metronome error types

use thiserror::Error;

use crate::audio::AudioError;

/// Errors that can occur in the metronome core
#[derive(Error, Debug)]
pub enum MetronomeError {
    #[error("BPM must be between 10 and 400, got {0}")]
    InvalidBpm(u32),

    #[error("Unknown rhythm mode: {0}")]
    InvalidMode(String),

    #[error("Beats per measure must be between 1 and 9, got {0}")]
    InvalidTimeSignature(u32),

    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Failed to spawn scheduling thread: {0}")]
    Thread(#[from] std::io::Error),

    #[error(transparent)]
    Audio(#[from] AudioError),
}

impl MetronomeError {
    /// Stable identifier for the error, independent of any message language
    pub fn code(&self) -> &'static str {
        match self {
            MetronomeError::InvalidBpm(_) => "INVALID_BPM",
            MetronomeError::InvalidMode(_) => "INVALID_MODE",
            MetronomeError::InvalidTimeSignature(_) => "INVALID_TIME_SIGNATURE",
            MetronomeError::Domain(_) => "DOMAIN",
            MetronomeError::Thread(_) => "THREAD",
            MetronomeError::Audio(e) => e.code(),
        }
    }
}
