//! Metronome core
//!
//! Beat timing arithmetic, rhythm modes and the scheduling engine that fires
//! click samples and beat callbacks on a dedicated thread.

mod clock;
mod engine;
mod error;
mod rhythm;

pub use clock::{beat_interval, subdivision_interval, BeatCounter};
pub use engine::{BeatCallback, MetronomeConfig, MetronomeEngine, STOP_JOIN_TIMEOUT};
pub use error::MetronomeError;
pub use rhythm::RhythmMode;

/// Slowest accepted tempo
pub const MIN_BPM: u32 = 10;
/// Fastest accepted tempo
pub const MAX_BPM: u32 = 400;
/// Smallest time-signature numerator
pub const MIN_BEATS_PER_MEASURE: u32 = 1;
/// Largest time-signature numerator
pub const MAX_BEATS_PER_MEASURE: u32 = 9;
/// Beat unit of every time signature (quarter note)
pub const BEAT_UNIT: u32 = 4;

/// Check that `bpm` is within [`MIN_BPM`, `MAX_BPM`]
pub fn validate_bpm(bpm: u32) -> Result<u32, MetronomeError> {
    if (MIN_BPM..=MAX_BPM).contains(&bpm) {
        Ok(bpm)
    } else {
        Err(MetronomeError::InvalidBpm(bpm))
    }
}

/// Check that `beats` is a supported time-signature numerator
pub fn validate_beats_per_measure(beats: u32) -> Result<u32, MetronomeError> {
    if (MIN_BEATS_PER_MEASURE..=MAX_BEATS_PER_MEASURE).contains(&beats) {
        Ok(beats)
    } else {
        Err(MetronomeError::InvalidTimeSignature(beats))
    }
}
