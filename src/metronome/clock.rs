//! Beat timing arithmetic and measure position

use std::time::Duration;

use super::error::MetronomeError;
use super::rhythm::RhythmMode;

/// Seconds between consecutive main beats at `bpm`
pub fn beat_interval(bpm: u32) -> Result<Duration, MetronomeError> {
    if bpm == 0 {
        return Err(MetronomeError::Domain("beat interval of 0 BPM".into()));
    }
    Ok(Duration::from_secs_f64(60.0 / bpm as f64))
}

/// Spacing of subdivision clicks inside one beat
///
/// Normal mode has a single slot, so the beat interval itself is returned.
pub fn subdivision_interval(beat_interval: Duration, mode: RhythmMode) -> Duration {
    beat_interval / mode.subdivisions()
}

/// 1-based position within the measure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatCounter {
    current: u32,
    beats_per_measure: u32,
}

impl BeatCounter {
    pub fn new(beats_per_measure: u32) -> Self {
        Self {
            current: 1,
            beats_per_measure: beats_per_measure.max(1),
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure
    }

    pub fn is_downbeat(&self) -> bool {
        self.current == 1
    }

    /// Advance one beat, wrapping to 1 after the last beat of the measure
    pub fn increment(&mut self) -> u32 {
        self.current = if self.current < self.beats_per_measure {
            self.current + 1
        } else {
            1
        };
        self.current
    }

    /// Change the measure length and go back to the first beat
    pub fn set_beats_per_measure(&mut self, beats_per_measure: u32) {
        self.beats_per_measure = beats_per_measure.max(1);
        self.current = 1;
    }
}

impl Default for BeatCounter {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metronome::{MAX_BPM, MIN_BPM};

    #[test]
    fn test_beat_interval_matches_bpm() {
        for bpm in MIN_BPM..=MAX_BPM {
            let interval = beat_interval(bpm).unwrap().as_secs_f64();
            assert!((interval - 60.0 / bpm as f64).abs() < 1e-9, "bpm {}", bpm);
        }
    }

    #[test]
    fn test_beat_interval_zero_is_domain_error() {
        assert!(matches!(beat_interval(0), Err(MetronomeError::Domain(_))));
    }

    #[test]
    fn test_subdivision_interval() {
        let beat = beat_interval(60).unwrap();
        let secs = |mode| subdivision_interval(beat, mode).as_secs_f64();

        assert!((secs(RhythmMode::Normal) - 1.0).abs() < 1e-9);
        assert!((secs(RhythmMode::Eighth) - 0.5).abs() < 1e-9);
        assert!((secs(RhythmMode::Triplet) - 1.0 / 3.0).abs() < 1e-6);
        assert!((secs(RhythmMode::Sixteenth) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_counter_wraps() {
        let mut counter = BeatCounter::new(4);
        assert_eq!(counter.current(), 1);

        let seq: Vec<u32> = (0..4).map(|_| counter.increment()).collect();
        assert_eq!(seq, vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_counter_single_beat_measure() {
        let mut counter = BeatCounter::new(1);
        assert_eq!(counter.increment(), 1);
        assert!(counter.is_downbeat());
    }

    #[test]
    fn test_set_beats_per_measure_resets() {
        let mut counter = BeatCounter::new(4);
        counter.increment();
        counter.increment();
        counter.set_beats_per_measure(3);

        assert_eq!(counter.current(), 1);
        assert_eq!(counter.beats_per_measure(), 3);
        let seq: Vec<u32> = (0..4).map(|_| counter.increment()).collect();
        assert_eq!(seq, vec![2, 3, 1, 2]);
    }
}
