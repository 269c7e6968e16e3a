//! Click samples: identities, file locations and decoding
//!
//! The metronome needs exactly three samples: the downbeat played on beat one,
//! the upbeat played on every other beat, and the subdivision click.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::AudioError;

/// Identity of one of the three required samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleId {
    /// First beat of the measure
    Downbeat,
    /// Every other main beat
    Upbeat,
    /// Secondary clicks inside a beat
    Subdivision,
}

impl SampleId {
    /// All samples, in load order
    pub const ALL: [SampleId; 3] = [SampleId::Downbeat, SampleId::Upbeat, SampleId::Subdivision];

    pub fn name(self) -> &'static str {
        match self {
            SampleId::Downbeat => "downbeat",
            SampleId::Upbeat => "upbeat",
            SampleId::Subdivision => "subdivision",
        }
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output mixer channel a sample is played on
///
/// Each channel plays one sample at a time; triggering a busy channel restarts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Regular beats
    Beat,
    /// First beat accent
    Accent,
    /// Subdivisions
    Subdivision,
}

impl Channel {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        match self {
            Channel::Beat => 0,
            Channel::Accent => 1,
            Channel::Subdivision => 2,
        }
    }
}

/// Locations of the three sample files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SamplePaths {
    #[serde(default = "default_downbeat")]
    pub downbeat: PathBuf,
    #[serde(default = "default_upbeat")]
    pub upbeat: PathBuf,
    #[serde(default = "default_subdivision")]
    pub subdivision: PathBuf,
}

fn default_downbeat() -> PathBuf {
    PathBuf::from("sounds/4c.wav")
}

fn default_upbeat() -> PathBuf {
    PathBuf::from("sounds/4d.wav")
}

fn default_subdivision() -> PathBuf {
    PathBuf::from("sounds/tripl.wav")
}

impl Default for SamplePaths {
    fn default() -> Self {
        Self {
            downbeat: default_downbeat(),
            upbeat: default_upbeat(),
            subdivision: default_subdivision(),
        }
    }
}

impl SamplePaths {
    /// Build paths for the default file names inside `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            downbeat: dir.join("4c.wav"),
            upbeat: dir.join("4d.wav"),
            subdivision: dir.join("tripl.wav"),
        }
    }

    pub fn path(&self, id: SampleId) -> &Path {
        match id {
            SampleId::Downbeat => &self.downbeat,
            SampleId::Upbeat => &self.upbeat,
            SampleId::Subdivision => &self.subdivision,
        }
    }

    /// Verify that every sample file exists, reporting the first missing one
    pub fn check(&self) -> Result<(), AudioError> {
        for id in SampleId::ALL {
            if !self.path(id).is_file() {
                return Err(AudioError::MissingSample(id));
            }
        }
        Ok(())
    }
}

/// A decoded mono sample
#[derive(Debug, Clone)]
pub struct SampleData {
    frames: Arc<[f32]>,
    sample_rate: u32,
}

impl SampleData {
    pub fn from_frames(frames: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            frames: frames.into(),
            sample_rate,
        }
    }

    /// Decode a WAV file, mixing all channels down to mono
    pub fn decode(id: SampleId, path: &Path) -> Result<Self, AudioError> {
        let decode_err = |e: hound::Error| AudioError::Decode {
            sample: id,
            reason: e.to_string(),
        };

        let reader = hound::WavReader::open(path).map_err(decode_err)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(decode_err)?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(decode_err)?
            }
        };

        let frames: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        debug!(
            "Decoded {} sample from {}: {} frames @ {} Hz",
            id,
            path.display(),
            frames.len(),
            spec.sample_rate
        );

        Ok(Self::from_frames(frames, spec.sample_rate))
    }

    pub fn frames(&self) -> &Arc<[f32]> {
        &self.frames
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames.len() as f64 / self.sample_rate as f64)
    }
}

/// The three decoded samples
#[derive(Debug, Clone)]
pub struct SampleSet {
    downbeat: SampleData,
    upbeat: SampleData,
    subdivision: SampleData,
}

impl SampleSet {
    /// Check that all files exist, then decode them
    pub fn load(paths: &SamplePaths) -> Result<Self, AudioError> {
        paths.check()?;
        Ok(Self {
            downbeat: SampleData::decode(SampleId::Downbeat, &paths.downbeat)?,
            upbeat: SampleData::decode(SampleId::Upbeat, &paths.upbeat)?,
            subdivision: SampleData::decode(SampleId::Subdivision, &paths.subdivision)?,
        })
    }

    pub fn get(&self, id: SampleId) -> &SampleData {
        match id {
            SampleId::Downbeat => &self.downbeat,
            SampleId::Upbeat => &self.upbeat,
            SampleId::Subdivision => &self.subdivision,
        }
    }
}
