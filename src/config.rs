//! Configuration file
//!
//! Settings are read from a JSON file and may be overridden on the command line.
//! Every field is optional in the file:
//!
//! ```json
//! {
//!   "language": "fr",
//!   "beats_per_measure": 3,
//!   "samples": { "downbeat": "sounds/4c.wav" },
//!   "output_device": "pulse",
//!   "volume": 0.6
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::audio::{DeviceId, SamplePaths, SoundBankConfig};
use crate::metronome::{validate_beats_per_measure, validate_bpm, MetronomeError};
use crate::shell::Language;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] MetronomeError),

    #[error("Invalid volume: {0}. Must be between 0.0 and 1.0")]
    InvalidVolume(f32),
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Message language for the shell
    pub language: Language,

    /// Tempo to start with when none is given on the command line
    pub bpm: Option<u32>,

    /// Time signature numerator for new metronomes
    pub beats_per_measure: u32,

    /// Click sample files
    pub samples: SamplePaths,

    /// Output device name (None = system default)
    pub output_device: Option<String>,

    /// Click volume (0.0 - 1.0)
    pub volume: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            bpm: None,
            beats_per_measure: 4,
            samples: SamplePaths::default(),
            output_device: None,
            volume: 0.8,
        }
    }
}

impl AppConfig {
    /// Read and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&content)?;
        debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(bpm) = self.bpm {
            validate_bpm(bpm)?;
        }
        validate_beats_per_measure(self.beats_per_measure)?;
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(ConfigError::InvalidVolume(self.volume));
        }
        Ok(())
    }

    /// Sound bank settings derived from this configuration
    pub fn sound_bank_config(&self) -> SoundBankConfig {
        SoundBankConfig {
            samples: self.samples.clone(),
            output_device: self.output_device.clone().map(DeviceId),
            volume: self.volume,
        }
    }
}
