//! Audio module
//!
//! Handles output device selection, click sample decoding and sample playback.

mod bank;
mod device;
mod error;
mod sample;

pub use bank::{CpalSoundBank, CpalTrigger, SampleTrigger, SoundBank, SoundBankConfig};
pub use device::{list_output_devices, AudioDevice, DeviceId};
pub use error::AudioError;
pub use sample::{Channel, SampleData, SampleId, SamplePaths, SampleSet};
