//! metronomnom - command-line metronome
//!
//! This library provides the beat-scheduling engine, the audio output it
//! drives and the interactive shell used by the `metronomnom` binary.

pub mod audio;
pub mod config;
pub mod metronome;
pub mod shell;

pub use audio::{CpalSoundBank, SoundBank, SoundBankConfig};
pub use config::AppConfig;
pub use metronome::{MetronomeConfig, MetronomeEngine, MetronomeError, RhythmMode};
