//! Interactive session: one command in, one or more statuses out
//!
//! A session owns at most one engine. Entering a valid BPM creates and starts an
//! engine through the factory; `s` stops and discards it.

use tracing::{debug, warn};

use crate::audio::{AudioError, SoundBank};
use crate::metronome::{MetronomeConfig, MetronomeEngine, MetronomeError, RhythmMode};

use super::command::{parse_command, Command};
use super::messages::Status;

/// Result of handling one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub statuses: Vec<Status>,
    /// The shell should exit
    pub quit: bool,
}

impl Reply {
    fn one(status: Status) -> Self {
        Self {
            statuses: vec![status],
            quit: false,
        }
    }
}

/// Convert an engine error into a language-independent status
pub fn failure_status(error: &MetronomeError) -> Status {
    let detail = match error {
        MetronomeError::Audio(AudioError::MissingSample(id)) => id.name().to_string(),
        MetronomeError::Audio(AudioError::Decode { sample, .. }) => sample.name().to_string(),
        MetronomeError::Audio(AudioError::AudioUnavailable(_))
        | MetronomeError::Audio(AudioError::DeviceNotFound(_))
        | MetronomeError::Audio(AudioError::DeviceLost) => String::new(),
        other => other.to_string(),
    };
    Status::Failed {
        code: error.code(),
        detail,
    }
}

/// Shell state: the active engine and the time signature for the next one
pub struct Session<B, F>
where
    B: SoundBank,
    F: FnMut(MetronomeConfig) -> Result<MetronomeEngine<B>, MetronomeError>,
{
    factory: F,
    engine: Option<MetronomeEngine<B>>,
    beats_per_measure: u32,
}

impl<B, F> Session<B, F>
where
    B: SoundBank,
    F: FnMut(MetronomeConfig) -> Result<MetronomeEngine<B>, MetronomeError>,
{
    pub fn new(factory: F, beats_per_measure: u32) -> Self {
        Self {
            factory,
            engine: None,
            beats_per_measure,
        }
    }

    /// The active engine, if any
    pub fn engine(&self) -> Option<&MetronomeEngine<B>> {
        self.engine.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.engine.as_ref().is_some_and(|e| e.is_running())
    }

    /// Time signature used for the next engine
    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure
    }

    /// Report a run that ended on its own since the last call
    pub fn poll_failure(&mut self) -> Option<Status> {
        let failure = self.engine.as_ref()?.take_failure()?;
        warn!("Metronome stopped unexpectedly: {}", failure);
        Some(failure_status(&failure))
    }

    pub fn handle_line(&mut self, line: &str) -> Reply {
        let failure = self.poll_failure();
        let mut reply = match parse_command(line) {
            Ok(command) => {
                debug!("Command: {:?}", command);
                self.handle_command(command)
            }
            Err(e) => Reply::one(Status::InvalidInput(e)),
        };
        if let Some(failure) = failure {
            reply.statuses.insert(0, failure);
        }
        reply
    }

    pub fn handle_command(&mut self, command: Command) -> Reply {
        match command {
            Command::Quit => {
                self.stop();
                Reply {
                    statuses: vec![Status::Goodbye],
                    quit: true,
                }
            }
            Command::Stop => {
                if self.stop() {
                    Reply::one(Status::Stopped)
                } else {
                    Reply::one(Status::NotRunning)
                }
            }
            Command::Mode(mode) => Reply::one(self.set_mode(mode)),
            Command::TimeSignature(beats) => Reply::one(self.set_time_signature(beats)),
            Command::ZeroBpm => Reply::one(Status::ZeroBpm),
            Command::Bpm(bpm) => Reply::one(self.set_bpm(bpm)),
        }
    }

    /// Stop and discard the engine. Returns whether one existed.
    pub fn stop(&mut self) -> bool {
        match self.engine.take() {
            Some(mut engine) => {
                engine.stop();
                true
            }
            None => false,
        }
    }

    fn set_mode(&mut self, mode: RhythmMode) -> Status {
        match self.engine.as_ref() {
            Some(engine) if engine.is_running() => Status::ModeChanged(engine.set_rhythm_mode(mode)),
            _ => Status::ModeChangeWhileStopped,
        }
    }

    fn set_time_signature(&mut self, beats: u32) -> Status {
        self.beats_per_measure = beats;
        match self.engine.as_ref() {
            Some(engine) => match engine.set_time_signature(beats) {
                Ok(()) => Status::TimeSignatureChanged { beats },
                Err(e) => failure_status(&e),
            },
            None => Status::TimeSignaturePending { beats },
        }
    }

    fn set_bpm(&mut self, bpm: u32) -> Status {
        if let Some(engine) = self.engine.as_mut() {
            if let Err(e) = engine.update_bpm(bpm) {
                return failure_status(&e);
            }
            if engine.is_running() {
                return Status::TempoChanged { bpm };
            }
            // The previous run ended on its own; start again at the new tempo
            return match engine.start() {
                Ok(()) => Status::Started { bpm },
                Err(e) => failure_status(&e),
            };
        }

        let config = MetronomeConfig::new(bpm).with_beats_per_measure(self.beats_per_measure);
        let mut engine = match (self.factory)(config) {
            Ok(engine) => engine,
            Err(e) => return failure_status(&e),
        };
        match engine.start() {
            Ok(()) => {
                self.engine = Some(engine);
                Status::Started { bpm }
            }
            Err(e) => failure_status(&e),
        }
    }
}

impl<B, F> Drop for Session<B, F>
where
    B: SoundBank,
    F: FnMut(MetronomeConfig) -> Result<MetronomeEngine<B>, MetronomeError>,
{
    fn drop(&mut self) {
        self.stop();
    }
}
