//! Sound bank: owns the output device and the loaded click samples
//!
//! The scheduling loop never touches decoding or device handling. It receives a
//! [`SampleTrigger`] from [`SoundBank::load`] and calls
//! `trigger(sample, channel)` on it; everything else lives behind this seam.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::Stream;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::{debug, error, info, warn};

use super::device::{find_output_device, DeviceId};
use super::error::AudioError;
use super::sample::{Channel, SampleId, SamplePaths, SampleSet};

/// Pending play events between the scheduling thread and the audio callback
const TRIGGER_QUEUE_CAPACITY: usize = 64;

/// Fires loaded samples on output channels. Moved into the scheduling thread.
pub trait SampleTrigger: Send + 'static {
    fn trigger(&mut self, sample: SampleId, channel: Channel) -> Result<(), AudioError>;
}

/// Owner of the audio output context and the three click samples
pub trait SoundBank {
    type Trigger: SampleTrigger;

    /// Acquire the output device
    fn open(&mut self) -> Result<(), AudioError>;

    /// Load the samples and hand out a trigger bound to the open output
    ///
    /// Fails with [`AudioError::MissingSample`] naming the first absent sample.
    fn load(&mut self) -> Result<Self::Trigger, AudioError>;

    /// Release the output device. Triggers handed out earlier stop producing sound.
    fn close(&mut self);
}

/// Configuration for [`CpalSoundBank`]
#[derive(Debug, Clone)]
pub struct SoundBankConfig {
    /// Sample file locations
    pub samples: SamplePaths,
    /// Output device (None = system default)
    pub output_device: Option<DeviceId>,
    /// Click volume (0.0 - 1.0)
    pub volume: f32,
}

impl Default for SoundBankConfig {
    fn default() -> Self {
        Self {
            samples: SamplePaths::default(),
            output_device: None,
            volume: 0.8,
        }
    }
}

/// Request to start a sample on a channel
#[derive(Debug, Clone)]
pub(crate) struct PlayEvent {
    channel: Channel,
    frames: Arc<[f32]>,
    /// Source frames advanced per output frame
    step: f64,
}

#[derive(Debug)]
struct Voice {
    frames: Arc<[f32]>,
    position: f64,
    step: f64,
}

/// One voice per channel, summed to every output channel
#[derive(Debug)]
pub(crate) struct Mixer {
    voices: [Option<Voice>; Channel::COUNT],
    volume: f32,
}

impl Mixer {
    pub(crate) fn new(volume: f32) -> Self {
        Self {
            voices: [None, None, None],
            volume: volume.clamp(0.0, 1.0),
        }
    }

    /// Start (or restart) the event's channel
    pub(crate) fn play(&mut self, event: PlayEvent) {
        self.voices[event.channel.index()] = Some(Voice {
            frames: event.frames,
            position: 0.0,
            step: event.step,
        });
    }

    #[cfg(test)]
    pub(crate) fn is_idle(&self) -> bool {
        self.voices.iter().all(Option::is_none)
    }

    /// Render interleaved output with `channels` channels per frame
    pub(crate) fn render(&mut self, data: &mut [f32], channels: usize) {
        for frame in data.chunks_mut(channels.max(1)) {
            let mut acc = 0.0;
            for slot in self.voices.iter_mut() {
                let Some(voice) = slot.as_mut() else { continue };
                let len = voice.frames.len();
                let index = voice.position as usize;
                if index >= len {
                    *slot = None;
                    continue;
                }
                // Linear interpolation between neighbouring source frames
                let frac = (voice.position - index as f64) as f32;
                let current = voice.frames[index];
                let next = voice.frames.get(index + 1).copied().unwrap_or(0.0);
                acc += current + (next - current) * frac;

                voice.position += voice.step;
                if voice.position >= len as f64 {
                    *slot = None;
                }
            }
            frame.fill((acc * self.volume).clamp(-1.0, 1.0));
        }
    }
}

/// [`SampleTrigger`] feeding the cpal output callback
pub struct CpalTrigger {
    producer: HeapProd<PlayEvent>,
    samples: SampleSet,
    device_rate: u32,
    alive: Arc<AtomicBool>,
}

impl std::fmt::Debug for CpalTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpalTrigger")
            .field("device_rate", &self.device_rate)
            .finish_non_exhaustive()
    }
}

impl SampleTrigger for CpalTrigger {
    fn trigger(&mut self, sample: SampleId, channel: Channel) -> Result<(), AudioError> {
        if !self.alive.load(Ordering::Acquire) {
            return Err(AudioError::DeviceLost);
        }

        let data = self.samples.get(sample);
        if data.frames().is_empty() || data.sample_rate() == 0 {
            return Err(AudioError::SampleUnavailable(sample));
        }

        let event = PlayEvent {
            channel,
            frames: data.frames().clone(),
            step: data.sample_rate() as f64 / self.device_rate as f64,
        };
        if self.producer.try_push(event).is_err() {
            warn!("Trigger queue full, dropping {} click", sample);
        }
        Ok(())
    }
}

/// Sound bank playing WAV samples through a cpal output stream
pub struct CpalSoundBank {
    config: SoundBankConfig,
    stream: Option<Stream>,
    producer: Option<HeapProd<PlayEvent>>,
    device_rate: u32,
    alive: Arc<AtomicBool>,
}

impl CpalSoundBank {
    pub fn new(config: SoundBankConfig) -> Self {
        Self {
            config,
            stream: None,
            producer: None,
            device_rate: 0,
            alive: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &SoundBankConfig {
        &self.config
    }

    /// Check if the output stream is open
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl SoundBank for CpalSoundBank {
    type Trigger = CpalTrigger;

    fn open(&mut self) -> Result<(), AudioError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let device = find_output_device(self.config.output_device.as_ref())?;
        let device_name = device.name().unwrap_or_default();
        info!("Opening output device: {}", device_name);

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::AudioUnavailable(e.to_string()))?;
        let stream_config = supported.config();
        let channels = stream_config.channels as usize;

        let rb = HeapRb::<PlayEvent>::new(TRIGGER_QUEUE_CAPACITY);
        let (producer, consumer) = rb.split();

        let alive = Arc::new(AtomicBool::new(true));
        let alive_err = alive.clone();
        let err_fn = move |err: cpal::StreamError| {
            error!("Output stream error: {:?}", err);
            if let cpal::StreamError::DeviceNotAvailable = err {
                warn!("Output device disconnected");
                alive_err.store(false, Ordering::Release);
            }
        };

        let mut consumer: HeapCons<PlayEvent> = consumer;
        let mut mixer = Mixer::new(self.config.volume);
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    while let Some(event) = consumer.try_pop() {
                        mixer.play(event);
                    }
                    mixer.render(data, channels);
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::AudioUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        debug!("Output stream config: {:?}", stream_config);
        self.device_rate = stream_config.sample_rate.0;
        self.stream = Some(stream);
        self.producer = Some(producer);
        self.alive = alive;
        Ok(())
    }

    fn load(&mut self) -> Result<CpalTrigger, AudioError> {
        if self.stream.is_none() {
            return Err(AudioError::NotOpen);
        }
        let samples = SampleSet::load(&self.config.samples)?;
        let producer = self.producer.take().ok_or(AudioError::NotOpen)?;

        info!("Loaded click samples");
        Ok(CpalTrigger {
            producer,
            samples,
            device_rate: self.device_rate,
            alive: self.alive.clone(),
        })
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            self.alive.store(false, Ordering::Release);
            self.producer = None;
            info!("Output closed");
        }
    }
}

impl Drop for CpalSoundBank {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(channel: Channel, frames: &[f32], step: f64) -> PlayEvent {
        PlayEvent {
            channel,
            frames: frames.to_vec().into(),
            step,
        }
    }

    #[test]
    fn test_mixer_plays_then_goes_idle() {
        let mut mixer = Mixer::new(1.0);
        mixer.play(event(Channel::Beat, &[0.5, 0.25], 1.0));

        let mut out = [0.0f32; 8];
        mixer.render(&mut out, 2);

        assert_eq!(&out[..4], &[0.5, 0.5, 0.25, 0.25]);
        assert_eq!(&out[4..], &[0.0; 4]);
        assert!(mixer.is_idle());
    }

    #[test]
    fn test_mixer_retrigger_restarts_channel() {
        let mut mixer = Mixer::new(1.0);
        mixer.play(event(Channel::Subdivision, &[0.1, 0.2, 0.3], 1.0));

        let mut out = [0.0f32; 1];
        mixer.render(&mut out, 1);
        assert!((out[0] - 0.1).abs() < 1e-6);

        mixer.play(event(Channel::Subdivision, &[0.1, 0.2, 0.3], 1.0));
        mixer.render(&mut out, 1);
        assert!((out[0] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_mixer_sums_channels_and_clamps() {
        let mut mixer = Mixer::new(1.0);
        mixer.play(event(Channel::Accent, &[0.75], 1.0));
        mixer.play(event(Channel::Subdivision, &[0.75], 1.0));

        let mut out = [0.0f32; 1];
        mixer.render(&mut out, 1);
        assert_eq!(out[0], 1.0);
    }

    #[test]
    fn test_mixer_interpolates_at_half_step() {
        let mut mixer = Mixer::new(1.0);
        mixer.play(event(Channel::Beat, &[0.0, 1.0], 0.5));

        let mut out = [0.0f32; 3];
        mixer.render(&mut out, 1);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!((out[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_load_without_open_fails() {
        let mut bank = CpalSoundBank::new(SoundBankConfig::default());
        assert!(matches!(bank.load(), Err(AudioError::NotOpen)));
        assert!(!bank.is_open());
    }
}
