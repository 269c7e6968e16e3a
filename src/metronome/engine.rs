//! Beat scheduling engine
//!
//! One background thread per running engine fires the click samples and the
//! beat callback. The caller's thread mutates tempo, rhythm mode and time
//! signature concurrently; the loop reads them fresh at the top of every beat.
//!
//! Timing policy: every beat starts when the previous one ends. If triggering or
//! the callback overruns the beat interval, the next beat starts immediately and
//! no catch-up beats are fired, so sustained overload slows the tempo instead of
//! bunching clicks together.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::audio::{Channel, CpalSoundBank, SampleId, SampleTrigger, SoundBank, SoundBankConfig};

use super::clock::{self, BeatCounter};
use super::error::MetronomeError;
use super::rhythm::RhythmMode;
use super::{validate_beats_per_measure, validate_bpm};

/// Upper bound on how long `stop()` waits for the loop thread
pub const STOP_JOIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Called with the 1-based beat number at the start of every main beat
pub type BeatCallback = Arc<dyn Fn(u32) + Send + Sync + 'static>;

/// Metronome configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetronomeConfig {
    /// Beats per minute
    pub bpm: u32,
    /// Time signature numerator (beats per measure)
    pub beats_per_measure: u32,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            bpm: 120,
            beats_per_measure: 4,
        }
    }
}

impl MetronomeConfig {
    pub fn new(bpm: u32) -> Self {
        Self {
            bpm,
            ..Self::default()
        }
    }

    pub fn with_beats_per_measure(mut self, beats_per_measure: u32) -> Self {
        self.beats_per_measure = beats_per_measure;
        self
    }

    pub fn validate(&self) -> Result<(), MetronomeError> {
        validate_bpm(self.bpm)?;
        validate_beats_per_measure(self.beats_per_measure)?;
        Ok(())
    }
}

#[derive(Debug)]
struct Position {
    counter: BeatCounter,
    /// Bumped on every time-signature change
    epoch: u64,
}

/// State shared between the engine handle and the loop thread
struct Shared {
    running: AtomicBool,
    /// Identifies the current run; a detached thread from an older run sees a
    /// different value and exits
    run: AtomicU64,
    bpm: AtomicU32,
    mode: AtomicU8,
    position: Mutex<Position>,
    failure: Mutex<Option<MetronomeError>>,
    wake_lock: Mutex<()>,
    wake: Condvar,
}

impl Shared {
    fn new(config: &MetronomeConfig) -> Self {
        Self {
            running: AtomicBool::new(false),
            run: AtomicU64::new(0),
            bpm: AtomicU32::new(config.bpm),
            mode: AtomicU8::new(RhythmMode::Normal as u8),
            position: Mutex::new(Position {
                counter: BeatCounter::new(config.beats_per_measure),
                epoch: 0,
            }),
            failure: Mutex::new(None),
            wake_lock: Mutex::new(()),
            wake: Condvar::new(),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn rhythm_mode(&self) -> RhythmMode {
        RhythmMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Whether `run` is still the active run
    fn is_active(&self, run: u64) -> bool {
        self.is_running() && self.run.load(Ordering::Acquire) == run
    }

    /// Begin a new run and return its id
    fn begin_run(&self) -> u64 {
        let _guard = self.wake_lock.lock();
        let run = self.run.load(Ordering::Acquire).wrapping_add(1);
        self.run.store(run, Ordering::Release);
        self.running.store(true, Ordering::Release);
        run
    }

    /// Sleep until `deadline`. Returns false as soon as `run` is halted or replaced.
    fn wait_until(&self, run: u64, deadline: Instant) -> bool {
        let mut guard = self.wake_lock.lock();
        while self.is_active(run) {
            if Instant::now() >= deadline {
                return true;
            }
            self.wake.wait_until(&mut guard, deadline);
        }
        false
    }

    /// End `run` from its own thread, recording `failure`. Does nothing to a
    /// newer run.
    fn finish_run(&self, run: u64, failure: Option<MetronomeError>) {
        let _guard = self.wake_lock.lock();
        if self.run.load(Ordering::Acquire) != run {
            if let Some(e) = failure {
                debug!("Discarding failure of replaced run: {}", e);
            }
            return;
        }
        if let Some(e) = failure {
            error!("Scheduling loop stopped: {}", e);
            *self.failure.lock() = Some(e);
        }
        self.running.store(false, Ordering::Release);
        self.wake.notify_all();
    }

    /// Clear the running flag and wake any pending wait
    fn halt(&self) {
        let _guard = self.wake_lock.lock();
        self.running.store(false, Ordering::Release);
        self.wake.notify_all();
    }

    /// Current beat and the epoch it belongs to
    fn snapshot(&self) -> (u32, u64) {
        let position = self.position.lock();
        (position.counter.current(), position.epoch)
    }

    /// Advance the beat unless the time signature changed since `epoch`
    fn advance(&self, epoch: u64) {
        let mut position = self.position.lock();
        if position.epoch == epoch {
            position.counter.increment();
        }
    }
}

/// Main beat sample and channel for a beat number
fn main_beat_sample(beat: u32) -> (SampleId, Channel) {
    if beat == 1 {
        (SampleId::Downbeat, Channel::Accent)
    } else {
        (SampleId::Upbeat, Channel::Beat)
    }
}

fn run_loop<T: SampleTrigger>(
    shared: &Shared,
    run: u64,
    trigger: &mut T,
    on_beat: Option<&BeatCallback>,
) -> Result<(), MetronomeError> {
    while shared.is_active(run) {
        let start = Instant::now();
        let bpm = shared.bpm.load(Ordering::Acquire);
        let mode = shared.rhythm_mode();
        let beat_interval = clock::beat_interval(bpm)?;
        let subdivision_interval = clock::subdivision_interval(beat_interval, mode);

        let (beat, epoch) = shared.snapshot();
        debug!("Beat {} at {} BPM ({})", beat, bpm, mode);

        if let Some(callback) = on_beat {
            callback(beat);
        }

        if !shared.is_active(run) {
            break;
        }
        let (sample, channel) = main_beat_sample(beat);
        trigger.trigger(sample, channel)?;

        // The main beat is the first subdivision slot
        for slot in 1..mode.subdivisions() {
            if !shared.wait_until(run, start + subdivision_interval * slot) {
                return Ok(());
            }
            trigger.trigger(SampleId::Subdivision, Channel::Subdivision)?;
        }

        if !shared.is_active(run) {
            break;
        }
        shared.advance(epoch);

        if !shared.wait_until(run, start + beat_interval) {
            break;
        }
    }
    Ok(())
}

struct Worker {
    handle: JoinHandle<()>,
    done: mpsc::Receiver<()>,
}

/// Metronome engine driving a [`SoundBank`] from a scheduling thread
pub struct MetronomeEngine<B: SoundBank = CpalSoundBank> {
    config: MetronomeConfig,
    shared: Arc<Shared>,
    bank: B,
    trigger: Option<B::Trigger>,
    output_open: bool,
    on_beat: Option<BeatCallback>,
    worker: Option<Worker>,
}

impl MetronomeEngine<CpalSoundBank> {
    /// Create an engine playing through cpal
    pub fn with_cpal(
        config: MetronomeConfig,
        bank_config: SoundBankConfig,
    ) -> Result<Self, MetronomeError> {
        Self::new(config, CpalSoundBank::new(bank_config))
    }
}

impl<B: SoundBank> MetronomeEngine<B> {
    /// Create a new engine, opening the audio output and loading the samples
    ///
    /// Fails with [`MetronomeError::InvalidBpm`] or
    /// [`MetronomeError::InvalidTimeSignature`] for out-of-range settings, and
    /// with an audio error when the output cannot be opened or a sample is
    /// missing. Nothing stays open on failure.
    pub fn new(config: MetronomeConfig, bank: B) -> Result<Self, MetronomeError> {
        config.validate()?;

        let mut engine = Self {
            config,
            shared: Arc::new(Shared::new(&config)),
            bank,
            trigger: None,
            output_open: false,
            on_beat: None,
            worker: None,
        };
        let trigger = engine.acquire()?;
        engine.trigger = Some(trigger);

        debug!("Metronome created with config: {:?}", config);
        Ok(engine)
    }

    /// Install the per-beat callback
    pub fn with_beat_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.on_beat = Some(Arc::new(callback));
        self
    }

    /// Start the scheduling loop. Does nothing if it is already running.
    ///
    /// After a previous run ended the output is reopened and samples reloaded.
    pub fn start(&mut self) -> Result<(), MetronomeError> {
        if self.is_running() {
            debug!("Metronome already running");
            return Ok(());
        }

        // A previous run may have ended on its own after a trigger failure
        if self.worker.is_some() {
            self.join_worker();
        }
        if let Some(failure) = self.shared.failure.lock().take() {
            debug!("Discarding failure of previous run: {}", failure);
        }

        let mut trigger = match self.trigger.take() {
            Some(trigger) => trigger,
            None => {
                self.release_output();
                self.acquire()?
            }
        };

        let run = self.shared.begin_run();

        let shared = self.shared.clone();
        let on_beat = self.on_beat.clone();
        let (done_tx, done_rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("metronome-loop".into())
            .spawn(move || {
                let failure = run_loop(&shared, run, &mut trigger, on_beat.as_ref()).err();
                shared.finish_run(run, failure);
                let _ = done_tx.send(());
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(Worker {
                    handle,
                    done: done_rx,
                });
                info!("Metronome started at {} BPM", self.bpm());
                Ok(())
            }
            Err(e) => {
                self.shared.halt();
                Err(MetronomeError::Thread(e))
            }
        }
    }

    /// Stop the scheduling loop and release the audio output
    ///
    /// No-op when the engine was never started. Once this returns no further
    /// clicks or beat callbacks are produced.
    pub fn stop(&mut self) {
        if self.worker.is_none() {
            return;
        }

        self.shared.halt();
        self.join_worker();
        self.release_output();
        info!("Metronome stopped");
    }

    /// Change the tempo, effective from the next beat
    pub fn update_bpm(&self, bpm: u32) -> Result<(), MetronomeError> {
        validate_bpm(bpm)?;
        self.shared.bpm.store(bpm, Ordering::Release);
        debug!("Tempo set to {} BPM", bpm);
        Ok(())
    }

    /// Select a rhythm mode and return the mode now in effect
    ///
    /// Selecting the mode that is already active switches back to
    /// [`RhythmMode::Normal`] instead of keeping it.
    pub fn set_rhythm_mode(&self, requested: RhythmMode) -> RhythmMode {
        let previous = self
            .shared
            .mode
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(RhythmMode::from_u8(current).apply(requested) as u8)
            })
            .unwrap_or_else(|current| current);
        let mode = RhythmMode::from_u8(previous).apply(requested);
        debug!("Rhythm mode set to {}", mode);
        mode
    }

    /// Change the time-signature numerator and restart the measure at beat 1
    pub fn set_time_signature(&self, beats_per_measure: u32) -> Result<(), MetronomeError> {
        validate_beats_per_measure(beats_per_measure)?;
        let mut position = self.shared.position.lock();
        position.counter.set_beats_per_measure(beats_per_measure);
        position.epoch = position.epoch.wrapping_add(1);
        debug!("Time signature set to {}/{}", beats_per_measure, super::BEAT_UNIT);
        Ok(())
    }

    /// Check if the scheduling loop is running
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Get current BPM
    pub fn bpm(&self) -> u32 {
        self.shared.bpm.load(Ordering::Acquire)
    }

    /// Interval between main beats at the current BPM
    pub fn beat_interval(&self) -> Duration {
        clock::beat_interval(self.bpm()).unwrap_or_default()
    }

    pub fn rhythm_mode(&self) -> RhythmMode {
        self.shared.rhythm_mode()
    }

    pub fn current_beat(&self) -> u32 {
        self.shared.position.lock().counter.current()
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.shared.position.lock().counter.beats_per_measure()
    }

    /// Configuration the engine was created with
    pub fn config(&self) -> &MetronomeConfig {
        &self.config
    }

    /// Take the error that ended the last run, if it ended on its own
    pub fn take_failure(&self) -> Option<MetronomeError> {
        self.shared.failure.lock().take()
    }

    fn acquire(&mut self) -> Result<B::Trigger, MetronomeError> {
        self.bank.open()?;
        self.output_open = true;
        match self.bank.load() {
            Ok(trigger) => Ok(trigger),
            Err(e) => {
                self.release_output();
                Err(e.into())
            }
        }
    }

    fn release_output(&mut self) {
        self.trigger = None;
        if self.output_open {
            self.bank.close();
            self.output_open = false;
        }
    }

    /// Wait for the loop thread to finish, detaching it after `STOP_JOIN_TIMEOUT`
    fn join_worker(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        match worker.done.recv_timeout(STOP_JOIN_TIMEOUT) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.handle.join().is_err() {
                    error!("Scheduling thread panicked");
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Scheduling thread did not exit within {:?}, detaching",
                    STOP_JOIN_TIMEOUT
                );
            }
        }
    }
}

impl<B: SoundBank> Drop for MetronomeEngine<B> {
    fn drop(&mut self) {
        self.stop();
        self.release_output();
    }
}
