//! Recording sound bank shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use metronomnom::audio::{AudioError, Channel, SampleId, SampleTrigger, SoundBank};

pub type Triggers = Arc<Mutex<Vec<(SampleId, Channel)>>>;

/// Sound bank that records every trigger instead of playing it
#[derive(Clone, Default)]
pub struct MockBank {
    pub triggers: Triggers,
    pub open: Arc<AtomicBool>,
    pub opens: Arc<AtomicUsize>,
    pub missing: Option<SampleId>,
    /// Number of triggers accepted before the device is reported lost
    pub fail_after: Option<usize>,
}

impl MockBank {
    pub fn missing(sample: SampleId) -> Self {
        Self {
            missing: Some(sample),
            ..Self::default()
        }
    }

    pub fn failing_after(triggers: usize) -> Self {
        Self {
            fail_after: Some(triggers),
            ..Self::default()
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.lock().len()
    }
}

pub struct MockTrigger {
    triggers: Triggers,
    remaining: Option<usize>,
}

impl SampleTrigger for MockTrigger {
    fn trigger(&mut self, sample: SampleId, channel: Channel) -> Result<(), AudioError> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Err(AudioError::DeviceLost);
            }
            *remaining -= 1;
        }
        self.triggers.lock().push((sample, channel));
        Ok(())
    }
}

impl SoundBank for MockBank {
    type Trigger = MockTrigger;

    fn open(&mut self) -> Result<(), AudioError> {
        self.open.store(true, Ordering::SeqCst);
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load(&mut self) -> Result<MockTrigger, AudioError> {
        if let Some(sample) = self.missing {
            return Err(AudioError::MissingSample(sample));
        }
        Ok(MockTrigger {
            triggers: self.triggers.clone(),
            remaining: self.fail_after,
        })
    }

    fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

/// Beat callback that records each beat number with its arrival time
pub fn beat_recorder() -> (Arc<Mutex<Vec<(u32, Instant)>>>, impl Fn(u32) + Send + Sync + 'static) {
    let beats = Arc::new(Mutex::new(Vec::new()));
    let sink = beats.clone();
    (beats, move |beat| sink.lock().push((beat, Instant::now())))
}

/// Poll `condition` until it holds or a few seconds pass
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}
