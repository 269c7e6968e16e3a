//! Output device enumeration and selection

use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};

use super::error::AudioError;

/// Unique identifier for an audio device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

/// Information about an output device
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Device identifier
    pub id: DeviceId,
    /// Display name
    pub name: String,
    /// Supported sample rates (Hz)
    pub supported_sample_rates: Vec<u32>,
    /// Supported channel counts
    pub supported_channels: Vec<u16>,
    /// Whether this is the default device
    pub is_default: bool,
}

/// List available output (playback) devices
pub fn list_output_devices() -> Result<Vec<AudioDevice>, AudioError> {
    let host = cpal::default_host();
    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    let devices = host
        .output_devices()
        .map_err(|e| AudioError::AudioUnavailable(e.to_string()))?;

    Ok(devices
        .filter_map(|device| {
            let name = device.name().ok()?;
            let is_default = default_name.as_ref() == Some(&name);
            let (sample_rates, channels) = get_device_capabilities(&device);
            Some(AudioDevice {
                id: DeviceId(name.clone()),
                name,
                supported_sample_rates: sample_rates,
                supported_channels: channels,
                is_default,
            })
        })
        .collect())
}

/// Resolve an output device by name, or the host default when `device_id` is `None`
pub(crate) fn find_output_device(device_id: Option<&DeviceId>) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();

    match device_id {
        Some(id) => host
            .output_devices()
            .map_err(|e| AudioError::AudioUnavailable(e.to_string()))?
            .find(|d| d.name().ok().as_ref() == Some(&id.0))
            .ok_or_else(|| AudioError::DeviceNotFound(id.0.clone())),
        None => host
            .default_output_device()
            .ok_or_else(|| AudioError::AudioUnavailable("No default output device".into())),
    }
}

/// Get supported sample rates and channel counts for a device
fn get_device_capabilities(device: &cpal::Device) -> (Vec<u32>, Vec<u16>) {
    let mut sample_rates = Vec::new();
    let mut channels = Vec::new();

    for config in device.supported_output_configs().into_iter().flatten() {
        // Common sample rates that fall within the supported range
        for rate in &[44100u32, 48000, 96000, 192000] {
            if *rate >= config.min_sample_rate().0
                && *rate <= config.max_sample_rate().0
                && !sample_rates.contains(rate)
            {
                sample_rates.push(*rate);
            }
        }
        let ch = config.channels();
        if !channels.contains(&ch) {
            channels.push(ch);
        }
    }

    sample_rates.sort();
    channels.sort();

    (sample_rates, channels)
}
