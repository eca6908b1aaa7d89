//! Audio output device enumeration and stream configuration, adapted from
//! `audio/device.rs` down to the mono, fixed-sample-rate contract this core
//! requires (spec.md §6: "channels = 1").

use cpal::traits::{DeviceTrait, HostTrait};

use crate::config::{BUFFER_SIZE, SAMPLE_RATE};

#[derive(Debug, Clone)]
pub struct OutputDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

/// List every output device the host exposes, marking the default.
pub fn list_output_devices() -> Result<Vec<OutputDeviceInfo>, String> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| d.name().ok());

    let devices = host
        .output_devices()
        .map_err(|e| format!("failed to enumerate output devices: {}", e))?;

    let mut result = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            result.push(OutputDeviceInfo {
                is_default: Some(&name) == default_name.as_ref(),
                name,
            });
        }
    }
    Ok(result)
}

/// Resolve an output device by name, or the host default if `name` is `None`.
pub fn get_output_device(name: Option<&str>) -> Result<cpal::Device, String> {
    let host = cpal::default_host();
    match name {
        Some(wanted) => {
            let devices = host
                .output_devices()
                .map_err(|e| format!("failed to enumerate output devices: {}", e))?;
            devices
                .into_iter()
                .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
                .ok_or_else(|| format!("output device '{}' not found", wanted))
        }
        None => host
            .default_output_device()
            .ok_or_else(|| "no default output device found".to_string()),
    }
}

/// Build a mono stream config at the core's fixed sample rate and block
/// size, falling back to the device's default config if it can't satisfy
/// the exact request.
pub fn get_stream_config(device: &cpal::Device) -> Result<cpal::StreamConfig, String> {
    let supported = device
        .supported_output_configs()
        .map_err(|e| format!("failed to query supported configs: {}", e))?;

    for range in supported {
        if SAMPLE_RATE >= range.min_sample_rate().0
            && SAMPLE_RATE <= range.max_sample_rate().0
            && range.channels() >= 1
        {
            return Ok(cpal::StreamConfig {
                channels: 1,
                sample_rate: cpal::SampleRate(SAMPLE_RATE),
                buffer_size: cpal::BufferSize::Fixed(BUFFER_SIZE as u32),
            });
        }
    }

    let default_config = device
        .default_output_config()
        .map_err(|e| format!("failed to get default output config: {}", e))?;
    Ok(cpal::StreamConfig {
        channels: 1,
        sample_rate: default_config.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    })
}
