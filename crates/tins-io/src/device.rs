//! Output device discovery via cpal.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

/// Fallback when a device will not report its preferred rate.
const FALLBACK_SAMPLE_RATE: u32 = 44100;

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Output device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether this is the host's default output.
    pub is_default: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Channel count of the default output configuration.
    pub channels: u16,
}

impl AudioDevice {
    fn from_cpal(device: &Device, is_default: bool) -> Option<Self> {
        let name = device_name(device).ok()?;
        let (default_sample_rate, channels) = device
            .default_output_config()
            .map(|c| (c.sample_rate(), c.channels()))
            .unwrap_or((FALLBACK_SAMPLE_RATE, 2));
        Some(Self {
            name,
            is_default,
            default_sample_rate,
            channels,
        })
    }
}

/// List the output devices of the default host, in host order.
pub fn list_output_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| device_name(&d).ok());

    let devices = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .filter_map(|device| {
            let name = device_name(&device).ok()?;
            let is_default = default_name.as_deref() == Some(name.as_str());
            AudioDevice::from_cpal(&device, is_default)
        })
        .collect();

    Ok(devices)
}

/// Get the default output device of the default host, if any.
pub fn default_output_device() -> Result<Option<AudioDevice>> {
    let host = cpal::default_host();
    Ok(host
        .default_output_device()
        .and_then(|d| AudioDevice::from_cpal(&d, true)))
}

/// Resolve an output device by index, exact name or name fragment.
///
/// `None` selects the host default.
pub(crate) fn find_output_device(host: &Host, selector: Option<&str>) -> Result<Device> {
    let Some(selector) = selector else {
        return host.default_output_device().ok_or(Error::NoDevice);
    };
    let devices: Vec<_> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();
    let names: Vec<Option<String>> = devices.iter().map(|d| device_name(d).ok()).collect();

    select_device(&names, selector).map(|i| devices[i].clone())
}

/// Pick an entry from `names` by index, exact name, or case-insensitive
/// substring. Several substring matches resolve to the first.
fn select_device(names: &[Option<String>], selector: &str) -> Result<usize> {
    if let Ok(index) = selector.parse::<usize>() {
        return if index < names.len() {
            Ok(index)
        } else {
            Err(Error::DeviceNotFound(format!(
                "output device index {} (only {} devices available)",
                index,
                names.len()
            )))
        };
    }

    if let Some(i) = names.iter().position(|n| n.as_deref() == Some(selector)) {
        return Ok(i);
    }

    let search = selector.to_lowercase();
    let matches: Vec<(usize, &str)> = names
        .iter()
        .enumerate()
        .filter_map(|(i, n)| n.as_deref().map(|n| (i, n)))
        .filter(|(_, n)| n.to_lowercase().contains(&search))
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "no output device matching '{}'",
            selector
        ))),
        [(i, _)] => Ok(*i),
        [(i, first), ..] => {
            let all: Vec<_> = matches.iter().map(|(_, n)| *n).collect();
            tracing::warn!(
                selector,
                matches = ?all,
                using = first,
                "device selector is ambiguous"
            );
            Ok(*i)
        }
    }
}
