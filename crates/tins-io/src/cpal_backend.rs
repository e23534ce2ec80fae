//! cpal-based audio backend.
//!
//! [`CpalBackend`] wraps [cpal](https://crates.io/crates/cpal) for
//! cross-platform output on ALSA (Linux), CoreAudio (macOS) and
//! WASAPI (Windows).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tins_io::{AudioBackend, BackendStreamConfig, CpalBackend};
//!
//! let backend = CpalBackend::new();
//! let stream = backend.build_output_stream(
//!     &BackendStreamConfig::default(),
//!     Box::new(|buffer: &mut [f32]| buffer.fill(0.0)),
//!     Box::new(|err| tracing::error!(err, "stream error")),
//! )?;
//! // Plays until `stream` is dropped.
//! ```

use crate::backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle,
};
use crate::device::find_output_device;
use crate::{AudioDevice, Error, Result};
use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// cpal-based audio backend holding the platform's default [`Host`].
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Create a backend on the platform's default audio host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        crate::device::list_output_devices()
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        crate::device::default_output_device()
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: OutputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = find_output_device(&self.host, config.device_name.as_deref())?;
        let supported = device
            .default_output_config()
            .ok()
            .map(|c| c.buffer_size().clone());

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: buffer_size_for(config.buffer_size, supported),
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback(data);
                },
                move |err| {
                    error_callback(&err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            channels = config.channels,
            sample_rate = config.sample_rate,
            buffer = ?stream_config.buffer_size,
            "output stream started"
        );

        Ok(StreamHandle::new(stream))
    }

    /// The requested rate if any supported configuration covers it,
    /// otherwise the device's preferred rate.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        let Ok(device) = find_output_device(&self.host, config.device_name.as_deref()) else {
            return config.sample_rate;
        };
        let covered = device.supported_output_configs().is_ok_and(|mut ranges| {
            ranges.any(|r| {
                r.channels() == config.channels
                    && (r.min_sample_rate()..=r.max_sample_rate()).contains(&config.sample_rate)
            })
        });
        if covered {
            return config.sample_rate;
        }
        device
            .default_output_config()
            .map(|c| c.sample_rate())
            .unwrap_or(config.sample_rate)
    }
}

/// Request a fixed hardware buffer only when the device reports it can
/// honor the size; otherwise let the device choose.
fn buffer_size_for(
    requested: u32,
    supported: Option<cpal::SupportedBufferSize>,
) -> cpal::BufferSize {
    match supported {
        Some(cpal::SupportedBufferSize::Range { min, max })
            if (min..=max).contains(&requested) =>
        {
            cpal::BufferSize::Fixed(requested)
        }
        _ => {
            tracing::debug!(requested, "using the device default buffer size");
            cpal::BufferSize::Default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_name() {
        let backend = CpalBackend::new();
        assert_eq!(backend.name(), "cpal");
    }

    #[test]
    fn buffer_size_respects_device_range() {
        let range = || Some(cpal::SupportedBufferSize::Range { min: 64, max: 4096 });
        assert_eq!(buffer_size_for(1024, range()), cpal::BufferSize::Fixed(1024));
        assert_eq!(buffer_size_for(8192, range()), cpal::BufferSize::Default);
        assert_eq!(
            buffer_size_for(1024, Some(cpal::SupportedBufferSize::Unknown)),
            cpal::BufferSize::Default
        );
        assert_eq!(buffer_size_for(1024, None), cpal::BufferSize::Default);
    }

    #[test]
    fn backend_lists_devices() {
        let backend = CpalBackend::new();
        assert!(backend.list_devices().is_ok());
    }
}
