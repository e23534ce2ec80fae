//! Audio output for the tins synthesizer.
//!
//! This crate provides:
//!
//! - **Device output**: the [`AudioBackend`] trait and its cpal implementation,
//!   [`CpalBackend`], which pulls interleaved samples from a callback
//! - **Device listing**: [`list_output_devices`] and [`default_output_device`]
//! - **WAV files**: [`write_wav`], [`read_wav`] and the block-wise [`WavSink`]
//!   used for offline rendering
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tins_io::{AudioBackend, BackendStreamConfig, CpalBackend};
//!
//! let backend = CpalBackend::new();
//! let config = BackendStreamConfig::default();
//! let _stream = backend.build_output_stream(
//!     &config,
//!     Box::new(move |out: &mut [f32]| synth.fill_interleaved(out, 2)),
//!     Box::new(|err| tracing::error!(err, "stream error")),
//! )?;
//! ```

/// Backend-neutral output stream interface.
pub mod backend;
/// cpal implementation of [`AudioBackend`].
pub mod cpal_backend;
mod device;
mod wav;

pub use backend::{AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle};
pub use cpal_backend::CpalBackend;
pub use device::{AudioDevice, default_output_device, list_output_devices};
pub use wav::{WavFormat, WavInfo, WavSink, WavSpec, read_wav, read_wav_info, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio output device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
