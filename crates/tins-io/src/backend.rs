//! Pluggable audio output abstraction.
//!
//! The synthesizer only ever produces sound, so the backend surface is a
//! single output stream fed by a pull callback. [`CpalBackend`] is the
//! default implementation; tests drive the same trait with a manual backend
//! that invokes the callback on demand.
//!
//! The trait uses boxed closures rather than generic parameters so that it
//! stays object-safe and a backend can be chosen at runtime. Streams are
//! returned as a type-erased [`StreamHandle`] that stops playback on drop.
//!
//! [`CpalBackend`]: crate::CpalBackend

use crate::{AudioDevice, Result};

/// Configuration for building an output stream.
///
/// ## Fields
///
/// - `sample_rate`: Requested sample rate in Hz (default: 44100)
/// - `buffer_size`: Preferred buffer size in frames (default: 1024)
/// - `channels`: Number of interleaved output channels (default: 2)
/// - `device_name`: Index, exact name or name fragment (default device if `None`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Number of audio channels.
    pub channels: u16,
    /// Optional device selector (uses system default if `None`).
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 1024,
            channels: 2,
            device_name: None,
        }
    }
}

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops
/// playback.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, keeping it alive until drop.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Audio output callback signature.
///
/// Called on the real-time audio thread with a buffer of interleaved f32
/// samples, `[L0, R0, L1, R1, ...]` for stereo, that it must fill completely.
///
/// ## Real-Time Safety
///
/// Implementations must not allocate, lock mutexes or perform I/O.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Error callback signature, called with a human-readable message.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Pluggable audio output backend.
///
/// ## Implementing a Custom Backend
///
/// ```rust,ignore
/// use tins_io::backend::{AudioBackend, BackendStreamConfig, ErrorCallback,
///                        OutputCallback, StreamHandle};
/// use tins_io::{AudioDevice, Result};
///
/// struct NullBackend;
///
/// impl AudioBackend for NullBackend {
///     fn name(&self) -> &str { "null" }
///     fn list_devices(&self) -> Result<Vec<AudioDevice>> { Ok(Vec::new()) }
///     fn default_output_device(&self) -> Result<Option<AudioDevice>> { Ok(None) }
///     fn build_output_stream(
///         &self,
///         _config: &BackendStreamConfig,
///         callback: OutputCallback,
///         _error_callback: ErrorCallback,
///     ) -> Result<StreamHandle> {
///         Ok(StreamHandle::new(callback))
///     }
/// }
/// ```
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g., "cpal").
    fn name(&self) -> &str;

    /// List the available output devices.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Get the default output device, if any.
    fn default_output_device(&self) -> Result<Option<AudioDevice>>;

    /// Build and start an output stream.
    ///
    /// `callback` is invoked per hardware buffer and must fill it. The
    /// returned [`StreamHandle`] keeps the stream alive.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// The sample rate the backend will actually run at for `config`.
    ///
    /// Defaults to the requested rate.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }
}
