//! Tins Synth - real-time polyphonic synthesis engine
//!
//! This crate turns note and parameter events into a mono block of samples
//! suitable for an audio device callback.
//!
//! # Core Components
//!
//! ## Oscillators and wave shapes
//!
//! - [`Oscillator`] - phase accumulator with signed frequency, gain and shape parameter
//! - [`WaveShape`] - Sine, Sawtooth, Square, Triangle, RoundedSquare
//! - [`band_limited_ripple`] - PolyBLEP correction used by sawtooth and square
//!
//! ```rust
//! use tins_synth::{Oscillator, WaveShape};
//!
//! let mut osc = Oscillator::new(440.0, 0.5);
//! osc.advance(0.0, 44100.0);
//! let sample = WaveShape::Sawtooth.evaluate(&osc) * osc.amplitude;
//! assert!(sample.abs() <= 0.5);
//! ```
//!
//! ## Envelopes
//!
//! - [`Envelope`] - linear ADSR with a time-bounded sustain stage
//! - [`EnvelopeParams`] / [`EnvelopeState`]
//!
//! ## Voices
//!
//! - [`Voice`] - oscillator plus optional envelope
//! - [`VoiceBank`] - fixed-capacity voice array with O(1) clear
//! - [`KeyLayout`] - characters to pitches, one keyed voice per key
//!
//! ## Engine (requires `std`)
//!
//! - [`Synth`] - owns every bank and renders one block per call
//! - [`ControlBridge`] - lock-free handle for keyboard, network and UI threads
//! - [`SignalTap`] - snapshot of the last block for meters and scopes
//!
//! # no_std Support
//!
//! The DSP core builds without `std`. Disable the default feature:
//!
//! ```toml
//! [dependencies]
//! tins-synth = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use tins_synth::{Synth, SynthSettings, UiVoice, WaveShape};
//!
//! let mut synth = Synth::new(SynthSettings::default());
//! let bridge = synth.bridge().clone();
//!
//! bridge.apply_ui_voices(&[UiVoice::new(WaveShape::Triangle, 220.0, 0.2)])?;
//! bridge.set_key('h', true)?;
//!
//! let block = synth.render_block();
//! assert_eq!(block.len(), 1024);
//! # Ok::<(), tins_synth::ControlError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod bank;
pub mod envelope;
pub mod keyboard;
pub mod oscillator;
pub mod shape;

#[cfg(feature = "std")]
pub mod control;
#[cfg(feature = "std")]
pub mod synth;
#[cfg(feature = "std")]
pub mod tap;

pub use bank::{VOICE_BANK_CAPACITY, Voice, VoiceBank, VoiceBankFull};
pub use envelope::{Envelope, EnvelopeParams, EnvelopeState};
pub use keyboard::{KeyLayout, MAX_KEYS};
pub use oscillator::{
    BASE_NOTE_FREQ, Oscillator, db_to_linear, frequency_to_semitone, semitone_to_frequency,
};
pub use shape::{ParseShapeError, WaveShape, band_limited_ripple};

#[cfg(feature = "std")]
pub use control::{
    ControlBridge, ControlError, DEFAULT_COMMAND_CAPACITY, KeyVoiceSettings, UI_VOICE_CAPACITY,
    UiVoice, VoiceCommand,
};
#[cfg(feature = "std")]
pub use synth::{Synth, SynthSettings};
#[cfg(feature = "std")]
pub use tap::{SignalTap, downsample, trigger_index};
