//! Phase-accumulator oscillator state.
//!
//! An [`Oscillator`] holds only the state a wave shape needs to produce one
//! sample: where it is in the cycle, how far it moved on the last tick, and
//! the gain/shape settings. Turning that state into audio is the job of
//! [`WaveShape`](crate::WaveShape).

use libm::{log2f, powf};

/// Reference pitch (A4) used by the semitone helpers.
pub const BASE_NOTE_FREQ: f32 = 440.0;

/// Convert a semitone offset from A4 to a frequency in Hz.
///
/// `f = 2^(n/12) * 440`
#[inline]
pub fn semitone_to_frequency(semitone: f32) -> f32 {
    powf(2.0, semitone / 12.0) * BASE_NOTE_FREQ
}

/// Convert a frequency in Hz to a (fractional) semitone offset from A4.
#[inline]
pub fn frequency_to_semitone(freq_hz: f32) -> f32 {
    12.0 * log2f(freq_hz / BASE_NOTE_FREQ)
}

/// Convert decibels to linear gain.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    powf(10.0, db / 20.0)
}

/// Per-voice oscillator state.
///
/// `frequency` is signed: a negative frequency runs the phase backwards,
/// which is a phase-reversed tone rather than an error.
///
/// # Example
///
/// ```rust
/// use tins_synth::Oscillator;
///
/// let mut osc = Oscillator::new(440.0, 0.5);
/// osc.advance(0.0, 44100.0);
/// assert!((osc.phase() - 440.0 / 44100.0).abs() < 1e-7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    /// Position within one cycle, kept in [0, 1).
    phase: f32,
    /// Fraction of a cycle advanced on the last tick.
    phase_delta: f32,
    /// Frequency in Hz.
    pub frequency: f32,
    /// Linear output gain.
    pub amplitude: f32,
    /// Shape-specific parameter in 0..1 (duty cycle, sharpness).
    pub shape_param: f32,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self {
            phase: 0.0,
            phase_delta: 0.0,
            frequency: 0.0,
            amplitude: 0.0,
            shape_param: 0.0,
        }
    }
}

impl Oscillator {
    /// Create an oscillator at phase 0.
    pub fn new(frequency: f32, amplitude: f32) -> Self {
        Self {
            frequency,
            amplitude,
            ..Self::default()
        }
    }

    /// Builder-style shape parameter.
    pub fn with_shape_param(mut self, shape_param: f32) -> Self {
        self.shape_param = shape_param;
        self
    }

    /// Current phase in [0, 1).
    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Phase increment used on the last tick.
    #[inline]
    pub fn phase_delta(&self) -> f32 {
        self.phase_delta
    }

    /// Set the phase directly. Values outside [0, 1) are wrapped.
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase - libm::floorf(phase);
        if self.phase >= 1.0 {
            self.phase = 0.0;
        }
    }

    /// Reset phase and increment to zero.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.phase_delta = 0.0;
    }

    /// Advance one sample.
    ///
    /// The increment is recomputed from the current frequency on every call,
    /// so a frequency change is audible on the very next sample. The sum of
    /// `frequency + freq_modulation_hz` may be negative.
    #[inline]
    pub fn advance(&mut self, freq_modulation_hz: f32, sample_rate: f32) {
        self.phase_delta = (self.frequency + freq_modulation_hz) / sample_rate;
        self.phase += self.phase_delta;
        if self.phase < 0.0 {
            self.phase += 1.0;
        }
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
    }

    /// Whether this oscillator can be rendered without foldback.
    ///
    /// Anything at or beyond half the sample rate is skipped by the engine.
    #[inline]
    pub fn is_below_nyquist(&self, sample_rate: f32) -> bool {
        libm::fabsf(self.frequency) < sample_rate * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    #[test]
    fn advance_accumulates_phase() {
        let mut osc = Oscillator::new(441.0, 1.0);
        for _ in 0..50 {
            osc.advance(0.0, SR);
        }
        assert!((osc.phase() - 0.5).abs() < 1e-4, "phase {}", osc.phase());
        assert!((osc.phase_delta() - 0.01).abs() < 1e-7);
    }

    #[test]
    fn phase_wraps_forward() {
        let mut osc = Oscillator::new(11025.0, 1.0);
        for _ in 0..10_000 {
            osc.advance(0.0, SR);
            assert!((0.0..1.0).contains(&osc.phase()), "phase {}", osc.phase());
        }
    }

    #[test]
    fn negative_frequency_runs_backwards() {
        let mut osc = Oscillator::new(-441.0, 1.0);
        osc.advance(0.0, SR);
        assert!((osc.phase() - 0.99).abs() < 1e-5, "phase {}", osc.phase());
        for _ in 0..10_000 {
            osc.advance(0.0, SR);
            assert!((0.0..1.0).contains(&osc.phase()));
        }
    }

    #[test]
    fn modulation_adds_to_frequency() {
        let mut a = Oscillator::new(400.0, 1.0);
        let mut b = Oscillator::new(440.0, 1.0);
        a.advance(40.0, SR);
        b.advance(0.0, SR);
        assert!((a.phase() - b.phase()).abs() < 1e-7);
    }

    #[test]
    fn frequency_change_applies_on_next_sample() {
        let mut osc = Oscillator::new(100.0, 1.0);
        osc.advance(0.0, SR);
        osc.frequency = 1000.0;
        osc.advance(0.0, SR);
        assert!((osc.phase_delta() - 1000.0 / SR).abs() < 1e-9);
    }

    #[test]
    fn semitone_helpers() {
        assert!((semitone_to_frequency(0.0) - 440.0).abs() < 1e-3);
        assert!((semitone_to_frequency(12.0) - 880.0).abs() < 1e-2);
        assert!((semitone_to_frequency(-9.0) - 261.63).abs() < 0.01);
        assert!((frequency_to_semitone(220.0) + 12.0).abs() < 1e-4);
    }

    #[test]
    fn db_conversion() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn nyquist_check_is_exclusive() {
        assert!(Oscillator::new(22049.0, 1.0).is_below_nyquist(SR));
        assert!(!Oscillator::new(22050.0, 1.0).is_below_nyquist(SR));
        assert!(!Oscillator::new(-22050.0, 1.0).is_below_nyquist(SR));
        assert!(Oscillator::new(-1000.0, 1.0).is_below_nyquist(SR));
    }

    #[test]
    fn set_phase_wraps() {
        let mut osc = Oscillator::default();
        osc.set_phase(1.25);
        assert!((osc.phase() - 0.25).abs() < 1e-6);
        osc.set_phase(-0.25);
        assert!((osc.phase() - 0.75).abs() < 1e-6);
    }
}
