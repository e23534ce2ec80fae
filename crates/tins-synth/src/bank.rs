//! Fixed-capacity voice banks.
//!
//! A [`VoiceBank`] is an array of [`Voice`] slots plus a count; the active
//! voices are `[0, count)`. Allocation hands out the next slot and clearing
//! only resets the count, so a slot keeps its oscillator phase across a
//! clear/allocate cycle. That is what lets the engine rebuild free-voice banks
//! every block without clicks.

use crate::envelope::Envelope;
use crate::oscillator::Oscillator;
use crate::shape::WaveShape;

/// Default bank capacity.
pub const VOICE_BANK_CAPACITY: usize = 32;

/// One sounding oscillator with an optional envelope.
///
/// Voices without an envelope play at full level for as long as they are in
/// the bank. Voices with one are silent (and skipped) while it is `Off`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Voice {
    /// Phase, pitch and gain.
    pub oscillator: Oscillator,
    /// Amplitude envelope, present for keyed voices.
    pub envelope: Option<Envelope>,
}

impl Voice {
    /// A voice without an envelope.
    pub fn free(oscillator: Oscillator) -> Self {
        Self {
            oscillator,
            envelope: None,
        }
    }

    /// A voice gated by an envelope.
    pub fn keyed(oscillator: Oscillator, envelope: Envelope) -> Self {
        Self {
            oscillator,
            envelope: Some(envelope),
        }
    }

    /// Whether the render pass would skip this voice entirely.
    #[inline]
    pub fn is_silent(&self) -> bool {
        self.envelope.is_some_and(|env| !env.is_active())
    }

    /// Accumulate this voice into `out`, one sample per element.
    ///
    /// Voices at or above Nyquist contribute nothing and are not advanced.
    /// Each sample advances the envelope by `1 / sample_rate`, then the
    /// oscillator, then adds `shape * amplitude * level`. Once the envelope
    /// reaches `Off` the remaining samples are skipped.
    #[inline]
    pub fn render_into(&mut self, shape: WaveShape, out: &mut [f32], sample_rate: f32) {
        if !self.oscillator.is_below_nyquist(sample_rate) {
            return;
        }
        let dt = 1.0 / sample_rate;
        for sample in out.iter_mut() {
            let level = match self.envelope.as_mut() {
                Some(env) if !env.is_active() => continue,
                Some(env) => env.advance(dt),
                None => 1.0,
            };
            self.oscillator.advance(0.0, sample_rate);
            *sample += shape.evaluate(&self.oscillator) * self.oscillator.amplitude * level;
        }
    }
}

/// Returned by [`VoiceBank::allocate`] when every slot is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("voice bank full ({capacity} voices)")]
pub struct VoiceBankFull {
    /// Capacity of the bank that rejected the allocation.
    pub capacity: usize,
}

/// Bounded, order-preserving collection of voices.
///
/// # Example
///
/// ```rust
/// use tins_synth::{Oscillator, VoiceBank, Voice};
///
/// let mut bank: VoiceBank<4> = VoiceBank::new();
/// *bank.allocate()? = Voice::free(Oscillator::new(220.0, 0.5));
/// assert_eq!(bank.len(), 1);
///
/// bank.clear();
/// assert!(bank.is_empty());
/// # Ok::<(), tins_synth::VoiceBankFull>(())
/// ```
#[derive(Debug, Clone)]
pub struct VoiceBank<const N: usize> {
    voices: [Voice; N],
    count: usize,
}

impl<const N: usize> Default for VoiceBank<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> VoiceBank<N> {
    /// Create an empty bank with zeroed slots.
    pub fn new() -> Self {
        Self {
            voices: [Voice::default(); N],
            count: 0,
        }
    }

    /// Maximum number of voices.
    #[inline]
    pub fn capacity(&self) -> usize {
        N
    }

    /// Number of active voices.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no voice is active.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether the next allocation would fail.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count >= N
    }

    /// Claim the next slot.
    ///
    /// The slot still holds whatever the last voice at that position left
    /// behind; callers overwrite the fields they care about.
    pub fn allocate(&mut self) -> Result<&mut Voice, VoiceBankFull> {
        if self.count >= N {
            return Err(VoiceBankFull { capacity: N });
        }
        let slot = &mut self.voices[self.count];
        self.count += 1;
        Ok(slot)
    }

    /// Drop every voice in O(1). Slot contents are left untouched.
    #[inline]
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Active voices.
    #[inline]
    pub fn active(&self) -> &[Voice] {
        &self.voices[..self.count]
    }

    /// Active voices, mutable.
    #[inline]
    pub fn active_mut(&mut self) -> &mut [Voice] {
        &mut self.voices[..self.count]
    }

    /// Active voice by index.
    pub fn get(&self, index: usize) -> Option<&Voice> {
        self.active().get(index)
    }

    /// Active voice by index, mutable.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Voice> {
        self.active_mut().get_mut(index)
    }

    /// Accumulate every active voice into `out`.
    pub fn render_into(&mut self, shape: WaveShape, out: &mut [f32], sample_rate: f32) {
        for voice in self.active_mut() {
            voice.render_into(shape, out, sample_rate);
        }
    }
}
