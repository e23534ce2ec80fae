//! ADSR envelope with a time-bounded sustain stage.
//!
//! Segments are linear and timed in seconds. Unlike a gate-driven ADSR, the
//! sustain stage has a maximum duration (`sustain_time`) after which the
//! envelope releases on its own, so a note always ends even if its release
//! event never arrives. An explicit [`Envelope::release`] bypasses the timer.

/// ADSR envelope states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnvelopeState {
    /// Silent; the voice is skipped by the render pass.
    #[default]
    Off,
    /// Level rises linearly to 1.0.
    Attack,
    /// Level falls linearly from 1.0 to the sustain level.
    Decay,
    /// Level holds at the sustain level until released or timed out.
    Sustain,
    /// Level falls linearly to 0.0.
    Release,
}

impl EnvelopeState {
    /// Lowercase name for logs and status output.
    pub fn name(self) -> &'static str {
        match self {
            EnvelopeState::Off => "off",
            EnvelopeState::Attack => "attack",
            EnvelopeState::Decay => "decay",
            EnvelopeState::Sustain => "sustain",
            EnvelopeState::Release => "release",
        }
    }
}

/// Envelope timing, in seconds (times) and linear gain (sustain level).
///
/// A non-positive time makes its segment instantaneous. `sustain_time` may be
/// `f32::INFINITY` to disable the auto-release.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeParams {
    /// Seconds from 0 to peak.
    pub attack_time: f32,
    /// Seconds from peak to the sustain level.
    pub decay_time: f32,
    /// Level held during sustain (0..1).
    pub sustain_level: f32,
    /// Longest time spent in sustain before releasing on its own.
    pub sustain_time: f32,
    /// Seconds from the release-start level to silence.
    pub release_time: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack_time: 0.1,
            decay_time: 0.2,
            sustain_level: 0.7,
            sustain_time: 30.0,
            release_time: 0.3,
        }
    }
}

impl EnvelopeParams {
    /// Upper bound on the time from trigger to `Off` without re-triggering.
    pub fn max_duration(&self) -> f32 {
        self.attack_time.max(0.0)
            + self.decay_time.max(0.0)
            + self.sustain_time.max(0.0)
            + self.release_time.max(0.0)
    }

    /// Write the idealized envelope curve into `out`, spread over `total_time`
    /// seconds.
    ///
    /// Points are split between the segments in proportion to their duration;
    /// whatever is left after attack, decay and sustain is the release ramp.
    /// A non-positive `total_time` uses [`max_duration`](Self::max_duration).
    pub fn fill_preview(&self, out: &mut [f32], total_time: f32) {
        let n = out.len();
        if n == 0 {
            return;
        }
        let total = if total_time > 0.0 {
            total_time
        } else {
            self.max_duration().max(f32::EPSILON)
        };
        let points = |t: f32| (t.max(0.0) / total * n as f32) as usize;
        let sustain_level = self.sustain_level.clamp(0.0, 1.0);

        let attack = points(self.attack_time).min(n);
        let decay = points(self.decay_time).min(n - attack);
        let sustain = points(self.sustain_time).min(n - attack - decay);
        let release = n - attack - decay - sustain;

        let (attack_out, rest) = out.split_at_mut(attack);
        let (decay_out, rest) = rest.split_at_mut(decay);
        let (sustain_out, release_out) = rest.split_at_mut(sustain);

        for (i, v) in attack_out.iter_mut().enumerate() {
            *v = i as f32 / attack as f32;
        }
        for (i, v) in decay_out.iter_mut().enumerate() {
            *v = 1.0 - (1.0 - sustain_level) * (i as f32 / decay as f32);
        }
        sustain_out.fill(sustain_level);
        for (i, v) in release_out.iter_mut().enumerate() {
            *v = sustain_level * (1.0 - i as f32 / release as f32);
        }
    }
}

/// Per-voice ADSR state machine.
///
/// Time is supplied by the caller on every [`advance`](Self::advance), so the
/// same envelope works at any sample rate.
///
/// # Example
///
/// ```rust
/// use tins_synth::{Envelope, EnvelopeParams, EnvelopeState};
///
/// let mut env = Envelope::new(EnvelopeParams::default());
/// env.trigger();
/// let dt = 1.0 / 44100.0;
/// for _ in 0..100 {
///     env.advance(dt);
/// }
/// assert_eq!(env.state(), EnvelopeState::Attack);
///
/// env.release();
/// assert_eq!(env.state(), EnvelopeState::Release);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    params: EnvelopeParams,
    state: EnvelopeState,
    level: f32,
    sustain_elapsed: f32,
    /// Level lost per second while releasing, fixed when release starts.
    release_rate: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(EnvelopeParams::default())
    }
}

impl Envelope {
    /// Create an envelope in the `Off` state.
    pub fn new(params: EnvelopeParams) -> Self {
        let mut env = Self {
            params,
            state: EnvelopeState::Off,
            level: 0.0,
            sustain_elapsed: 0.0,
            release_rate: 0.0,
        };
        env.params.sustain_level = params.sustain_level.clamp(0.0, 1.0);
        env
    }

    /// Current timing.
    pub fn params(&self) -> &EnvelopeParams {
        &self.params
    }

    /// Replace the timing. Takes effect on the next advance.
    pub fn set_params(&mut self, params: EnvelopeParams) {
        self.params = params;
        self.params.sustain_level = params.sustain_level.clamp(0.0, 1.0);
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Current gain multiplier without advancing.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Seconds spent in the current sustain stage.
    pub fn sustain_elapsed(&self) -> f32 {
        self.sustain_elapsed
    }

    /// Whether the envelope produces sound.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Off
    }

    /// Start a note from silence: level 0, `Attack`.
    pub fn trigger(&mut self) {
        self.level = 0.0;
        self.sustain_elapsed = 0.0;
        self.state = EnvelopeState::Attack;
    }

    /// Re-enter `Attack` from the current level.
    pub fn retrigger(&mut self) {
        self.sustain_elapsed = 0.0;
        self.state = EnvelopeState::Attack;
    }

    /// Enter `Release` from any active state. No effect when `Off`.
    pub fn release(&mut self) {
        if self.state != EnvelopeState::Off {
            self.enter_release();
        }
    }

    /// Restart the sustain timer. No effect outside `Sustain`.
    pub fn refresh_sustain(&mut self) {
        if self.state == EnvelopeState::Sustain {
            self.sustain_elapsed = 0.0;
        }
    }

    /// Force silence.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Off;
        self.level = 0.0;
        self.sustain_elapsed = 0.0;
        self.release_rate = 0.0;
    }

    /// Advance by `dt` seconds and return the new level.
    #[inline]
    pub fn advance(&mut self, dt: f32) -> f32 {
        let p = self.params;
        match self.state {
            EnvelopeState::Off => {}
            EnvelopeState::Attack => {
                if p.attack_time > 0.0 {
                    self.level += dt / p.attack_time;
                } else {
                    self.level = 1.0;
                }
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.state = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => {
                if p.decay_time > 0.0 {
                    self.level -= dt / p.decay_time * (1.0 - p.sustain_level);
                } else {
                    self.level = p.sustain_level;
                }
                if self.level <= p.sustain_level {
                    self.level = p.sustain_level;
                    self.sustain_elapsed = 0.0;
                    self.state = EnvelopeState::Sustain;
                }
            }
            EnvelopeState::Sustain => {
                self.level = p.sustain_level;
                self.sustain_elapsed += dt;
                if self.sustain_elapsed >= p.sustain_time {
                    self.enter_release();
                }
            }
            EnvelopeState::Release => {
                if self.release_rate > 0.0 {
                    self.level -= dt * self.release_rate;
                } else {
                    self.level = 0.0;
                }
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.state = EnvelopeState::Off;
                }
            }
        }
        self.level
    }

    fn enter_release(&mut self) {
        // From sustain this is sustain_level / release_time per second.
        self.release_rate = if self.params.release_time > 0.0 {
            self.level / self.params.release_time
        } else {
            0.0
        };
        self.state = EnvelopeState::Release;
    }
}
