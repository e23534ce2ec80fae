//! Wave-shape functions with band-limited ripple correction.
//!
//! Each shape maps an [`Oscillator`] snapshot to one sample in roughly
//! [-1, 1]. Sawtooth and square carry hard discontinuities and are corrected
//! with a 2nd-order PolyBLEP residual ([`band_limited_ripple`]); sine needs no
//! correction; triangle and rounded-square are rendered naively.

use core::f32::consts::PI;
use core::fmt;
use core::str::FromStr;

use alloc::string::{String, ToString};
use libm::{fabsf, fmodf, powf, sinf};

use crate::oscillator::Oscillator;

/// The closed set of timbres the engine can render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WaveShape {
    /// `sin(2πp)`.
    #[default]
    Sine,
    /// Rising ramp with a corrected wrap.
    Sawtooth,
    /// Pulse with duty cycle taken from the shape parameter.
    Square,
    /// Piecewise-linear ramp, not band-limited.
    Triangle,
    /// Sigmoid-like square whose edge sharpness follows the shape parameter.
    RoundedSquare,
}

impl WaveShape {
    /// Every shape, in index order.
    pub const ALL: [WaveShape; 5] = [
        WaveShape::Sine,
        WaveShape::Sawtooth,
        WaveShape::Square,
        WaveShape::Triangle,
        WaveShape::RoundedSquare,
    ];

    /// Render one sample for the oscillator's current phase.
    #[inline]
    pub fn evaluate(self, osc: &Oscillator) -> f32 {
        match self {
            WaveShape::Sine => sine(osc),
            WaveShape::Sawtooth => sawtooth(osc),
            WaveShape::Square => square(osc),
            WaveShape::Triangle => triangle(osc),
            WaveShape::RoundedSquare => rounded_square(osc),
        }
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            WaveShape::Sine => "sine",
            WaveShape::Sawtooth => "sawtooth",
            WaveShape::Square => "square",
            WaveShape::Triangle => "triangle",
            WaveShape::RoundedSquare => "rounded-square",
        }
    }

    /// Whether the shape parameter changes the output.
    pub fn uses_shape_param(self) -> bool {
        matches!(self, WaveShape::Square | WaveShape::RoundedSquare)
    }

    /// Stable index for atomic storage. `0` is reserved for "no shape".
    pub fn to_index(self) -> u8 {
        match self {
            WaveShape::Sine => 1,
            WaveShape::Sawtooth => 2,
            WaveShape::Square => 3,
            WaveShape::Triangle => 4,
            WaveShape::RoundedSquare => 5,
        }
    }

    /// Inverse of [`to_index`](Self::to_index). `0` and unknown values map to `None`.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(WaveShape::Sine),
            2 => Some(WaveShape::Sawtooth),
            3 => Some(WaveShape::Square),
            4 => Some(WaveShape::Triangle),
            5 => Some(WaveShape::RoundedSquare),
            _ => None,
        }
    }
}

impl fmt::Display for WaveShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a wave-shape name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown wave shape '{0}' (expected sine, sawtooth, square, triangle or rounded-square)")]
pub struct ParseShapeError(pub String);

impl FromStr for WaveShape {
    type Err = ParseShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let any_of = |names: &[&str]| names.iter().any(|n| n.eq_ignore_ascii_case(s));
        if any_of(&["sine", "sin"]) {
            Ok(WaveShape::Sine)
        } else if any_of(&["sawtooth", "saw"]) {
            Ok(WaveShape::Sawtooth)
        } else if any_of(&["square", "pulse"]) {
            Ok(WaveShape::Square)
        } else if any_of(&["triangle", "tri"]) {
            Ok(WaveShape::Triangle)
        } else if any_of(&["rounded-square", "rounded_square", "roundedsquare"]) {
            Ok(WaveShape::RoundedSquare)
        } else {
            Err(ParseShapeError(s.to_string()))
        }
    }
}

/// 2nd-order PolyBLEP residual for a unit downward step at phase 0/1.
///
/// Within one increment after the wrap the residual rises from -1 to 0
/// (`2n - n² - 1`), within one increment before it rises from 0 to 1
/// (`n² + 2n + 1` with `n` negative). Everywhere else it is 0.
///
/// The window width is `|phase_delta|`, so backwards-running oscillators are
/// corrected at the same boundary. A zero increment returns 0.
#[inline]
pub fn band_limited_ripple(phase: f32, phase_delta: f32) -> f32 {
    let dt = fabsf(phase_delta);
    if phase < dt {
        let n = phase / dt;
        (n + n) - n * n - 1.0
    } else if phase > 1.0 - dt {
        let n = (phase - 1.0) / dt;
        n * n + (n + n) + 1.0
    } else {
        0.0
    }
}

/// Pure sine, no correction.
#[inline]
pub fn sine(osc: &Oscillator) -> f32 {
    sinf(2.0 * PI * osc.phase())
}

/// Band-limited sawtooth.
#[inline]
pub fn sawtooth(osc: &Oscillator) -> f32 {
    let phase = osc.phase();
    (2.0 * phase - 1.0) - band_limited_ripple(phase, osc.phase_delta())
}

/// Band-limited square with the duty cycle taken from `shape_param`,
/// clamped to 0..1.
///
/// The rising edge sits at phase 0 and the falling edge at the duty cycle;
/// the second correction is the same residual shifted so the falling edge
/// lands on the wrap, with the sign mirrored.
#[inline]
pub fn square(osc: &Oscillator) -> f32 {
    let phase = osc.phase();
    let dt = osc.phase_delta();
    let duty = osc.shape_param.clamp(0.0, 1.0);
    let naive = if phase < duty { 1.0 } else { -1.0 };
    naive + band_limited_ripple(phase, dt)
        - band_limited_ripple(fmodf(phase + (1.0 - duty), 1.0), dt)
}

/// Naive triangle.
#[inline]
pub fn triangle(osc: &Oscillator) -> f32 {
    let phase = osc.phase();
    if phase < 0.5 {
        4.0 * phase - 1.0
    } else {
        -4.0 * phase + 3.0
    }
}

/// `2 / (|s|^(s·sin 2πp) + 1) - 1` with `s = 8·shape_param + 2`.
#[inline]
pub fn rounded_square(osc: &Oscillator) -> f32 {
    let s = osc.shape_param * 8.0 + 2.0;
    let power = s * sinf(2.0 * PI * osc.phase());
    2.0 / (powf(fabsf(s), power) + 1.0) - 1.0
}
