//! Computer-keyboard note layout.
//!
//! Maps characters to semitone offsets from a base note. The default is the
//! home row, `a` through `'`, with `h` on A4.

use crate::bank::{VOICE_BANK_CAPACITY, VoiceBankFull};
use crate::oscillator::semitone_to_frequency;

/// Most keys a layout can hold; one keyed voice per key.
pub const MAX_KEYS: usize = VOICE_BANK_CAPACITY;

const HOME_ROW: [(char, i32); 11] = [
    ('a', -9),
    ('s', -7),
    ('d', -5),
    ('f', -4),
    ('g', -2),
    ('h', 0),
    ('j', 2),
    ('k', 3),
    ('l', 5),
    (';', 7),
    ('\'', 8),
];

/// Ordered key-to-pitch table.
///
/// ```rust
/// use tins_synth::KeyLayout;
///
/// let layout = KeyLayout::default();
/// let h = layout.index_of('h').unwrap();
/// assert_eq!(layout.frequency(h), Some(440.0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    keys: [(char, i32); MAX_KEYS],
    len: usize,
    base_semitone: i32,
}

impl Default for KeyLayout {
    fn default() -> Self {
        let mut keys = [('\0', 0); MAX_KEYS];
        keys[..HOME_ROW.len()].copy_from_slice(&HOME_ROW);
        Self {
            keys,
            len: HOME_ROW.len(),
            base_semitone: 0,
        }
    }
}

impl KeyLayout {
    /// Build a layout from `(key, semitone offset)` pairs.
    pub fn new(pairs: &[(char, i32)]) -> Result<Self, VoiceBankFull> {
        if pairs.len() > MAX_KEYS {
            return Err(VoiceBankFull {
                capacity: MAX_KEYS,
            });
        }
        let mut keys = [('\0', 0); MAX_KEYS];
        keys[..pairs.len()].copy_from_slice(pairs);
        Ok(Self {
            keys,
            len: pairs.len(),
            base_semitone: 0,
        })
    }

    /// Shift every key by `semitones`. `0` puts offset 0 on A4.
    pub fn with_base_semitone(mut self, semitones: i32) -> Self {
        self.base_semitone = semitones;
        self
    }

    /// Semitone shift applied to every key.
    pub fn base_semitone(&self) -> i32 {
        self.base_semitone
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the layout has no keys.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Position of `key`, if mapped.
    pub fn index_of(&self, key: char) -> Option<usize> {
        self.pairs().iter().position(|&(k, _)| k == key)
    }

    /// Character at `index`.
    pub fn key(&self, index: usize) -> Option<char> {
        self.pairs().get(index).map(|&(k, _)| k)
    }

    /// Absolute semitone offset from A4 at `index`.
    pub fn semitone(&self, index: usize) -> Option<i32> {
        self.pairs()
            .get(index)
            .map(|&(_, offset)| self.base_semitone + offset)
    }

    /// Pitch in Hz at `index`.
    pub fn frequency(&self, index: usize) -> Option<f32> {
        self.semitone(index)
            .map(|semitone| semitone_to_frequency(semitone as f32))
    }

    /// Mapped `(key, semitone offset)` pairs.
    pub fn pairs(&self) -> &[(char, i32)] {
        &self.keys[..self.len]
    }
}
