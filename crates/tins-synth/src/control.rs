//! Control-plane bridge between event sources and the render pass.
//!
//! Control threads (keyboard, network, UI) hold a cloned [`ControlBridge`].
//! Nothing they do touches engine state directly:
//!
//! - Key edges become [`VoiceCommand`]s on a bounded channel that the render
//!   pass drains at the start of each block. Only the render pass writes
//!   envelope state.
//! - UI voice descriptors live in a fixed table of atomics. The render pass
//!   snapshots the table once per block and rebuilds its free-voice banks
//!   from it, so bank counts are only ever changed on the audio thread.
//!
//! ```text
//!  keyboard / TCP ──set_key_state──► [AtomicBool per key] ──edge──► Sender<VoiceCommand>
//!                                                                         │ try_send
//!  UI ──apply_ui_parameters──► [UiVoiceSlot; N] (atomics)                 ▼
//!                                         │                     Receiver (audio thread)
//!                                         └──── snapshot per block ───────┘
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::bank::VOICE_BANK_CAPACITY;
use crate::keyboard::KeyLayout;
use crate::shape::WaveShape;

/// Number of UI voice descriptors the bridge can hold.
pub const UI_VOICE_CAPACITY: usize = 2 * VOICE_BANK_CAPACITY;

/// Default depth of the command queue.
pub const DEFAULT_COMMAND_CAPACITY: usize = 256;

/// A request for the render pass to change a keyed voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceCommand {
    /// Start (or refresh) the note on `voice`.
    Press {
        /// Keyed voice index.
        voice: usize,
        /// Pitch in Hz, applied when the voice starts from `Off`.
        frequency: f32,
        /// Linear gain, applied when the voice starts from `Off`.
        amplitude: f32,
        /// Shape parameter, applied when the voice starts from `Off`.
        shape_param: f32,
    },
    /// Move `voice` into its release stage.
    Release {
        /// Keyed voice index.
        voice: usize,
    },
}

/// Errors reported to control-plane callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    /// The index does not name a voice.
    #[error("voice index {index} out of range (have {count})")]
    VoiceOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of addressable voices.
        count: usize,
    },
    /// The command queue is full; the event was dropped.
    #[error("control queue full, event dropped")]
    QueueFull,
    /// The character is not part of the key layout.
    #[error("key '{0}' is not mapped to a voice")]
    UnknownKey(char),
    /// The engine that owned the receiving end is gone.
    #[error("synth engine has shut down")]
    Disconnected,
}

/// Pitch, gain and shape of one UI-added voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiVoice {
    /// Timbre; `None` keeps the slot but renders nothing.
    pub shape: Option<WaveShape>,
    /// Pitch in Hz.
    pub frequency: f32,
    /// Linear gain.
    pub amplitude: f32,
    /// Shape parameter (0..1).
    pub shape_param: f32,
}

impl UiVoice {
    /// A voice with shape parameter 0.5.
    pub fn new(shape: WaveShape, frequency: f32, amplitude: f32) -> Self {
        Self {
            shape: Some(shape),
            frequency,
            amplitude,
            shape_param: 0.5,
        }
    }

    /// Builder-style shape parameter.
    pub fn with_shape_param(mut self, shape_param: f32) -> Self {
        self.shape_param = shape_param;
        self
    }
}

/// Amplitude and shape parameter given to a keyed voice on press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyVoiceSettings {
    /// Linear gain of a pressed key.
    pub amplitude: f32,
    /// Shape parameter of a pressed key.
    pub shape_param: f32,
}

impl Default for KeyVoiceSettings {
    fn default() -> Self {
        Self {
            amplitude: 0.5,
            shape_param: 1.0,
        }
    }
}

/// f32 stored as bits in an `AtomicU32`.
#[derive(Debug, Default)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    #[inline]
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    #[inline]
    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct UiVoiceSlot {
    frequency: AtomicF32,
    amplitude: AtomicF32,
    shape_param: AtomicF32,
    /// [`WaveShape::to_index`], 0 for none.
    shape: AtomicU8,
}

impl UiVoiceSlot {
    fn store(&self, voice: &UiVoice) {
        self.frequency.store(voice.frequency);
        self.amplitude.store(voice.amplitude);
        self.shape_param.store(voice.shape_param);
        self.shape
            .store(voice.shape.map_or(0, WaveShape::to_index), Ordering::Release);
    }

    fn load(&self) -> UiVoice {
        UiVoice {
            shape: WaveShape::from_index(self.shape.load(Ordering::Acquire)),
            frequency: self.frequency.load(),
            amplitude: self.amplitude.load(),
            shape_param: self.shape_param.load(),
        }
    }
}

#[derive(Debug)]
struct Shared {
    layout: KeyLayout,
    key_voice: KeyVoiceSettings,
    keys: Box<[AtomicBool]>,
    commands: Sender<VoiceCommand>,
    ui_voices: Box<[UiVoiceSlot]>,
    ui_count: AtomicUsize,
    dropped_voices: AtomicU64,
}

/// Thread-safe handle for requesting voice changes.
///
/// Cheap to clone; every clone talks to the same engine. All methods are
/// lock-free and never block.
#[derive(Debug, Clone)]
pub struct ControlBridge {
    shared: Arc<Shared>,
}

impl ControlBridge {
    /// Create a bridge and the receiving end the engine drains.
    pub(crate) fn new(
        layout: KeyLayout,
        key_voice: KeyVoiceSettings,
        command_capacity: usize,
    ) -> (Self, Receiver<VoiceCommand>) {
        let (commands, receiver) = bounded(command_capacity.max(1));
        let keys = (0..layout.len()).map(|_| AtomicBool::new(false)).collect();
        let ui_voices = (0..UI_VOICE_CAPACITY)
            .map(|_| UiVoiceSlot::default())
            .collect();
        let shared = Shared {
            layout,
            key_voice,
            keys,
            commands,
            ui_voices,
            ui_count: AtomicUsize::new(0),
            dropped_voices: AtomicU64::new(0),
        };
        (
            Self {
                shared: Arc::new(shared),
            },
            receiver,
        )
    }

    /// Key layout used to map indices and characters to pitches.
    pub fn layout(&self) -> &KeyLayout {
        &self.shared.layout
    }

    /// Gain and shape parameter applied to pressed keys.
    pub fn key_voice(&self) -> KeyVoiceSettings {
        self.shared.key_voice
    }

    /// Report a key as held or released.
    ///
    /// Only edges produce work: pressing a held key or releasing a released
    /// one is a no-op. A press queues [`VoiceCommand::Press`] with the layout
    /// pitch, a release queues [`VoiceCommand::Release`]. If the queue is
    /// full the edge is rolled back, so repeating the call later still counts
    /// as an edge.
    pub fn set_key_state(&self, index: usize, pressed: bool) -> Result<(), ControlError> {
        let key = self
            .shared
            .keys
            .get(index)
            .ok_or(ControlError::VoiceOutOfRange {
                index,
                count: self.shared.keys.len(),
            })?;
        if key.swap(pressed, Ordering::AcqRel) == pressed {
            return Ok(());
        }

        let command = if pressed {
            VoiceCommand::Press {
                voice: index,
                frequency: self.shared.layout.frequency(index).unwrap_or(0.0),
                amplitude: self.shared.key_voice.amplitude,
                shape_param: self.shared.key_voice.shape_param,
            }
        } else {
            VoiceCommand::Release { voice: index }
        };

        tracing::trace!(index, pressed, "key edge");
        self.send(command).inspect_err(|_| {
            key.store(!pressed, Ordering::Release);
        })
    }

    /// [`set_key_state`](Self::set_key_state) by layout character.
    pub fn set_key(&self, key: char, pressed: bool) -> Result<(), ControlError> {
        let index = self
            .shared
            .layout
            .index_of(key)
            .ok_or(ControlError::UnknownKey(key))?;
        self.set_key_state(index, pressed)
    }

    /// Whether the key at `index` is currently held.
    pub fn is_key_held(&self, index: usize) -> bool {
        self.shared
            .keys
            .get(index)
            .is_some_and(|key| key.load(Ordering::Acquire))
    }

    /// Queue a press on a keyed voice with explicit parameters.
    ///
    /// Bypasses edge tracking; the key-held state is not changed.
    pub fn press_voice(
        &self,
        index: usize,
        frequency: f32,
        amplitude: f32,
        shape_param: f32,
    ) -> Result<(), ControlError> {
        self.check_keyed(index)?;
        self.send(VoiceCommand::Press {
            voice: index,
            frequency,
            amplitude,
            shape_param,
        })
    }

    /// Queue a release on a keyed voice.
    pub fn release_voice(&self, index: usize) -> Result<(), ControlError> {
        self.check_keyed(index)?;
        self.send(VoiceCommand::Release { voice: index })
    }

    /// Update pitch, gain and shape parameter of UI voice `index` in place.
    ///
    /// Visible to the render pass at its next block. Fields are stored one at
    /// a time, so a block may see a mix of old and new values.
    pub fn apply_ui_parameters(
        &self,
        index: usize,
        frequency: f32,
        amplitude: f32,
        shape_param: f32,
    ) -> Result<(), ControlError> {
        let slot = self.ui_slot(index)?;
        slot.frequency.store(frequency);
        slot.amplitude.store(amplitude);
        slot.shape_param.store(shape_param);
        Ok(())
    }

    /// Change the timbre of UI voice `index`. `None` mutes it.
    pub fn set_ui_voice_shape(
        &self,
        index: usize,
        shape: Option<WaveShape>,
    ) -> Result<(), ControlError> {
        let slot = self.ui_slot(index)?;
        slot.shape
            .store(shape.map_or(0, WaveShape::to_index), Ordering::Release);
        Ok(())
    }

    /// Set how many UI voices, from index 0, are active.
    pub fn set_ui_voice_count(&self, count: usize) -> Result<(), ControlError> {
        if count > UI_VOICE_CAPACITY {
            return Err(ControlError::VoiceOutOfRange {
                index: count - 1,
                count: UI_VOICE_CAPACITY,
            });
        }
        self.shared.ui_count.store(count, Ordering::Release);
        Ok(())
    }

    /// Replace the whole UI voice list.
    ///
    /// Slots are written first and the count is published last. A list longer
    /// than [`UI_VOICE_CAPACITY`] is rejected without changing anything.
    pub fn apply_ui_voices(&self, voices: &[UiVoice]) -> Result<(), ControlError> {
        if voices.len() > UI_VOICE_CAPACITY {
            return Err(ControlError::VoiceOutOfRange {
                index: voices.len() - 1,
                count: UI_VOICE_CAPACITY,
            });
        }
        for (slot, voice) in self.shared.ui_voices.iter().zip(voices) {
            slot.store(voice);
        }
        self.shared.ui_count.store(voices.len(), Ordering::Release);
        Ok(())
    }

    /// Number of active UI voices.
    pub fn ui_voice_count(&self) -> usize {
        self.shared.ui_count.load(Ordering::Acquire)
    }

    /// Snapshot of UI voice `index`, active or not.
    pub fn ui_voice(&self, index: usize) -> Option<UiVoice> {
        self.shared.ui_voices.get(index).map(UiVoiceSlot::load)
    }

    /// UI voices that did not fit in their bank, since startup.
    pub fn dropped_voices(&self) -> u64 {
        self.shared.dropped_voices.load(Ordering::Relaxed)
    }

    pub(crate) fn record_dropped_voice(&self) {
        self.shared.dropped_voices.fetch_add(1, Ordering::Relaxed);
    }

    fn check_keyed(&self, index: usize) -> Result<(), ControlError> {
        let count = self.shared.layout.len();
        if index < count {
            Ok(())
        } else {
            Err(ControlError::VoiceOutOfRange { index, count })
        }
    }

    fn ui_slot(&self, index: usize) -> Result<&UiVoiceSlot, ControlError> {
        self.shared
            .ui_voices
            .get(index)
            .ok_or(ControlError::VoiceOutOfRange {
                index,
                count: UI_VOICE_CAPACITY,
            })
    }

    fn send(&self, command: VoiceCommand) -> Result<(), ControlError> {
        self.shared.commands.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => {
                tracing::warn!(?command, "control queue full, dropping event");
                ControlError::QueueFull
            }
            TrySendError::Disconnected(_) => ControlError::Disconnected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge(capacity: usize) -> (ControlBridge, Receiver<VoiceCommand>) {
        ControlBridge::new(KeyLayout::default(), KeyVoiceSettings::default(), capacity)
    }

    #[test]
    fn press_edge_queues_layout_pitch() {
        let (bridge, rx) = bridge(8);
        bridge.set_key_state(5, true).unwrap();
        assert_eq!(
            rx.try_recv(),
            Ok(VoiceCommand::Press {
                voice: 5,
                frequency: 440.0,
                amplitude: 0.5,
                shape_param: 1.0,
            })
        );
        assert!(bridge.is_key_held(5));
    }

    #[test]
    fn repeated_state_is_not_an_edge() {
        let (bridge, rx) = bridge(8);
        bridge.set_key_state(0, true).unwrap();
        bridge.set_key_state(0, true).unwrap();
        bridge.set_key_state(0, false).unwrap();
        bridge.set_key_state(0, false).unwrap();
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn release_edge_queues_release() {
        let (bridge, rx) = bridge(8);
        bridge.set_key_state(3, true).unwrap();
        bridge.set_key_state(3, false).unwrap();
        let commands: Vec<_> = rx.try_iter().collect();
        assert_eq!(commands[1], VoiceCommand::Release { voice: 3 });
        assert!(!bridge.is_key_held(3));
    }

    #[test]
    fn out_of_range_key_is_rejected() {
        let (bridge, _rx) = bridge(8);
        assert_eq!(
            bridge.set_key_state(11, true),
            Err(ControlError::VoiceOutOfRange {
                index: 11,
                count: 11
            })
        );
    }

    #[test]
    fn set_key_by_char() {
        let (bridge, rx) = bridge(8);
        bridge.set_key(';', true).unwrap();
        assert!(matches!(
            rx.try_recv(),
            Ok(VoiceCommand::Press { voice: 9, .. })
        ));
        assert_eq!(bridge.set_key('z', true), Err(ControlError::UnknownKey('z')));
    }

    #[test]
    fn full_queue_rolls_back_edge() {
        let (bridge, rx) = bridge(1);
        bridge.set_key_state(0, true).unwrap();
        assert_eq!(bridge.set_key_state(1, true), Err(ControlError::QueueFull));
        assert!(!bridge.is_key_held(1));

        rx.try_recv().unwrap();
        bridge.set_key_state(1, true).unwrap();
        assert!(bridge.is_key_held(1));
    }

    #[test]
    fn dropped_engine_reports_disconnect() {
        let (bridge, rx) = bridge(4);
        drop(rx);
        assert_eq!(bridge.release_voice(0), Err(ControlError::Disconnected));
    }

    #[test]
    fn direct_press_and_release() {
        let (bridge, rx) = bridge(4);
        bridge.press_voice(2, 100.0, 0.25, 0.5).unwrap();
        bridge.release_voice(2).unwrap();
        assert!(bridge.press_voice(40, 100.0, 0.25, 0.5).is_err());
        assert_eq!(rx.try_iter().count(), 2);
        assert!(!bridge.is_key_held(2));
    }

    #[test]
    fn ui_parameters_update_in_place() {
        let (bridge, _rx) = bridge(4);
        bridge
            .apply_ui_voices(&[UiVoice::new(WaveShape::Square, 220.0, 0.3)])
            .unwrap();
        bridge.apply_ui_parameters(0, 330.0, 0.2, 0.25).unwrap();
        let voice = bridge.ui_voice(0).unwrap();
        assert_eq!(voice.shape, Some(WaveShape::Square));
        assert_eq!(voice.frequency, 330.0);
        assert_eq!(voice.amplitude, 0.2);
        assert_eq!(voice.shape_param, 0.25);
        assert_eq!(bridge.ui_voice_count(), 1);
    }

    #[test]
    fn ui_table_bounds() {
        let (bridge, _rx) = bridge(4);
        assert!(bridge.apply_ui_parameters(UI_VOICE_CAPACITY, 1.0, 1.0, 1.0).is_err());
        assert!(bridge.set_ui_voice_count(UI_VOICE_CAPACITY + 1).is_err());
        let too_many = vec![UiVoice::new(WaveShape::Sine, 1.0, 1.0); UI_VOICE_CAPACITY + 1];
        assert!(bridge.apply_ui_voices(&too_many).is_err());
        assert_eq!(bridge.ui_voice_count(), 0);
    }

    #[test]
    fn shape_can_be_cleared() {
        let (bridge, _rx) = bridge(4);
        bridge
            .apply_ui_voices(&[UiVoice::new(WaveShape::Triangle, 100.0, 1.0)])
            .unwrap();
        bridge.set_ui_voice_shape(0, None).unwrap();
        assert_eq!(bridge.ui_voice(0).unwrap().shape, None);
    }

    #[test]
    fn clones_share_state() {
        let (bridge, rx) = bridge(4);
        let other = bridge.clone();
        std::thread::spawn(move || other.set_key_state(1, true))
            .join()
            .unwrap()
            .unwrap();
        assert!(bridge.is_key_held(1));
        assert_eq!(rx.try_iter().count(), 1);
    }
}
