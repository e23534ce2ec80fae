//! The real-time synthesis engine.
//!
//! [`Synth`] owns every voice bank and the output block. One free-voice bank
//! per [`WaveShape`] holds the UI-added voices and is rebuilt from the
//! bridge's voice table each block. One keyed bank holds a voice per layout
//! key for the lifetime of the engine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::bank::{VOICE_BANK_CAPACITY, Voice, VoiceBank};
use crate::control::{
    ControlBridge, DEFAULT_COMMAND_CAPACITY, KeyVoiceSettings, UI_VOICE_CAPACITY, VoiceCommand,
};
use crate::envelope::{Envelope, EnvelopeParams, EnvelopeState};
use crate::keyboard::KeyLayout;
use crate::oscillator::Oscillator;
use crate::shape::WaveShape;
use crate::tap::SignalTap;

/// Engine construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthSettings {
    /// Output sample rate in Hz.
    pub sample_rate: f32,
    /// Samples per render pass.
    pub block_size: usize,
    /// Envelope applied to keyed voices when they start from `Off`.
    pub envelope: EnvelopeParams,
    /// Keys and their pitches; one keyed voice per key.
    pub layout: KeyLayout,
    /// Wave shape of the keyed voices.
    pub key_shape: WaveShape,
    /// Gain and shape parameter of a pressed key.
    pub key_voice: KeyVoiceSettings,
    /// Keep a held key's voice in sustain until the key is released.
    pub hold_refreshes_sustain: bool,
    /// Depth of the control command queue.
    pub command_capacity: usize,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            block_size: 1024,
            envelope: EnvelopeParams::default(),
            layout: KeyLayout::default(),
            key_shape: WaveShape::Sine,
            key_voice: KeyVoiceSettings::default(),
            hold_refreshes_sustain: false,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}

/// Block-based polyphonic renderer.
///
/// Control threads talk to it through [`Synth::bridge`]; the thread that owns
/// the `Synth` (normally the audio callback) calls [`Synth::render_block`] or
/// [`Synth::fill_interleaved`]. Rendering never allocates, locks or logs.
///
/// # Example
///
/// ```rust
/// use tins_synth::{Synth, SynthSettings};
///
/// let mut synth = Synth::new(SynthSettings {
///     block_size: 256,
///     ..SynthSettings::default()
/// });
/// let bridge = synth.bridge().clone();
///
/// bridge.set_key('h', true)?;
/// let block = synth.render_block();
/// assert_eq!(block.len(), 256);
/// # Ok::<(), tins_synth::ControlError>(())
/// ```
#[derive(Debug)]
pub struct Synth {
    sample_rate: f32,
    envelope: EnvelopeParams,
    key_shape: WaveShape,
    hold_refreshes_sustain: bool,
    /// Indexed by `WaveShape::to_index() - 1`.
    free_banks: [VoiceBank<VOICE_BANK_CAPACITY>; WaveShape::ALL.len()],
    keyed: VoiceBank<VOICE_BANK_CAPACITY>,
    signal: Vec<f32>,
    read_pos: usize,
    last_block_duration: Duration,
    bridge: ControlBridge,
    commands: Receiver<VoiceCommand>,
    tap: Arc<SignalTap>,
}

impl Default for Synth {
    fn default() -> Self {
        Self::new(SynthSettings::default())
    }
}

impl Synth {
    /// Build an engine and its control bridge.
    pub fn new(settings: SynthSettings) -> Self {
        let block_size = settings.block_size.max(1);
        let layout = settings.layout;
        let key_voice = settings.key_voice;

        let mut keyed = VoiceBank::new();
        for index in 0..layout.len() {
            let Ok(slot) = keyed.allocate() else {
                break;
            };
            let oscillator =
                Oscillator::new(layout.frequency(index).unwrap_or(0.0), key_voice.amplitude)
                    .with_shape_param(key_voice.shape_param);
            *slot = Voice::keyed(oscillator, Envelope::new(settings.envelope));
        }

        tracing::debug!(
            sample_rate = settings.sample_rate,
            block_size,
            keys = layout.len(),
            key_shape = %settings.key_shape,
            "synth engine created"
        );

        let (bridge, commands) =
            ControlBridge::new(layout, key_voice, settings.command_capacity);

        Self {
            sample_rate: settings.sample_rate,
            envelope: settings.envelope,
            key_shape: settings.key_shape,
            hold_refreshes_sustain: settings.hold_refreshes_sustain,
            free_banks: core::array::from_fn(|_| VoiceBank::new()),
            keyed,
            signal: vec![0.0; block_size],
            read_pos: block_size,
            last_block_duration: Duration::ZERO,
            bridge,
            commands,
            tap: Arc::new(SignalTap::new(block_size)),
        }
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Samples per render pass.
    pub fn block_size(&self) -> usize {
        self.signal.len()
    }

    /// Handle for control threads. Clone it to move it elsewhere.
    pub fn bridge(&self) -> &ControlBridge {
        &self.bridge
    }

    /// Shared view of the last rendered block.
    pub fn tap(&self) -> &Arc<SignalTap> {
        &self.tap
    }

    /// Envelope used for the next keyed trigger.
    pub fn envelope_params(&self) -> EnvelopeParams {
        self.envelope
    }

    /// Change the envelope for future triggers. Sounding notes keep theirs.
    pub fn set_envelope_params(&mut self, params: EnvelopeParams) {
        self.envelope = params;
    }

    /// Wave shape of the keyed voices.
    pub fn key_shape(&self) -> WaveShape {
        self.key_shape
    }

    /// Change the wave shape of the keyed voices.
    pub fn set_key_shape(&mut self, shape: WaveShape) {
        self.key_shape = shape;
    }

    /// The keyed voice for layout index `index`.
    pub fn keyed_voice(&self, index: usize) -> Option<&Voice> {
        self.keyed.get(index)
    }

    /// Number of keyed voices.
    pub fn keyed_voice_count(&self) -> usize {
        self.keyed.len()
    }

    /// The free-voice bank for `shape`, as built by the last render pass.
    pub fn free_bank(&self, shape: WaveShape) -> &VoiceBank<VOICE_BANK_CAPACITY> {
        &self.free_banks[bank_slot(shape)]
    }

    /// The last rendered block.
    pub fn signal(&self) -> &[f32] {
        &self.signal
    }

    /// Wall-clock time of the last render pass.
    pub fn last_block_duration(&self) -> Duration {
        self.last_block_duration
    }

    /// UI voices that did not fit in their bank, summed over every block.
    pub fn dropped_voices(&self) -> u64 {
        self.bridge.dropped_voices()
    }

    /// Run one render pass and return the new block.
    ///
    /// Pending control commands are applied first, then the free-voice banks
    /// are rebuilt from the UI table. The block is zeroed before any voice is
    /// accumulated, so nothing from the previous pass leaks in. The result is
    /// not clipped.
    pub fn render_block(&mut self) -> &[f32] {
        let start = Instant::now();

        while let Ok(command) = self.commands.try_recv() {
            self.apply_command(command);
        }
        if self.hold_refreshes_sustain {
            self.refresh_held_keys();
        }
        self.rebuild_free_banks();

        self.signal.fill(0.0);
        for (shape, bank) in WaveShape::ALL.iter().zip(self.free_banks.iter_mut()) {
            bank.render_into(*shape, &mut self.signal, self.sample_rate);
        }
        self.keyed
            .render_into(self.key_shape, &mut self.signal, self.sample_rate);

        self.last_block_duration = start.elapsed();
        self.tap.publish(&self.signal, self.last_block_duration);
        self.read_pos = 0;
        &self.signal
    }

    /// Fill an interleaved device buffer of any length.
    ///
    /// Each mono sample is copied to every channel of its frame. A new block
    /// is rendered whenever the current one has been consumed.
    pub fn fill_interleaved(&mut self, out: &mut [f32], channels: usize) {
        for frame in out.chunks_mut(channels.max(1)) {
            if self.read_pos >= self.signal.len() {
                self.render_block();
            }
            frame.fill(self.signal[self.read_pos]);
            self.read_pos += 1;
        }
    }

    fn apply_command(&mut self, command: VoiceCommand) {
        match command {
            VoiceCommand::Press {
                voice,
                frequency,
                amplitude,
                shape_param,
            } => {
                let params = self.envelope;
                let Some(voice) = self.keyed.get_mut(voice) else {
                    return;
                };
                let Some(envelope) = voice.envelope.as_mut() else {
                    return;
                };
                match envelope.state() {
                    EnvelopeState::Off => {
                        voice.oscillator.frequency = frequency;
                        voice.oscillator.amplitude = amplitude;
                        voice.oscillator.shape_param = shape_param.clamp(0.0, 1.0);
                        envelope.set_params(params);
                        envelope.trigger();
                    }
                    EnvelopeState::Sustain => envelope.refresh_sustain(),
                    EnvelopeState::Release => envelope.retrigger(),
                    EnvelopeState::Attack | EnvelopeState::Decay => {}
                }
            }
            VoiceCommand::Release { voice } => {
                if let Some(envelope) = self
                    .keyed
                    .get_mut(voice)
                    .and_then(|voice| voice.envelope.as_mut())
                {
                    envelope.release();
                }
            }
        }
    }

    fn refresh_held_keys(&mut self) {
        for (index, voice) in self.keyed.active_mut().iter_mut().enumerate() {
            if !self.bridge.is_key_held(index) {
                continue;
            }
            if let Some(envelope) = voice.envelope.as_mut() {
                envelope.refresh_sustain();
            }
        }
    }

    fn rebuild_free_banks(&mut self) {
        for bank in &mut self.free_banks {
            bank.clear();
        }
        let count = self.bridge.ui_voice_count().min(UI_VOICE_CAPACITY);
        for index in 0..count {
            let Some(ui) = self.bridge.ui_voice(index) else {
                break;
            };
            let Some(shape) = ui.shape else {
                continue;
            };
            match self.free_banks[bank_slot(shape)].allocate() {
                Ok(voice) => {
                    voice.oscillator.frequency = ui.frequency;
                    voice.oscillator.amplitude = ui.amplitude;
                    voice.oscillator.shape_param = ui.shape_param.clamp(0.0, 1.0);
                    voice.envelope = None;
                }
                Err(_) => self.bridge.record_dropped_voice(),
            }
        }
    }
}

fn bank_slot(shape: WaveShape) -> usize {
    usize::from(shape.to_index()) - 1
}
