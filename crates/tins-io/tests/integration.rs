//! Integration tests for tins-io: WAV output and the backend trait driving
//! a real synth engine.

use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tins_io::{
    AudioBackend, AudioDevice, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle,
    WavFormat, WavSink, WavSpec, read_wav, read_wav_info, write_wav,
};
use tins_synth::{Synth, SynthSettings, UiVoice, WaveShape};

// ---------------------------------------------------------------------------
// Manual backend: the test pulls buffers instead of a sound card
// ---------------------------------------------------------------------------

type SharedCallback = Arc<Mutex<Option<OutputCallback>>>;

struct ManualBackend {
    callback: SharedCallback,
}

impl ManualBackend {
    fn new() -> Self {
        Self {
            callback: Arc::new(Mutex::new(None)),
        }
    }

    /// Ask the stream for one hardware buffer.
    fn pull(&self, frames: usize, channels: usize) -> Vec<f32> {
        let mut buffer = vec![f32::NAN; frames * channels];
        let mut guard = self.callback.lock().unwrap();
        let callback = guard.as_mut().expect("stream was built");
        callback(&mut buffer);
        buffer
    }
}

impl AudioBackend for ManualBackend {
    fn name(&self) -> &str {
        "manual"
    }

    fn list_devices(&self) -> tins_io::Result<Vec<AudioDevice>> {
        Ok(vec![AudioDevice {
            name: "manual".to_string(),
            is_default: true,
            default_sample_rate: 44100,
            channels: 2,
        }])
    }

    fn default_output_device(&self) -> tins_io::Result<Option<AudioDevice>> {
        Ok(self.list_devices()?.into_iter().next())
    }

    fn build_output_stream(
        &self,
        _config: &BackendStreamConfig,
        callback: OutputCallback,
        _error_callback: ErrorCallback,
    ) -> tins_io::Result<StreamHandle> {
        *self.callback.lock().unwrap() = Some(callback);
        Ok(StreamHandle::new(()))
    }
}

fn sine_synth(block_size: usize) -> Synth {
    let synth = Synth::new(SynthSettings {
        block_size,
        ..Default::default()
    });
    synth
        .bridge()
        .apply_ui_voices(&[UiVoice::new(WaveShape::Sine, 441.0, 0.5)])
        .unwrap();
    synth
}

#[test]
fn backend_is_object_safe() {
    let backend: Box<dyn AudioBackend> = Box::new(ManualBackend::new());
    assert_eq!(backend.name(), "manual");
    assert_eq!(
        backend.actual_sample_rate(&BackendStreamConfig::default()),
        44100
    );
    assert!(backend.default_output_device().unwrap().unwrap().is_default);
}

#[test]
fn stream_fills_odd_sized_stereo_buffers() {
    let backend = ManualBackend::new();
    let mut synth = sine_synth(64);
    let config = BackendStreamConfig::default();
    let channels = config.channels as usize;

    let _stream = backend
        .build_output_stream(
            &config,
            Box::new(move |out: &mut [f32]| synth.fill_interleaved(out, channels)),
            Box::new(|_| {}),
        )
        .unwrap();

    // 100 frames spans two engine blocks of 64.
    let first = backend.pull(100, channels);
    let second = backend.pull(100, channels);

    let mono: Vec<f32> = first
        .chunks(2)
        .chain(second.chunks(2))
        .map(|frame| {
            assert_eq!(frame[0], frame[1], "channels carry the same sample");
            frame[0]
        })
        .collect();

    assert!(mono.iter().all(|s| s.is_finite()));
    for (n, &sample) in mono.iter().enumerate() {
        let expected =
            0.5 * (2.0 * std::f32::consts::PI * 441.0 * (n + 1) as f32 / 44100.0).sin();
        assert!(
            (sample - expected).abs() < 1e-3,
            "sample {n}: {sample} vs {expected}"
        );
    }
}

// ---------------------------------------------------------------------------
// WAV output
// ---------------------------------------------------------------------------

#[test]
fn rendered_blocks_land_in_wav() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.wav");
    let mut synth = sine_synth(128);

    let mut sink = WavSink::create(&path, WavSpec::default()).unwrap();
    for _ in 0..4 {
        let block = synth.render_block();
        sink.write(block).unwrap();
    }
    assert_eq!(sink.frames_written(), 512);
    sink.finalize().unwrap();

    let info = read_wav_info(&path).unwrap();
    assert_eq!(info.sample_rate, 44100);
    assert_eq!(info.num_frames, 512);
    assert_eq!(info.format, WavFormat::IeeeFloat);

    let (samples, _) = read_wav(&path).unwrap();
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak > 0.45 && peak <= 0.5);
}

#[test]
fn write_empty_buffer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.wav");
    write_wav(&path, &[], WavSpec::default()).unwrap();

    let (samples, spec) = read_wav(&path).unwrap();
    assert!(samples.is_empty());
    assert_eq!(spec.sample_rate, 44100);
}

#[test]
fn i24_roundtrip_keeps_precision() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("i24.wav");
    let samples: Vec<f32> = (0..480).map(|i| ((i as f32) * 0.01).sin() * 0.8).collect();
    let spec = WavSpec {
        bits_per_sample: 24,
        sample_rate: 48000,
        ..Default::default()
    };
    write_wav(&path, &samples, spec).unwrap();

    let info = read_wav_info(&path).unwrap();
    assert_eq!(info.format, WavFormat::Pcm);
    assert_eq!(info.bits_per_sample, 24);

    let (loaded, _) = read_wav(&path).unwrap();
    for (a, b) in samples.iter().zip(&loaded) {
        assert!((a - b).abs() < 1e-5);
    }
}

#[test]
fn stereo_file_reads_back_as_mono_mix() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stereo.wav");
    let spec = WavSpec {
        channels: 2,
        ..Default::default()
    };
    write_wav(&path, &[1.0, 0.0, 0.5, -0.5], spec).unwrap();

    let (mono, spec) = read_wav(&path).unwrap();
    assert_eq!(spec.channels, 2);
    assert_eq!(mono, vec![0.5, 0.0]);
}
