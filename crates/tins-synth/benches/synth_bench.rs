//! Criterion benchmarks for tins-synth
//!
//! Run with: cargo bench -p tins-synth

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tins_synth::{
    Envelope, EnvelopeParams, Oscillator, Synth, SynthSettings, UiVoice, VOICE_BANK_CAPACITY,
    WaveShape,
};

const SAMPLE_RATE: f32 = 44100.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];
const VOICE_COUNTS: &[usize] = &[1, 8, 32];

// ============================================================================
// Wave shape benchmarks
// ============================================================================

fn bench_wave_shapes(c: &mut Criterion) {
    let mut group = c.benchmark_group("WaveShape");

    for shape in WaveShape::ALL {
        for &block_size in BLOCK_SIZES {
            let mut osc = Oscillator::new(440.0, 1.0).with_shape_param(0.5);

            group.bench_with_input(
                BenchmarkId::new(shape.name(), block_size),
                &block_size,
                |b, &size| {
                    b.iter(|| {
                        let mut sum = 0.0f32;
                        for _ in 0..size {
                            osc.advance(0.0, SAMPLE_RATE);
                            sum += shape.evaluate(&osc);
                        }
                        black_box(sum)
                    })
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Envelope benchmarks
// ============================================================================

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("Envelope");
    let dt = 1.0 / SAMPLE_RATE;

    for &block_size in BLOCK_SIZES {
        let mut env = Envelope::new(EnvelopeParams {
            sustain_time: f32::INFINITY,
            ..EnvelopeParams::default()
        });
        env.trigger();

        group.bench_with_input(
            BenchmarkId::new("advance", block_size),
            &block_size,
            |b, &size| {
                b.iter(|| {
                    let mut sum = 0.0f32;
                    for _ in 0..size {
                        sum += env.advance(dt);
                    }
                    black_box(sum)
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Full render pass
// ============================================================================

fn bench_render_ui_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("Synth_UiVoices");

    for &voices in VOICE_COUNTS {
        for &block_size in BLOCK_SIZES {
            let mut synth = Synth::new(SynthSettings {
                sample_rate: SAMPLE_RATE,
                block_size,
                ..SynthSettings::default()
            });
            let list: Vec<UiVoice> = (0..voices)
                .map(|i| {
                    let shape = WaveShape::ALL[i % WaveShape::ALL.len()];
                    UiVoice::new(shape, 110.0 * (i + 1) as f32, 0.02)
                })
                .collect();
            let _ = synth.bridge().apply_ui_voices(&list);

            group.bench_with_input(
                BenchmarkId::new(format!("{voices}_voices"), block_size),
                &block_size,
                |b, _| b.iter(|| black_box(synth.render_block()[0])),
            );
        }
    }

    group.finish();
}

fn bench_render_keyed(c: &mut Criterion) {
    let mut group = c.benchmark_group("Synth_Keyed");

    for &block_size in BLOCK_SIZES {
        let mut synth = Synth::new(SynthSettings {
            sample_rate: SAMPLE_RATE,
            block_size,
            envelope: EnvelopeParams {
                sustain_time: f32::INFINITY,
                ..EnvelopeParams::default()
            },
            key_shape: WaveShape::Sawtooth,
            ..SynthSettings::default()
        });
        let bridge = synth.bridge().clone();
        for index in 0..synth.keyed_voice_count().min(VOICE_BANK_CAPACITY) {
            let _ = bridge.set_key_state(index, true);
        }

        group.bench_with_input(
            BenchmarkId::new("all_keys_held", block_size),
            &block_size,
            |b, _| b.iter(|| black_box(synth.render_block()[0])),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_wave_shapes,
    bench_envelope,
    bench_render_ui_voices,
    bench_render_keyed
);
criterion_main!(benches);
