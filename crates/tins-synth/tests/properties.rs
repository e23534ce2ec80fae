//! Property-based tests for the DSP core.
//!
//! Oscillator periodicity, wave-shape output ranges, envelope termination
//! and voice bank bounds under arbitrary inputs.

use proptest::prelude::*;
use tins_synth::{Envelope, EnvelopeParams, Oscillator, VoiceBank, WaveShape};

/// Distance between two phases on the unit circle.
fn phase_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).abs();
    d.min(1.0 - d)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Advancing for one full period returns the phase to where it started.
    #[test]
    fn oscillator_is_periodic(
        period in 3usize..2000,
        start in 0.0f32..1.0,
        sample_rate in prop::sample::select(vec![22050.0f32, 44100.0, 48000.0, 96000.0]),
        backwards in any::<bool>(),
    ) {
        let freq = sample_rate / period as f32;
        let freq = if backwards { -freq } else { freq };
        let mut osc = Oscillator::new(freq, 1.0);
        osc.set_phase(start);
        let start = osc.phase();

        for _ in 0..period {
            osc.advance(0.0, sample_rate);
            prop_assert!((0.0..1.0).contains(&osc.phase()), "phase {} escaped", osc.phase());
        }
        prop_assert!(
            phase_distance(osc.phase(), start) < 1e-3,
            "{freq} Hz: started at {start}, ended at {}",
            osc.phase()
        );
    }

    /// Every shape stays within [-1, 1]. The shape parameter range runs past
    /// 0..1 on both sides to cover duty clamping.
    #[test]
    fn shapes_stay_in_range(
        phase in 0.0f32..1.0,
        freq in 1.0f32..11025.0,
        shape_param in -1.0f32..2.0,
    ) {
        let mut osc = Oscillator::new(freq, 1.0).with_shape_param(shape_param);
        osc.advance(0.0, 44100.0);
        osc.set_phase(phase);

        for shape in WaveShape::ALL {
            let y = shape.evaluate(&osc);
            prop_assert!(y.is_finite(), "{shape} produced {y}");
            prop_assert!(
                y.abs() <= 1.0 + 1e-5,
                "{shape} produced {y} at phase {phase}, param {shape_param}"
            );
        }
    }

    /// Any envelope without an infinite sustain reaches Off in bounded time
    /// and never leaves [0, 1].
    #[test]
    fn envelope_terminates(
        attack in -0.01f32..0.05,
        decay in -0.01f32..0.05,
        sustain_level in 0.0f32..=1.0,
        sustain_time in -0.01f32..0.05,
        release in -0.01f32..0.05,
    ) {
        let params = EnvelopeParams {
            attack_time: attack,
            decay_time: decay,
            sustain_level,
            sustain_time,
            release_time: release,
        };
        let mut env = Envelope::new(params);
        env.trigger();

        let max_steps = (params.max_duration() * 44100.0) as usize + 64;
        let mut steps = 0;
        while env.is_active() {
            let level = env.advance(1.0 / 44100.0);
            prop_assert!((0.0..=1.0).contains(&level));
            steps += 1;
            prop_assert!(steps <= max_steps, "stuck in {:?}", env.state());
        }
        prop_assert_eq!(env.level(), 0.0);
    }

    /// No sequence of allocations and clears grows a bank past capacity.
    #[test]
    fn bank_never_exceeds_capacity(ops in prop::collection::vec(any::<bool>(), 0..200)) {
        let mut bank: VoiceBank<8> = VoiceBank::new();
        for allocate in ops {
            if allocate {
                let was_full = bank.is_full();
                prop_assert_eq!(bank.allocate().is_err(), was_full);
            } else {
                bank.clear();
                prop_assert!(bank.is_empty());
            }
            prop_assert!(bank.len() <= bank.capacity());
        }
    }
}
