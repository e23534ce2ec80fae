//! Once-per-second engine status for `tins play`.

use tins_synth::{SignalTap, downsample, trigger_index};

/// Decimation applied to the tap before drawing the scope row.
const SCOPE_DOWNSAMPLE: usize = 8;

/// Glyphs from -1 (bottom) to +1 (top).
const SCOPE_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Reads the tap from the control thread and logs what changed.
pub struct StatusReporter {
    sample_rate: f32,
    last_blocks: u64,
    last_dropped: u64,
    scratch: Vec<f32>,
}

impl StatusReporter {
    /// A reporter for blocks of `block_size` samples at `sample_rate`.
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        Self {
            sample_rate,
            last_blocks: 0,
            last_dropped: 0,
            scratch: vec![0.0; block_size],
        }
    }

    /// Log one status line. `dropped` is the engine's cumulative count.
    pub fn report(&mut self, tap: &SignalTap, dropped: u64) {
        let blocks = tap.blocks_rendered();
        tracing::info!(
            blocks,
            blocks_since = blocks.saturating_sub(self.last_blocks),
            peak = format_args!("{:.3}", tap.peak()),
            budget = format_args!("{:.1}%", tap.budget_usage(self.sample_rate) * 100.0),
            "engine status"
        );
        if dropped > self.last_dropped {
            tracing::warn!(
                dropped = dropped - self.last_dropped,
                total = dropped,
                "UI voices did not fit in their bank"
            );
        }
        self.last_blocks = blocks;
        self.last_dropped = dropped;
    }

    /// One text row of the latest block, starting at a rising zero crossing.
    pub fn scope_row(&mut self, tap: &SignalTap, width: usize) -> String {
        let n = tap.snapshot(&mut self.scratch);
        let block = &self.scratch[..n];
        let start = trigger_index(block);

        let mut points = vec![0.0; width];
        let written = downsample(&block[start..], SCOPE_DOWNSAMPLE, &mut points);
        scope_glyphs(&points[..written])
    }
}

fn scope_glyphs(points: &[f32]) -> String {
    let top = SCOPE_LEVELS.len() - 1;
    points
        .iter()
        .map(|&v| {
            let level = ((v.clamp(-1.0, 1.0) + 1.0) * 0.5 * top as f32).round() as usize;
            SCOPE_LEVELS[level.min(top)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tins_synth::{Synth, SynthSettings, UiVoice, WaveShape};

    #[test]
    fn glyphs_span_the_range() {
        assert_eq!(scope_glyphs(&[-1.0, 0.0, 1.0, 5.0]), "▁▅██");
    }

    #[test]
    fn scope_row_of_a_sine() {
        let mut synth = Synth::new(SynthSettings {
            block_size: 512,
            ..Default::default()
        });
        synth
            .bridge()
            .apply_ui_voices(&[UiVoice::new(WaveShape::Sine, 441.0, 1.0)])
            .unwrap();
        synth.render_block();

        let mut reporter = StatusReporter::new(synth.sample_rate(), 512);
        let row = reporter.scope_row(synth.tap(), 40);
        assert_eq!(row.chars().count(), 40);
        assert!(row.contains('█') && row.contains('▁'));

        reporter.report(synth.tap(), synth.dropped_voices());
        assert_eq!(reporter.last_blocks, 1);
    }
}
