//! Read-only view of the most recently rendered block.
//!
//! The render pass publishes each block into a [`SignalTap`] without locking
//! or allocating. Readers (status logging, remote streaming, a scope view)
//! copy it out with [`SignalTap::snapshot`]. Publication is guarded by a
//! sequence counter, so a reader either gets one whole block or retries.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering, fence};
use std::time::Duration;

/// Snapshot attempts before giving up on a consistent copy.
const SNAPSHOT_RETRIES: usize = 8;

/// Lock-free single-writer block mirror plus render diagnostics.
#[derive(Debug)]
pub struct SignalTap {
    samples: Box<[AtomicU32]>,
    /// Even when stable, odd while a block is being written.
    seq: AtomicU64,
    last_render_nanos: AtomicU64,
}

impl SignalTap {
    /// Create a tap for blocks of `block_size` samples.
    pub fn new(block_size: usize) -> Self {
        Self {
            samples: (0..block_size).map(|_| AtomicU32::new(0)).collect(),
            seq: AtomicU64::new(0),
            last_render_nanos: AtomicU64::new(0),
        }
    }

    /// Block length in samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the tap holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Publish a block. Audio thread only; there must be a single writer.
    pub(crate) fn publish(&self, block: &[f32], render_time: Duration) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        for (slot, &sample) in self.samples.iter().zip(block) {
            slot.store(sample.to_bits(), Ordering::Relaxed);
        }
        self.last_render_nanos
            .store(render_time.as_nanos() as u64, Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    /// Copy the latest block into `out` and return the number of samples
    /// written.
    ///
    /// Retries while the writer is mid-block. If the writer keeps winning the
    /// last attempt is returned as is, which may mix two adjacent blocks.
    pub fn snapshot(&self, out: &mut [f32]) -> usize {
        let n = out.len().min(self.samples.len());
        for _ in 0..SNAPSHOT_RETRIES {
            let before = self.seq.load(Ordering::Acquire);
            if before % 2 == 1 {
                std::hint::spin_loop();
                continue;
            }
            self.copy_into(&mut out[..n]);
            fence(Ordering::Acquire);
            if self.seq.load(Ordering::Relaxed) == before {
                return n;
            }
        }
        self.copy_into(&mut out[..n]);
        n
    }

    /// Owned copy of the latest block.
    pub fn to_vec(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.len()];
        self.snapshot(&mut out);
        out
    }

    /// Blocks published since creation.
    pub fn blocks_rendered(&self) -> u64 {
        self.seq.load(Ordering::Acquire) / 2
    }

    /// Wall-clock time the last render pass took.
    pub fn last_block_duration(&self) -> Duration {
        Duration::from_nanos(self.last_render_nanos.load(Ordering::Relaxed))
    }

    /// Fraction of the real-time budget the last block used.
    ///
    /// `1.0` means the render took as long as the block plays.
    pub fn budget_usage(&self, sample_rate: f32) -> f32 {
        if self.samples.is_empty() || sample_rate <= 0.0 {
            return 0.0;
        }
        let period = self.samples.len() as f32 / sample_rate;
        self.last_block_duration().as_secs_f32() / period
    }

    /// Largest absolute sample in the latest block.
    pub fn peak(&self) -> f32 {
        self.to_vec().iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// RMS of the latest block.
    pub fn rms(&self) -> f32 {
        let block = self.to_vec();
        if block.is_empty() {
            return 0.0;
        }
        let sum: f32 = block.iter().map(|s| s * s).sum();
        (sum / block.len() as f32).sqrt()
    }

    fn copy_into(&self, out: &mut [f32]) {
        for (dst, slot) in out.iter_mut().zip(self.samples.iter()) {
            *dst = f32::from_bits(slot.load(Ordering::Relaxed));
        }
    }
}

/// Index of the first rising zero crossing, or 0 if there is none.
///
/// Starting a scope trace here keeps periodic signals visually still.
pub fn trigger_index(signal: &[f32]) -> usize {
    signal
        .windows(2)
        .position(|w| w[0] < 0.0 && w[1] >= 0.0)
        .map_or(0, |i| i + 1)
}

/// Keep every `factor`-th sample of `signal` in `out`. Returns samples written.
pub fn downsample(signal: &[f32], factor: usize, out: &mut [f32]) -> usize {
    let factor = factor.max(1);
    let mut written = 0;
    for (dst, &src) in out.iter_mut().zip(signal.iter().step_by(factor)) {
        *dst = src;
        written += 1;
    }
    written
}
