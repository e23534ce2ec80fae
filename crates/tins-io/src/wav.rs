//! WAV file reading and writing.

use crate::Result;
use hound::{SampleFormat, WavReader, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = reader.len() as u64 / spec.channels as u64;

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs: num_frames as f64 / spec.sample_rate as f64,
        format: match spec.sample_format {
            SampleFormat::Float => WavFormat::IeeeFloat,
            SampleFormat::Int => WavFormat::Pcm,
        },
    })
}

/// WAV file specification.
///
/// 32-bit files are written as IEEE float, every other depth as PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample (16, 24 or 32).
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Incremental WAV writer for audio produced block by block.
///
/// Samples are interleaved per the spec's channel count. Integer depths
/// clamp to full scale. Call [`finalize`](Self::finalize) to patch the
/// header; a sink dropped without it still leaves a readable file via
/// hound's drop handler, but write errors there are lost.
pub struct WavSink {
    writer: WavWriter<BufWriter<File>>,
    spec: WavSpec,
    samples_written: u64,
}

impl WavSink {
    /// Create (or truncate) `path` for writing.
    pub fn create<P: AsRef<Path>>(path: P, spec: WavSpec) -> Result<Self> {
        let writer = WavWriter::create(path, hound::WavSpec::from(spec))?;
        Ok(Self {
            writer,
            spec,
            samples_written: 0,
        })
    }

    /// The spec this sink writes.
    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    fn push(&mut self, sample: f32) -> Result<()> {
        if self.spec.bits_per_sample == 32 {
            self.writer.write_sample(sample)?;
        } else {
            let max_val = (1i32 << (self.spec.bits_per_sample - 1)) as f32;
            let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
            self.writer.write_sample(int_sample)?;
        }
        self.samples_written += 1;
        Ok(())
    }

    /// Append interleaved samples.
    pub fn write(&mut self, samples: &[f32]) -> Result<()> {
        for &sample in samples {
            self.push(sample)?;
        }
        Ok(())
    }

    /// Append a mono block, duplicating each sample across all channels.
    pub fn write_mono(&mut self, block: &[f32]) -> Result<()> {
        let channels = self.spec.channels.max(1);
        for &sample in block {
            for _ in 0..channels {
                self.push(sample)?;
            }
        }
        Ok(())
    }

    /// Frames (samples per channel) written so far.
    pub fn frames_written(&self) -> u64 {
        self.samples_written / self.spec.channels.max(1) as u64
    }

    /// Flush and patch the header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}

/// Read a WAV file and return samples as f32 along with the spec.
///
/// Multi-channel files are mixed down to mono by averaging channels.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let spec = WavSpec::from(reader.spec());
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match reader.spec().sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let mono = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    Ok((mono, spec))
}

/// Write interleaved samples to a WAV file in one call.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    let mut sink = WavSink::create(path, spec)?;
    sink.write(samples)?;
    sink.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn roundtrip_f32() {
        let samples: Vec<f32> = (0..1000).map(|i| (i as f32 / 1000.0).sin()).collect();
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, WavSpec::default()).unwrap();

        let (loaded, spec) = read_wav(file.path()).unwrap();
        assert_eq!(spec, WavSpec::default());
        assert_eq!(loaded, samples);
    }

    #[test]
    fn roundtrip_i16_clamps() {
        let samples = [0.0, 0.5, -0.5, 2.0, -2.0];
        let spec = WavSpec {
            bits_per_sample: 16,
            ..Default::default()
        };
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, spec).unwrap();

        let (loaded, _) = read_wav(file.path()).unwrap();
        assert!((loaded[1] - 0.5).abs() < 1e-4);
        assert!((loaded[2] + 0.5).abs() < 1e-4);
        assert!(loaded[3] < 1.0 && loaded[3] > 0.999);
        assert_eq!(loaded[4], -1.0);
    }

    #[test]
    fn sink_writes_blocks_and_counts_frames() {
        let spec = WavSpec {
            channels: 2,
            ..Default::default()
        };
        let file = NamedTempFile::new().unwrap();
        let mut sink = WavSink::create(file.path(), spec).unwrap();
        sink.write_mono(&[0.25; 64]).unwrap();
        sink.write_mono(&[-0.25; 64]).unwrap();
        assert_eq!(sink.frames_written(), 128);
        sink.finalize().unwrap();

        let info = read_wav_info(file.path()).unwrap();
        assert_eq!(info.channels, 2);
        assert_eq!(info.num_frames, 128);
        assert_eq!(info.format, WavFormat::IeeeFloat);

        let (mono, _) = read_wav(file.path()).unwrap();
        assert_eq!(mono.len(), 128);
        assert_eq!(mono[0], 0.25);
        assert_eq!(mono[127], -0.25);
    }
}
