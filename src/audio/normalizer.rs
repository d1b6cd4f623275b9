//! Format normalization to the canonical transport format
//!
//! Converts decoded audio of any channel count and sample rate into mono
//! 48 kHz 16-bit signed PCM with gain applied. Processing order is fixed:
//! downmix, then resample, then gain. The rate converter must see the
//! already-downmixed signal, so swapping stages is not an option.
//!
//! A `Normalizer` is built per track and owns the converter's continuity
//! state, so state cannot leak between tracks.

use crate::audio::types::{DecodedChunk, PcmChunk, CANONICAL_SAMPLE_RATE};
use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::debug;

/// Frames fed to the rate converter per processing block
const RESAMPLE_BLOCK_FRAMES: usize = 1024;

/// Lower bound for any requested gain factor
pub const MIN_GAIN: f32 = 0.01;

/// Upper bound for any requested gain factor
pub const MAX_GAIN: f32 = 2.0;

/// Per-track converter from source format to canonical format.
pub struct Normalizer {
    channels: usize,
    resampler: Option<BlockResampler>,
    gain: Option<f32>,
}

/// Streaming rate converter feeding fixed-size blocks to rubato.
///
/// Input accumulates in `pending` until a full block is available; the
/// remainder is flushed by `drain` at end of track.
struct BlockResampler {
    inner: FastFixedIn<f32>,
    pending: Vec<f32>,
    ratio: f64,
}

impl Normalizer {
    /// Create a normalizer for a track with the given source format.
    ///
    /// The requested gain is clamped to [0.01, 2.0]; `None` or unity gain
    /// leaves samples untouched.
    pub fn new(channels: usize, sample_rate: u32, gain: Option<f32>) -> Result<Self> {
        if channels == 0 {
            return Err(Error::Decode("Source has zero channels".to_string()));
        }

        let resampler = if sample_rate != CANONICAL_SAMPLE_RATE {
            let ratio = CANONICAL_SAMPLE_RATE as f64 / sample_rate as f64;

            let inner = FastFixedIn::<f32>::new(
                ratio,
                1.0, // ratio is fixed for the track's lifetime
                PolynomialDegree::Septic,
                RESAMPLE_BLOCK_FRAMES,
                1, // converter runs on the downmixed mono signal
            )
            .map_err(|e| Error::Resample(format!("Failed to create resampler: {}", e)))?;

            debug!(
                "Resampling from {}Hz to {}Hz",
                sample_rate, CANONICAL_SAMPLE_RATE
            );

            Some(BlockResampler {
                inner,
                pending: Vec::new(),
                ratio,
            })
        } else {
            None
        };

        let gain = gain
            .map(|g| g.clamp(MIN_GAIN, MAX_GAIN))
            .filter(|g| (g - 1.0).abs() > f32::EPSILON);

        Ok(Self {
            channels,
            resampler,
            gain,
        })
    }

    /// Convert one decoded chunk to canonical format.
    ///
    /// The returned chunk may be empty while the rate converter accumulates
    /// a full processing block.
    pub fn process(&mut self, chunk: &DecodedChunk) -> Result<PcmChunk> {
        let mono = self.downmix(&chunk.samples);

        let resampled = match self.resampler.as_mut() {
            Some(resampler) => resampler.feed(&mono)?,
            None => mono,
        };

        Ok(self.quantize(resampled))
    }

    /// Drain the rate converter's buffered remainder at end of track.
    pub fn finish(&mut self) -> Result<PcmChunk> {
        let tail = match self.resampler.as_mut() {
            Some(resampler) => resampler.drain()?,
            None => Vec::new(),
        };

        Ok(self.quantize(tail))
    }

    /// Average all channels of each frame into a single sample.
    fn downmix(&self, samples: &[f32]) -> Vec<f32> {
        if self.channels == 1 {
            return samples.to_vec();
        }

        samples
            .chunks_exact(self.channels)
            .map(|frame| frame.iter().sum::<f32>() / self.channels as f32)
            .collect()
    }

    /// Apply gain and convert to 16-bit signed, clamping instead of wrapping.
    fn quantize(&self, samples: Vec<f32>) -> PcmChunk {
        let gain = self.gain.unwrap_or(1.0);

        let out = samples
            .into_iter()
            .map(|sample| {
                let scaled = (sample * gain).clamp(-1.0, 1.0);
                (scaled * i16::MAX as f32) as i16
            })
            .collect();

        PcmChunk::new(out)
    }
}

impl BlockResampler {
    /// Buffer mono input and run the converter over each complete block.
    fn feed(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        self.pending.extend_from_slice(input);

        let mut output = Vec::new();
        let mut consumed = 0;

        while self.pending.len() - consumed >= RESAMPLE_BLOCK_FRAMES {
            let block = &self.pending[consumed..consumed + RESAMPLE_BLOCK_FRAMES];

            let planar = self
                .inner
                .process(&[block], None)
                .map_err(|e| Error::Resample(format!("Resampling failed: {}", e)))?;

            output.extend(planar.into_iter().next().unwrap_or_default());
            consumed += RESAMPLE_BLOCK_FRAMES;
        }

        self.pending.drain(..consumed);
        Ok(output)
    }

    /// Flush the partial block left over at end of stream.
    ///
    /// The converter pads the partial block with silence internally, so the
    /// output is trimmed back to the frames the real input accounts for.
    fn drain(&mut self) -> Result<Vec<f32>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let tail = std::mem::take(&mut self.pending);
        let expected = (tail.len() as f64 * self.ratio).ceil() as usize;

        let planar = self
            .inner
            .process_partial(Some(&[tail.as_slice()]), None)
            .map_err(|e| Error::Resample(format!("Resampler flush failed: {}", e)))?;

        let mut out = planar.into_iter().next().unwrap_or_default();
        out.truncate(expected);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(samples: Vec<f32>, channels: usize) -> DecodedChunk {
        let frames = samples.len() / channels;
        DecodedChunk { samples, frames }
    }

    #[test]
    fn test_mono_passthrough_quantization() {
        let mut norm = Normalizer::new(1, 48_000, None).unwrap();
        let out = norm
            .process(&chunk(vec![0.0, 0.5, -1.0, 1.0, 2.0], 1))
            .unwrap();

        assert_eq!(out.samples.len(), 5);
        assert_eq!(out.samples[0], 0);
        assert_eq!(out.samples[1], 16383);
        assert_eq!(out.samples[2], -32767);
        assert_eq!(out.samples[3], 32767);
        // Out-of-range input clamps instead of wrapping
        assert_eq!(out.samples[4], 32767);

        assert!(norm.finish().unwrap().is_empty());
    }

    #[test]
    fn test_stereo_downmix_averages_channels() {
        let mut norm = Normalizer::new(2, 48_000, None).unwrap();
        let out = norm
            .process(&chunk(vec![0.3, 0.7, -0.5, 0.5], 2))
            .unwrap();

        assert_eq!(out.samples.len(), 2);
        // (0.3 + 0.7) / 2 = 0.5
        assert!((out.samples[0] as i32 - 16383).abs() <= 1);
        // (-0.5 + 0.5) / 2 = 0.0
        assert_eq!(out.samples[1], 0);
    }

    #[test]
    fn test_multichannel_downmix_generalizes() {
        let mut norm = Normalizer::new(4, 48_000, None).unwrap();
        let out = norm
            .process(&chunk(vec![0.2, 0.4, 0.6, 0.8], 4))
            .unwrap();

        assert_eq!(out.samples.len(), 1);
        // (0.2 + 0.4 + 0.6 + 0.8) / 4 = 0.5
        assert!((out.samples[0] as i32 - 16383).abs() <= 1);
    }

    #[test]
    fn test_zero_channels_rejected() {
        assert!(Normalizer::new(0, 48_000, None).is_err());
    }

    #[test]
    fn test_resample_output_count_and_continuity() {
        let input_rate = 44_100u32;
        let mut norm = Normalizer::new(1, input_rate, None).unwrap();

        // One second of 440 Hz sine, fed in uneven chunks to exercise the
        // pending buffer across block boundaries
        let input: Vec<f32> = (0..input_rate)
            .map(|i| {
                let t = i as f32 / input_rate as f32;
                (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
            })
            .collect();

        let mut output = Vec::new();
        for piece in input.chunks(512) {
            let out = norm.process(&chunk(piece.to_vec(), 1)).unwrap();
            output.extend(out.samples);
        }
        output.extend(norm.finish().unwrap().samples);

        // Output length tracks the rate ratio
        let expected = 48_000usize;
        assert!(
            output.len() >= expected - 256 && output.len() <= expected + 256,
            "Expected ~{} samples, got {}",
            expected,
            output.len()
        );

        // A continuity break (converter state reset between chunks) would
        // show up as a sample-to-sample jump far larger than the sine's
        // own slope allows
        let max_step = output
            .windows(2)
            .map(|w| (w[1] as i32 - w[0] as i32).abs())
            .max()
            .unwrap_or(0);
        assert!(
            max_step < 3000,
            "Discontinuity across chunk boundary: max step {}",
            max_step
        );
    }

    #[test]
    fn test_gain_applied() {
        let mut norm = Normalizer::new(1, 48_000, Some(2.0)).unwrap();
        let out = norm.process(&chunk(vec![0.25], 1)).unwrap();
        assert!((out.samples[0] as i32 - 16383).abs() <= 1);
    }

    #[test]
    fn test_gain_clamped_to_range() {
        // Requested gain above the cap behaves as 2.0
        let mut loud = Normalizer::new(1, 48_000, Some(5.0)).unwrap();
        let out = loud.process(&chunk(vec![0.25], 1)).unwrap();
        assert!((out.samples[0] as i32 - 16383).abs() <= 1);

        // Requested gain below the floor behaves as 0.01
        let mut quiet = Normalizer::new(1, 48_000, Some(0.0001)).unwrap();
        let out = quiet.process(&chunk(vec![1.0], 1)).unwrap();
        assert!((out.samples[0] as i32 - 327).abs() <= 1);
    }

    #[test]
    fn test_gain_overflow_clamps_not_wraps() {
        let mut norm = Normalizer::new(1, 48_000, Some(2.0)).unwrap();
        let out = norm.process(&chunk(vec![0.9, -0.9], 1)).unwrap();
        assert_eq!(out.samples[0], 32767);
        assert_eq!(out.samples[1], -32767);
    }

    #[test]
    fn test_unity_gain_matches_no_gain() {
        let input = vec![0.1, -0.4, 0.9];
        let mut with_unity = Normalizer::new(1, 48_000, Some(1.0)).unwrap();
        let mut without = Normalizer::new(1, 48_000, None).unwrap();

        let a = with_unity.process(&chunk(input.clone(), 1)).unwrap();
        let b = without.process(&chunk(input, 1)).unwrap();
        assert_eq!(a.samples, b.samples);
    }
}
