//! Core audio types and the canonical stream format
//!
//! Everything submitted to the transport is mono, 48 kHz, 16-bit signed
//! little-endian. These types carry audio between the decoder, the
//! normalizer, and the sink.

/// Canonical channel count for transport submission
pub const CANONICAL_CHANNELS: u16 = 1;

/// Canonical sample rate for transport submission (Hz)
pub const CANONICAL_SAMPLE_RATE: u32 = 48_000;

/// One chunk of canonical-format audio (mono, 48 kHz, 16-bit signed).
#[derive(Debug, Clone, PartialEq)]
pub struct PcmChunk {
    /// Mono samples, one per frame
    pub samples: Vec<i16>,
}

impl PcmChunk {
    /// Create a chunk from mono samples.
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    /// Number of frames (equal to sample count in mono).
    pub fn frames(&self) -> usize {
        self.samples.len()
    }

    /// True when the chunk carries no audio.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playing time of this chunk at the canonical rate, in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / CANONICAL_SAMPLE_RATE as f64
    }

    /// Serialize to the wire representation (16-bit signed little-endian).
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.samples.len() * 2);
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }
}

/// Interleaved source-format samples as produced by the decoder.
#[derive(Debug, Clone)]
pub struct DecodedChunk {
    /// Interleaved f32 samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Frame count (samples.len() / source channels)
    pub frames: usize,
}

/// Source stream parameters reported when a file is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceSpec {
    /// Channel count of the source stream
    pub channels: usize,
    /// Sample rate of the source stream (Hz)
    pub sample_rate: u32,
    /// Total duration when the container declares it
    pub duration_ms: Option<u64>,
}

impl SourceSpec {
    /// Source-stream bytes per second at 16 bits per sample.
    ///
    /// Used for position accounting: consumed source frames are counted as
    /// `frames * channels * 2` bytes, matching a 16-bit PCM rendition of the
    /// stream regardless of the codec's own bit depth.
    pub fn bytes_per_second(&self) -> u64 {
        2 * self.channels as u64 * self.sample_rate as u64
    }
}
