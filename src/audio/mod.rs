//! Audio decoding and format normalization
//!
//! Source files decode to interleaved f32 via symphonia, then normalize to
//! the canonical transport format (mono, 48 kHz, 16-bit signed).

pub mod decoder;
pub mod normalizer;
pub mod types;

pub use decoder::FileDecoder;
pub use normalizer::Normalizer;
pub use types::{DecodedChunk, PcmChunk, SourceSpec, CANONICAL_CHANNELS, CANONICAL_SAMPLE_RATE};
