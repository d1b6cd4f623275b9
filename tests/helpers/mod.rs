//! Test helper modules for voicecast integration tests
//!
//! Provides reusable test infrastructure:
//! - audio_generator: deterministic WAV files with known characteristics
//! - sinks: in-memory OutgoingSink implementations for driving the pipeline
//!   without an audio device

pub mod audio_generator;
pub mod sinks;

// Re-export commonly used helpers
pub use audio_generator::{generate_sine_wav, generate_sine_wav_mono_48k};
pub use sinks::{CollectSink, FullSink};
