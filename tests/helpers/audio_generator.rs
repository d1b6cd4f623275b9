//! Audio test file generation utilities
//!
//! Generates deterministic WAV files with known characteristics so pipeline
//! tests can verify sample counts, durations, and amplitudes exactly.

use hound::{WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;

/// Generate a sine wave WAV file with the given layout.
///
/// # Arguments
/// * `path` - Output file path
/// * `channels` - Channel count (the same wave is written to every channel)
/// * `sample_rate` - Sample rate in Hz
/// * `duration_ms` - Duration in milliseconds
/// * `frequency_hz` - Sine frequency in Hz
/// * `amplitude` - Amplitude 0.0-1.0 (0.5 recommended to avoid clipping)
pub fn generate_sine_wav_with_spec<P: AsRef<Path>>(
    path: P,
    channels: u16,
    sample_rate: u32,
    duration_ms: u64,
    frequency_hz: f32,
    amplitude: f32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;

    let total_frames = (sample_rate as u64 * duration_ms) / 1000;
    let amplitude_i16 = (amplitude * i16::MAX as f32) as i16;

    for frame_idx in 0..total_frames {
        let t = frame_idx as f32 / sample_rate as f32;
        let sample_value = (2.0 * PI * frequency_hz * t).sin();
        let sample_i16 = (sample_value * amplitude_i16 as f32) as i16;

        for _ in 0..channels {
            writer.write_sample(sample_i16)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Generate a stereo 44.1 kHz sine WAV, the common source format.
pub fn generate_sine_wav<P: AsRef<Path>>(
    path: P,
    duration_ms: u64,
    frequency_hz: f32,
    amplitude: f32,
) -> Result<(), hound::Error> {
    generate_sine_wav_with_spec(path, 2, 44_100, duration_ms, frequency_hz, amplitude)
}

/// Generate a mono 48 kHz sine WAV, already in the canonical layout.
pub fn generate_sine_wav_mono_48k<P: AsRef<Path>>(
    path: P,
    duration_ms: u64,
    frequency_hz: f32,
    amplitude: f32,
) -> Result<(), hound::Error> {
    generate_sine_wav_with_spec(path, 1, 48_000, duration_ms, frequency_hz, amplitude)
}
