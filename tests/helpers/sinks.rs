//! In-memory sinks for driving streaming tasks without an audio device

use std::sync::Mutex;
use voicecast::audio::PcmChunk;
use voicecast::sink::OutgoingSink;
use voicecast::Result;

/// Accepts everything immediately and keeps it for inspection.
///
/// Reports an always-empty buffer, so the backpressure gate never blocks
/// and tests run at decode speed.
#[derive(Default)]
pub struct CollectSink {
    chunks: Mutex<Vec<PcmChunk>>,
}

impl CollectSink {
    /// Total canonical samples received across all chunks.
    pub fn total_samples(&self) -> usize {
        self.chunks
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.samples.len())
            .sum()
    }

    /// All received samples, concatenated in submission order.
    pub fn samples(&self) -> Vec<i16> {
        self.chunks
            .lock()
            .unwrap()
            .iter()
            .flat_map(|c| c.samples.iter().copied())
            .collect()
    }

    /// Playing time of everything received, at the canonical rate.
    pub fn total_duration_seconds(&self) -> f64 {
        self.total_samples() as f64 / 48_000.0
    }
}

impl OutgoingSink for CollectSink {
    fn buffered_duration(&self) -> f64 {
        0.0
    }

    fn submit(&self, chunk: PcmChunk) -> Result<()> {
        self.chunks.lock().unwrap().push(chunk);
        Ok(())
    }
}

/// Reports a permanently full buffer, so the gate never opens.
///
/// Used to park a streaming task in its backpressure wait and test
/// cancellation behavior.
#[derive(Default)]
pub struct FullSink;

impl OutgoingSink for FullSink {
    fn buffered_duration(&self) -> f64 {
        60.0
    }

    fn submit(&self, _chunk: PcmChunk) -> Result<()> {
        Ok(())
    }
}
