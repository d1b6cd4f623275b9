//! Pacing-accurate discard sink

use crate::audio::PcmChunk;
use crate::error::Result;
use crate::sink::OutgoingSink;
use std::sync::Mutex;
use std::time::Instant;

/// Sink that throws audio away while still draining in real time.
///
/// Submitted chunks credit a buffered-duration counter that drains against
/// wall-clock time, so gate behavior against this sink matches a real
/// transport without touching an audio device. Used by `--dry-run` and by
/// tests.
pub struct DiscardSink {
    state: Mutex<DrainState>,
}

struct DrainState {
    buffered: f64,
    last_update: Instant,
}

impl DiscardSink {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DrainState {
                buffered: 0.0,
                last_update: Instant::now(),
            }),
        }
    }
}

impl Default for DiscardSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutgoingSink for DiscardSink {
    fn buffered_duration(&self) -> f64 {
        let mut state = self.state.lock().unwrap();
        state.drain();
        state.buffered
    }

    fn submit(&self, chunk: PcmChunk) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.drain();
        state.buffered += chunk.duration_seconds();
        Ok(())
    }
}

impl DrainState {
    /// Debit elapsed wall-clock time from the buffered duration.
    fn drain(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.buffered = (self.buffered - elapsed).max(0.0);
        self.last_update = now;
    }
}
