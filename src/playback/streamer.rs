//! Streaming task for one track
//!
//! Owns a track's lifecycle on a dedicated thread: open the decoder, latch
//! readiness once stream parameters are known, then drive the
//! decode → gate → normalize → submit loop until input ends or `stop()` is
//! called. Progress fields are atomics written only by the task and read
//! best-effort by the orchestrator; each is monotonic within the track, so
//! a stale read is merely late, never inconsistent.

use crate::audio::{FileDecoder, Normalizer};
use crate::config::StreamSettings;
use crate::error::{Error, Result};
use crate::playback::gate;
use crate::sink::OutgoingSink;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// State shared between the task thread and its handle.
struct TrackShared {
    /// Cooperative-cancellation flag; true while the task may continue
    running: AtomicBool,

    /// Latched once stream parameters are known and duration is readable
    ready: AtomicBool,

    /// Source-stream bytes consumed (frames * channels * 2)
    bytes_consumed: AtomicU64,

    /// Position in milliseconds
    position_ms: AtomicU64,

    /// Track duration in milliseconds; 0 while unknown
    duration_ms: AtomicU64,

    /// Fatal task error, surfaced by `join()`
    failure: Mutex<Option<Error>>,
}

/// Handle to a background streaming task.
///
/// Dropping an unjoined handle stops the task and waits for it, so the
/// decoder is released on every exit path.
pub struct TrackStreamer {
    shared: Arc<TrackShared>,
    thread: Option<JoinHandle<()>>,
}

impl TrackStreamer {
    /// Start streaming a file into the sink on a background thread.
    ///
    /// Failures (including decoder-open failure) do not surface here; the
    /// task records them and `join()` returns them. A task that terminates
    /// without ever becoming ready failed to open its decoder.
    pub fn spawn(path: PathBuf, sink: Arc<dyn OutgoingSink>, settings: StreamSettings) -> Self {
        let shared = Arc::new(TrackShared {
            running: AtomicBool::new(true),
            ready: AtomicBool::new(false),
            bytes_consumed: AtomicU64::new(0),
            position_ms: AtomicU64::new(0),
            duration_ms: AtomicU64::new(0),
            failure: Mutex::new(None),
        });

        let state = Arc::clone(&shared);
        let thread = thread::spawn(move || {
            if let Err(e) = run_stream(&path, sink, settings, &state) {
                *state.failure.lock().unwrap() = Some(e);
            }
        });

        Self {
            shared,
            thread: Some(thread),
        }
    }

    /// Request cancellation.
    ///
    /// Idempotent; safe from any thread at any time, including before the
    /// task is ready. The task exits at its next flag check, at most one
    /// gate poll interval plus one chunk away.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Relaxed);
    }

    /// True once stream parameters are known and `duration_ms` is valid.
    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::Acquire)
    }

    /// True once the task thread has terminated.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Wait for the task to terminate and surface its fatal error, if any.
    ///
    /// A second call after termination returns immediately.
    pub fn join(&mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                return Err(Error::Playback("Streaming task panicked".to_string()));
            }
        }

        match self.shared.failure.lock().unwrap().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Current position in milliseconds (best-effort read).
    pub fn position_ms(&self) -> u64 {
        self.shared.position_ms.load(Ordering::Relaxed)
    }

    /// Track duration in milliseconds; 0 while unknown.
    pub fn duration_ms(&self) -> u64 {
        self.shared.duration_ms.load(Ordering::Relaxed)
    }

    /// Source-stream bytes consumed so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.shared.bytes_consumed.load(Ordering::Relaxed)
    }
}

impl Drop for TrackStreamer {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Task body: decode, gate, normalize, submit, until input ends or the
/// cancel flag clears.
fn run_stream(
    path: &Path,
    sink: Arc<dyn OutgoingSink>,
    settings: StreamSettings,
    shared: &TrackShared,
) -> Result<()> {
    // Open failure is fatal for the task; the ready latch never sets
    let mut decoder = FileDecoder::open(path)?;
    let spec = decoder.spec();

    let mut normalizer = Normalizer::new(spec.channels, spec.sample_rate, settings.gain)?;

    if let Some(duration_ms) = spec.duration_ms {
        shared.duration_ms.store(duration_ms, Ordering::Relaxed);
    }
    // Release pairs with the Acquire in is_ready(), publishing duration
    shared.ready.store(true, Ordering::Release);

    debug!(
        "Streaming {}: {} channels, {} Hz",
        path.display(),
        spec.channels,
        spec.sample_rate
    );

    let bytes_per_frame = spec.channels as u64 * 2;
    let mut frames_consumed: u64 = 0;

    while shared.running.load(Ordering::Relaxed) {
        let chunk = match decoder.next_chunk()? {
            Some(chunk) => chunk,
            None => break,
        };

        gate::wait_until_room(
            sink.as_ref(),
            settings.high_watermark_secs,
            settings.gate_poll,
            &shared.running,
        );

        // Cancelled during the wait: drop the chunk unsubmitted
        if !shared.running.load(Ordering::Relaxed) {
            return Ok(());
        }

        let pcm = normalizer.process(&chunk)?;
        if !pcm.is_empty() {
            sink.submit(pcm)?;
        }

        frames_consumed += chunk.frames as u64;
        shared
            .bytes_consumed
            .store(frames_consumed * bytes_per_frame, Ordering::Relaxed);
        shared.position_ms.store(
            frames_consumed * 1000 / spec.sample_rate as u64,
            Ordering::Relaxed,
        );
    }

    // Natural end: the converter's buffered remainder goes out through the
    // same gate and cancel discipline
    if shared.running.load(Ordering::Relaxed) {
        let tail = normalizer.finish()?;
        if !tail.is_empty() {
            gate::wait_until_room(
                sink.as_ref(),
                settings.high_watermark_secs,
                settings.gate_poll,
                &shared.running,
            );
            if shared.running.load(Ordering::Relaxed) {
                sink.submit(tail)?;
            }
        }
    }

    debug!("Streaming finished: {}", path.display());
    Ok(())
}
