//! Playback orchestration
//!
//! Sequences playlist entries: at most one streaming task alive at a time,
//! each stopped and joined before the next starts. Missing files are
//! skipped with a warning, a loop pass reshuffles when shuffle is on, and
//! an interrupt flag winds the current task down in order.

use crate::config::{StreamSettings, PROGRESS_POLL, READY_POLL};
use crate::error::Result;
use crate::playback::progress::ProgressBar;
use crate::playback::streamer::TrackStreamer;
use crate::playlist::Playlist;
use crate::sink::OutgoingSink;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Residual buffered audio below this is considered drained
const DRAIN_FLOOR_SECS: f64 = 0.05;

/// Sequential playlist player.
pub struct Player {
    sink: Arc<dyn OutgoingSink>,
    settings: StreamSettings,
    loop_playlist: bool,
    shuffle: bool,
    shutdown: Arc<AtomicBool>,
}

impl Player {
    pub fn new(
        sink: Arc<dyn OutgoingSink>,
        settings: StreamSettings,
        loop_playlist: bool,
        shuffle: bool,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            sink,
            settings,
            loop_playlist,
            shuffle,
            shutdown,
        }
    }

    /// Play the playlist once, or repeatedly when looping is enabled.
    ///
    /// Returns after the final pass ends, once buffered audio has drained,
    /// or as soon as the current task is wound down after an interrupt.
    pub async fn run(&self, playlist: &mut Playlist) -> Result<()> {
        if playlist.is_empty() {
            warn!("Playlist is empty, nothing to play");
            return Ok(());
        }

        loop {
            if self.shuffle {
                playlist.shuffle();
            }

            self.play_pass(playlist).await?;

            if self.interrupted() {
                info!("Playback interrupted");
                return Ok(());
            }

            if !self.loop_playlist {
                break;
            }
        }

        self.drain_sink().await;
        Ok(())
    }

    /// One pass over the playlist entries in order.
    async fn play_pass(&self, playlist: &Playlist) -> Result<()> {
        let total = playlist.len();

        for (index, path) in playlist.files().iter().enumerate() {
            if self.interrupted() {
                return Ok(());
            }

            // Entries may vanish between playlist load and play
            if !path.exists() {
                warn!("File '{}' does not exist, skipping", path.display());
                continue;
            }

            info!("Playing [{}/{}] {}", index + 1, total, path.display());
            self.play_track(index + 1, total, path).await;
        }

        Ok(())
    }

    /// Stream one file to completion, cancellation, or task failure.
    ///
    /// Task failures are logged and swallowed so one bad file does not end
    /// the run; the task is always stopped and joined before returning.
    async fn play_track(&self, index: usize, total: usize, path: &Path) {
        let mut task =
            TrackStreamer::spawn(path.to_path_buf(), Arc::clone(&self.sink), self.settings);

        // Wait for the ready latch; a task that terminates first never
        // opened its decoder
        loop {
            if task.is_ready() {
                break;
            }
            if task.is_finished() {
                match task.join() {
                    Ok(()) => break,
                    Err(e) => {
                        error!("Cannot play {}: {}", path.display(), e);
                        return;
                    }
                }
            }
            if self.interrupted() {
                break;
            }
            sleep(READY_POLL).await;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bar = ProgressBar::new(index, total, &name, task.duration_ms());

        while !task.is_finished() {
            if self.interrupted() {
                break;
            }
            bar.update(task.position_ms());
            sleep(PROGRESS_POLL).await;
        }
        bar.finish();

        // Stop and join before advancing, on every path
        task.stop();
        if let Err(e) = task.join() {
            error!("Playback of {} failed: {}", path.display(), e);
        }
    }

    /// Let audio already handed to the sink finish before returning.
    async fn drain_sink(&self) {
        while self.sink.buffered_duration() > DRAIN_FLOOR_SECS && !self.interrupted() {
            sleep(PROGRESS_POLL).await;
        }
    }

    fn interrupted(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}
