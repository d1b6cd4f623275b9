//! Playlist loading and ordering
//!
//! A playlist is an ordered list of file paths, built either from a single
//! argument or parsed from an `.m3u`-style text file. Entries are not
//! checked for existence here; the player validates each file when its turn
//! comes, so one bad entry skips instead of aborting the run.

use crate::error::Result;
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ordered sequence of audio file paths.
#[derive(Debug, Default, Clone)]
pub struct Playlist {
    files: Vec<PathBuf>,
}

impl Playlist {
    /// Create an empty playlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load entries from a playlist file.
    ///
    /// One path per line. Lines beginning with `#` are comments; lines that
    /// are empty or whitespace-only are skipped. Relative paths resolve
    /// against the playlist file's own directory, never the working
    /// directory.
    ///
    /// # Errors
    /// Fails when the playlist file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;

        // Entries resolve relative to the playlist's directory
        let abs = std::path::absolute(path)?;
        let base = abs.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut files = Vec::new();
        for line in contents.lines() {
            // Comment rows
            if line.starts_with('#') {
                continue;
            }

            if line.trim().is_empty() {
                continue;
            }

            let entry = PathBuf::from(line);
            if entry.is_absolute() {
                files.push(entry);
            } else {
                files.push(base.join(entry));
            }
        }

        debug!("Loaded {} entries from {}", files.len(), path.display());
        Ok(Self { files })
    }

    /// Append a single path verbatim, without checking that it exists.
    pub fn add_file(&mut self, path: impl Into<PathBuf>) {
        self.files.push(path.into());
    }

    /// Shuffle entries in place.
    ///
    /// Called once per loop pass, so repeated loops play independent
    /// orderings.
    pub fn shuffle(&mut self) {
        self.files.shuffle(&mut thread_rng());
    }

    /// Entries in playback order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when there is nothing to play.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
