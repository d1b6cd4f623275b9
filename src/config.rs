//! Runtime configuration
//!
//! Session parameters and streaming tune-ables, validated up front so
//! playback never starts against a broken setup.

use crate::audio::normalizer::{MAX_GAIN, MIN_GAIN};
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Sink buffered-duration ceiling before the backpressure gate blocks
pub const DEFAULT_HIGH_WATERMARK_SECS: f64 = 2.0;

/// Gate re-check interval while the sink is above the watermark
pub const DEFAULT_GATE_POLL: Duration = Duration::from_millis(10);

/// Poll interval while waiting for a streaming task to become ready
pub const READY_POLL: Duration = Duration::from_millis(100);

/// Progress redraw interval
pub const PROGRESS_POLL: Duration = Duration::from_millis(100);

/// Per-track streaming tuning, passed to each task at spawn.
#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    /// Gain factor applied during normalization; None leaves samples as-is
    pub gain: Option<f32>,

    /// Backpressure watermark in seconds of buffered audio
    pub high_watermark_secs: f64,

    /// Gate poll interval
    pub gate_poll: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            gain: None,
            high_watermark_secs: DEFAULT_HIGH_WATERMARK_SECS,
            gate_poll: DEFAULT_GATE_POLL,
        }
    }
}

/// Voice-chat session description.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub channel: String,
    pub bandwidth: u32,
}

impl SessionParams {
    /// Pre-flight check of the credential pair.
    ///
    /// A certificate and its key must be given together or not at all, and
    /// both must exist on disk when given.
    pub fn validate(&self) -> Result<()> {
        if self.cert_file.is_some() != self.key_file.is_some() {
            return Err(Error::Config(
                "Certificate and key files must both be set, or neither".to_string(),
            ));
        }

        if let Some(cert) = &self.cert_file {
            if !cert.exists() {
                return Err(Error::Config(format!(
                    "Certificate file {} does not exist",
                    cert.display()
                )));
            }
        }

        if let Some(key) = &self.key_file {
            if !key.exists() {
                return Err(Error::Config(format!(
                    "Key file {} does not exist",
                    key.display()
                )));
            }
        }

        Ok(())
    }
}

/// Clamp a requested volume into the supported gain range, warning when the
/// request was out of bounds.
pub fn effective_volume(requested: f32) -> f32 {
    let clamped = requested.clamp(MIN_GAIN, MAX_GAIN);
    if (clamped - requested).abs() > f32::EPSILON {
        warn!("Volume {} out of range, using {}", requested, clamped);
    }
    clamped
}
