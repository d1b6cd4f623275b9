//! # voicecast
//!
//! Streams local audio files into a voice-chat session.
//!
//! **Purpose:** Decode audio files of any common format, normalize them to
//! the canonical wire format (mono, 48 kHz, 16-bit signed LE), and feed the
//! session's outgoing sink at a sustainable pace, with playlist sequencing
//! and cancellable per-track streaming.
//!
//! **Architecture:** Single-stream pipeline using symphonia + rubato, one
//! streaming task at a time behind a watermark-gated sink trait.

pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod playlist;
pub mod sink;

pub use error::{Error, Result};
pub use playlist::Playlist;
