//! Track streaming and playback orchestration
//!
//! One `TrackStreamer` runs at a time, driven by the `Player`, which owns
//! playlist sequencing, progress display, and orderly shutdown.

pub mod gate;
pub mod player;
pub mod progress;
pub mod streamer;

pub use player::Player;
pub use streamer::TrackStreamer;
