//! Transport sink boundary
//!
//! The pipeline submits canonical chunks to whatever implements
//! `OutgoingSink`. Pacing is handled upstream: the backpressure gate polls
//! `buffered_duration` and holds the producer back, so implementations never
//! block for rate control themselves.
//!
//! A voice-chat protocol client is one implementation of this trait. Bundled
//! here are a local device monitor and a pacing-accurate discard sink.

pub mod device;
pub mod discard;

pub use device::DeviceSink;
pub use discard::DiscardSink;

use crate::audio::PcmChunk;
use crate::error::Result;

/// Outgoing transport for canonical-format audio.
pub trait OutgoingSink: Send + Sync {
    /// Seconds of audio currently queued downstream.
    fn buffered_duration(&self) -> f64;

    /// Hand one canonical chunk to the transport.
    ///
    /// Must be fast and non-blocking; callers gate on `buffered_duration`
    /// before submitting.
    fn submit(&self, chunk: PcmChunk) -> Result<()>;
}
