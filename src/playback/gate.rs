//! Backpressure gate
//!
//! Holds the producer back while the sink's buffered duration sits above the
//! high watermark. The wait is a bounded poll that also watches the task's
//! cancellation flag, so worst-case cancellation latency is one poll
//! interval. The caller re-checks the flag after returning and drops its
//! chunk when cancellation was requested.

use crate::sink::OutgoingSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Wait until the sink's buffered duration falls to the watermark, or until
/// cancellation is requested, whichever comes first.
pub fn wait_until_room(
    sink: &dyn OutgoingSink,
    high_watermark_secs: f64,
    poll_interval: Duration,
    running: &AtomicBool,
) {
    while sink.buffered_duration() > high_watermark_secs && running.load(Ordering::Relaxed) {
        thread::sleep(poll_interval);
    }
}
