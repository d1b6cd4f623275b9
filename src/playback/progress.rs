//! Progress rendering
//!
//! Redraws a single stderr line while a track streams:
//! `[2/7] song.mp3 [########------------]  42% 1:23 / 3:21`.
//! Output is suppressed when stderr is not a terminal, so logs piped to a
//! file stay free of carriage returns.

use std::io::{self, IsTerminal, Write};

const BAR_WIDTH: usize = 20;

/// One track's progress line.
pub struct ProgressBar {
    label: String,
    duration_ms: u64,
    enabled: bool,
}

impl ProgressBar {
    /// `index` and `total` are 1-based playlist positions.
    pub fn new(index: usize, total: usize, name: &str, duration_ms: u64) -> Self {
        Self {
            label: format!("[{}/{}] {}", index, total, name),
            duration_ms,
            enabled: io::stderr().is_terminal(),
        }
    }

    /// Redraw the line for the given position.
    pub fn update(&self, position_ms: u64) {
        if !self.enabled {
            return;
        }
        let mut stderr = io::stderr();
        let _ = write!(stderr, "\r{}", render_line(&self.label, position_ms, self.duration_ms));
        let _ = stderr.flush();
    }

    /// Close out the line when the track ends.
    pub fn finish(&self) {
        if !self.enabled {
            return;
        }
        let _ = writeln!(io::stderr());
    }
}

/// Render one progress line. A zero duration (unknown length) renders as the
/// elapsed clock alone.
fn render_line(label: &str, position_ms: u64, duration_ms: u64) -> String {
    let elapsed = format_clock(position_ms / 1000);
    if duration_ms == 0 {
        return format!("{} {}", label, elapsed);
    }

    let fraction = (position_ms as f64 / duration_ms as f64).min(1.0);
    let filled = (fraction * BAR_WIDTH as f64) as usize;
    let bar: String = "#".repeat(filled) + &"-".repeat(BAR_WIDTH - filled);
    let percent = (fraction * 100.0) as u64;

    format!(
        "{} [{}] {:3}% {} / {}",
        label,
        bar,
        percent,
        elapsed,
        format_clock(duration_ms / 1000)
    )
}

/// Format whole seconds as `M:SS`, or `H:MM:SS` from one hour up.
pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}
