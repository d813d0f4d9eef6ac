//! Render-side projections of a [`TimerSnapshot`]. Nothing here is stored.

use crate::timer::{Configuration, TimerSnapshot};

/// Share of the current phase still remaining, as a whole percentage.
///
/// A zero-length phase has nothing remaining and reports 0. Values are
/// clamped to `[0, 100]`, which matters after a `reconfigure` shortens the
/// active phase below the time already on the clock.
pub fn progress_percent(snapshot: &TimerSnapshot, config: &Configuration) -> u8 {
    let total = config.duration_for(snapshot.phase);
    if total == 0 {
        return 0;
    }
    let pct = (snapshot.remaining_ms as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// `MM:SS` countdown text. Minutes are not capped at 59.
pub fn format_remaining(remaining_ms: u64) -> String {
    let secs = remaining_ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
