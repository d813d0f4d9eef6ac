//! Pure phase-transition logic.
//!
//! ```text
//! WORK -> SHORT_BREAK -> WORK -> ... -> WORK -> LONG_BREAK -> WORK
//!                                  (every `cadence`th work session)
//! ```

use super::config::Configuration;
use super::phase::Phase;

/// Stateless decision logic for the work/break cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleStateMachine;

impl CycleStateMachine {
    /// Phase that follows `current` once it has finished.
    ///
    /// `work_sessions_completed` must already include the session that just
    /// finished, so completing the 4th work session with a cadence of 4
    /// yields `LongBreak`. A cadence of 0 is treated as 1.
    pub fn next_phase(current: Phase, work_sessions_completed: u32, cadence: u32) -> Phase {
        match current {
            Phase::Work => {
                if work_sessions_completed % cadence.max(1) == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        }
    }

    /// Preview the next `count` phases after `from`, without touching any
    /// engine state.
    pub fn plan(
        config: &Configuration,
        from: Phase,
        work_sessions_completed: u32,
        count: usize,
    ) -> Vec<Phase> {
        let mut phase = from;
        let mut completed = work_sessions_completed;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            if phase == Phase::Work {
                completed = completed.saturating_add(1);
            }
            phase = Self::next_phase(phase, completed, config.long_break_every());
            out.push(phase);
        }
        out
    }
}
