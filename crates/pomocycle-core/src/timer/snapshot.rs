use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// Immutable summary of engine state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub remaining_ms: u64,
    pub is_running: bool,
    pub work_sessions_completed: u32,
}
