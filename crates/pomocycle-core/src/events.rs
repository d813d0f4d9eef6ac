use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerSnapshot};

/// Serializable record of everything the engine reports to observers.
/// Hosts forward these to renderers, notifiers and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    StateSnapshot {
        phase: Phase,
        remaining_ms: u64,
        is_running: bool,
        work_sessions_completed: u32,
        at: DateTime<Utc>,
    },
    /// A phase ran down to zero and the engine moved on to `next`.
    PhaseCompleted {
        finished: Phase,
        next: Phase,
        work_sessions_completed: u32,
        at: DateTime<Utc>,
    },
    /// A non-fatal error; the engine is stopped at its last good state.
    Error {
        message: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn snapshot(snapshot: &TimerSnapshot) -> Self {
        Event::StateSnapshot {
            phase: snapshot.phase,
            remaining_ms: snapshot.remaining_ms,
            is_running: snapshot.is_running,
            work_sessions_completed: snapshot.work_sessions_completed,
            at: Utc::now(),
        }
    }

    pub fn error(err: &impl std::fmt::Display) -> Self {
        Event::Error {
            message: err.to_string(),
            at: Utc::now(),
        }
    }

    /// The snapshot carried by a `StateSnapshot` event.
    pub fn as_snapshot(&self) -> Option<TimerSnapshot> {
        match *self {
            Event::StateSnapshot {
                phase,
                remaining_ms,
                is_running,
                work_sessions_completed,
                ..
            } => Some(TimerSnapshot {
                phase,
                remaining_ms,
                is_running,
                work_sessions_completed,
            }),
            _ => None,
        }
    }

    /// Single-line JSON, for hosts that stream events.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
