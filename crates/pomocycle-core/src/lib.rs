//! # Pomocycle Core Library
//!
//! This library provides the timer core of the Pomocycle pomodoro timer:
//! alternating work and break phases with a long break every few work
//! sessions. It knows nothing about widgets, audio or storage; hosts feed it
//! configuration and commands and render what it emits.
//!
//! ## Architecture
//!
//! - **Cycle state machine**: pure rules for which phase follows which
//! - **Timer engine**: single-owner countdown driving one tick source,
//!   emitting snapshots and phase-completed notifications
//! - **Runtime**: tokio task hosting an engine behind a command channel
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core countdown state machine
//! - [`CycleStateMachine`]: Next-phase decision logic
//! - [`Configuration`]: Validated phase durations and long-break cadence
//! - [`TimerRuntime`]: Async host for an engine

pub mod error;
pub mod events;
pub mod progress;
pub mod timer;

pub use error::{ConfigError, CoreError, TickError};
pub use events::Event;
pub use progress::{format_remaining, progress_percent};
pub use timer::{
    Configuration, CycleStateMachine, Phase, PhaseTransition, Preset, TimerEngine, TimerHandle,
    TimerRuntime, TimerSnapshot,
};
