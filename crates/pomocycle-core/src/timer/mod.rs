mod config;
mod cycle;
mod engine;
mod phase;
pub mod runtime;
mod scheduler;
mod snapshot;

pub use config::{Configuration, Preset};
pub use cycle::CycleStateMachine;
pub use engine::{
    ListenerId, PhaseTransition, TimerEngine, DEFAULT_TICK_INTERVAL, MAX_AUTO_TRANSITIONS,
};
pub use phase::Phase;
pub use runtime::{TimerHandle, TimerRuntime};
pub use scheduler::{IntervalScheduler, ManualScheduler, Tick, TickScheduler};
pub use snapshot::TimerSnapshot;
