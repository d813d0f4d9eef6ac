//! Timer engine implementation.
//!
//! The engine is a single-owner state machine. It never spawns anything on
//! its own: it arms and disarms the [`TickScheduler`] it owns, and whoever
//! receives the scheduler's ticks calls [`TimerEngine::tick`].
//!
//! ## State Transitions
//!
//! ```text
//! Stopped --start()--> Running --pause()--> Stopped
//!                         |
//!                   remaining hits 0
//!                         |
//!                         v
//!          next phase loaded, Running again (auto-continue)
//! ```
//!
//! ## Usage
//!
//! ```
//! use std::time::Duration;
//! use pomocycle_core::timer::{Configuration, Phase, TimerEngine};
//!
//! let config = Configuration::new(25_000, 5_000, 15_000, 4).unwrap();
//! let mut engine = TimerEngine::new(config);
//! engine.start().unwrap();
//! engine.advance(Duration::from_millis(25_000)).unwrap();
//! assert_eq!(engine.phase(), Phase::ShortBreak);
//! ```

use std::fmt;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::config::Configuration;
use super::cycle::CycleStateMachine;
use super::phase::Phase;
use super::scheduler::{ManualScheduler, TickScheduler};
use super::snapshot::TimerSnapshot;
use crate::error::{CoreError, Result};

/// Default period between ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on automatic phase transitions within one command or tick.
/// Reaching it means every phase in the loop has zero length.
pub const MAX_AUTO_TRANSITIONS: usize = Phase::ALL.len();

/// Handle returned by the `subscribe`/`on_*` methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Details of one natural phase expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub finished: Phase,
    pub next: Phase,
    pub work_sessions_completed: u32,
}

type SnapshotListener = Box<dyn FnMut(&TimerSnapshot) + Send>;
type TransitionListener = Box<dyn FnMut(&PhaseTransition) + Send>;
type ErrorListener = Box<dyn FnMut(&CoreError) + Send>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    snapshot: Vec<(ListenerId, SnapshotListener)>,
    transition: Vec<(ListenerId, TransitionListener)>,
    error: Vec<(ListenerId, ErrorListener)>,
}

impl Listeners {
    fn next_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.len();
        self.snapshot.retain(|(i, _)| *i != id);
        self.transition.retain(|(i, _)| *i != id);
        self.error.retain(|(i, _)| *i != id);
        self.len() != before
    }

    fn len(&self) -> usize {
        self.snapshot.len() + self.transition.len() + self.error.len()
    }
}

/// Core countdown engine.
pub struct TimerEngine<S: TickScheduler = ManualScheduler> {
    configuration: Configuration,
    phase: Phase,
    remaining_ms: u64,
    is_running: bool,
    work_sessions_completed: u32,
    tick_interval: Duration,
    scheduler: S,
    listeners: Listeners,
}

impl TimerEngine<ManualScheduler> {
    /// Create an engine whose ticks are delivered by the caller.
    pub fn new(configuration: Configuration) -> Self {
        Self::with_scheduler(configuration, ManualScheduler::new())
    }
}

impl<S: TickScheduler> TimerEngine<S> {
    /// Create an engine that owns `scheduler` as its tick source.
    ///
    /// Starts stopped, in `Work`, with the full work duration remaining.
    pub fn with_scheduler(configuration: Configuration, scheduler: S) -> Self {
        Self {
            configuration,
            phase: Phase::Work,
            remaining_ms: configuration.work_duration_ms(),
            is_running: false,
            work_sessions_completed: 0,
            tick_interval: DEFAULT_TICK_INTERVAL,
            scheduler,
            listeners: Listeners::default(),
        }
    }

    /// Use a different tick period. Takes effect the next time ticks are
    /// scheduled.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn work_sessions_completed(&self) -> u32 {
        self.work_sessions_completed
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            is_running: self.is_running,
            work_sessions_completed: self.work_sessions_completed,
        }
    }

    pub fn progress_percent(&self) -> u8 {
        crate::progress::progress_percent(&self.snapshot(), &self.configuration)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Receive a snapshot on every tick and state change.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&TimerSnapshot) + Send + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.snapshot.push((id, Box::new(listener)));
        id
    }

    /// Receive a bare notification each time a phase runs out.
    pub fn on_phase_completed<F>(&mut self, mut listener: F) -> ListenerId
    where
        F: FnMut() + Send + 'static,
    {
        self.on_phase_transition(move |_| listener())
    }

    /// Like [`on_phase_completed`](Self::on_phase_completed), with the
    /// finished and next phase.
    pub fn on_phase_transition<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&PhaseTransition) + Send + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.transition.push((id, Box::new(listener)));
        id
    }

    /// Receive non-fatal errors (scheduling failure, degenerate cycles).
    pub fn on_error<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CoreError) + Send + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.error.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start counting down. No-op if already running.
    ///
    /// A phase with nothing remaining expires immediately instead of waiting
    /// for a tick.
    ///
    /// # Errors
    ///
    /// [`CoreError::TickSource`] if ticks cannot be scheduled, or
    /// [`CoreError::DegenerateConfiguration`] if zero-length phases keep
    /// expiring. In both cases the engine is left stopped.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running {
            return Ok(());
        }
        debug!(phase = %self.phase, remaining_ms = self.remaining_ms, "starting timer");
        self.run_current_phase(0)
    }

    /// Stop counting down, keeping the remaining time. Idempotent.
    pub fn pause(&mut self) {
        self.scheduler.disarm();
        if !self.is_running {
            return;
        }
        self.is_running = false;
        debug!(phase = %self.phase, remaining_ms = self.remaining_ms, "timer paused");
        self.emit_snapshot();
    }

    /// Stop, and rewind the current phase to its configured duration.
    /// Neither the phase nor the session count changes.
    ///
    /// # Errors
    ///
    /// Only when `auto_start` is set; see [`start`](Self::start).
    pub fn reset(&mut self, auto_start: bool) -> Result<()> {
        self.rewind();
        if auto_start {
            self.start()
        } else {
            Ok(())
        }
    }

    /// Replace the configuration. The countdown on screen is left alone
    /// until the next reset or phase transition.
    pub fn reconfigure(&mut self, configuration: Configuration) {
        debug!(?configuration, "configuration replaced");
        self.configuration = configuration;
    }

    /// Replace the configuration and rewind immediately, as when a preset
    /// is picked.
    pub fn set_phase_and_durations(&mut self, configuration: Configuration) {
        self.reconfigure(configuration);
        self.rewind();
    }

    /// One scheduled tick. Ignored while stopped.
    ///
    /// # Errors
    ///
    /// Propagates errors from restarting the next phase after an expiry.
    pub fn tick(&mut self) -> Result<()> {
        if !self.is_running {
            debug!("tick ignored while stopped");
            return Ok(());
        }
        let step = u64::try_from(self.tick_interval.as_millis()).unwrap_or(u64::MAX);
        self.remaining_ms = self.remaining_ms.saturating_sub(step);
        self.emit_snapshot();

        if self.remaining_ms == 0 {
            self.complete_phase();
            return self.run_current_phase(1);
        }
        Ok(())
    }

    /// Deliver as many ticks as fit in `elapsed` (rounded up), stopping
    /// early if the engine stops.
    ///
    /// # Errors
    ///
    /// The first error returned by [`tick`](Self::tick).
    pub fn advance(&mut self, elapsed: Duration) -> Result<()> {
        let step = self.tick_interval.as_millis().max(1);
        let mut ticks = elapsed.as_millis().div_ceil(step);
        while ticks > 0 && self.is_running {
            self.tick()?;
            ticks -= 1;
        }
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn rewind(&mut self) {
        self.scheduler.disarm();
        self.is_running = false;
        self.remaining_ms = self.configuration.duration_for(self.phase);
        debug!(phase = %self.phase, remaining_ms = self.remaining_ms, "timer reset");
        self.emit_snapshot();
    }

    /// Arm ticks for the current phase, first expiring any zero-length
    /// phases. `transitions` counts expiries already processed by the
    /// calling command.
    ///
    /// Each zero-length phase is reported at zero before it completes, the
    /// same as a phase that ticks down to zero.
    fn run_current_phase(&mut self, mut transitions: usize) -> Result<()> {
        while self.remaining_ms == 0 {
            if transitions >= MAX_AUTO_TRANSITIONS {
                return Err(self.stop_degenerate(transitions));
            }
            self.is_running = true;
            self.emit_snapshot();
            self.complete_phase();
            transitions += 1;
        }

        if let Err(err) = self.scheduler.arm(self.tick_interval) {
            self.is_running = false;
            let err = CoreError::from(err);
            warn!(error = %err, phase = %self.phase, "failed to schedule ticks");
            self.emit_error(&err);
            return Err(err);
        }
        self.is_running = true;
        self.emit_snapshot();
        Ok(())
    }

    fn complete_phase(&mut self) {
        self.scheduler.disarm();
        self.is_running = false;

        let finished = self.phase;
        if finished == Phase::Work {
            self.work_sessions_completed = self.work_sessions_completed.saturating_add(1);
        }
        let next = CycleStateMachine::next_phase(
            finished,
            self.work_sessions_completed,
            self.configuration.long_break_every(),
        );
        self.phase = next;
        self.remaining_ms = self.configuration.duration_for(next);

        info!(
            %finished,
            %next,
            work_sessions_completed = self.work_sessions_completed,
            "phase completed"
        );
        let transition = PhaseTransition {
            finished,
            next,
            work_sessions_completed: self.work_sessions_completed,
        };
        for (_, listener) in self.listeners.transition.iter_mut() {
            listener(&transition);
        }
    }

    fn stop_degenerate(&mut self, transitions: usize) -> CoreError {
        self.scheduler.disarm();
        self.is_running = false;
        let err = CoreError::DegenerateConfiguration { transitions };
        error!(
            transitions,
            phase = %self.phase,
            "every phase expired immediately, stopping timer"
        );
        self.emit_snapshot();
        self.emit_error(&err);
        err
    }

    fn emit_snapshot(&mut self) {
        let snapshot = self.snapshot();
        for (_, listener) in self.listeners.snapshot.iter_mut() {
            listener(&snapshot);
        }
    }

    fn emit_error(&mut self, err: &CoreError) {
        for (_, listener) in self.listeners.error.iter_mut() {
            listener(err);
        }
    }
}

impl<S: TickScheduler> fmt::Debug for TimerEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("configuration", &self.configuration)
            .field("phase", &self.phase)
            .field("remaining_ms", &self.remaining_ms)
            .field("is_running", &self.is_running)
            .field("work_sessions_completed", &self.work_sessions_completed)
            .field("tick_interval", &self.tick_interval)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TickError;
    use std::sync::{Arc, Mutex};

    fn config() -> Configuration {
        Configuration::new(25_000, 5_000, 15_000, 4).unwrap()
    }

    fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, Arc<Mutex<Vec<T>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (log.clone(), log)
    }

    #[test]
    fn initial_state() {
        let engine = TimerEngine::new(config());
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_ms(), 25_000);
        assert!(!engine.is_running());
        assert_eq!(engine.work_sessions_completed(), 0);
        assert!(!engine.scheduler().is_armed());
    }

    #[test]
    fn start_arms_scheduler_once() {
        let mut engine = TimerEngine::new(config());
        engine.start().unwrap();
        engine.start().unwrap();
        assert!(engine.is_running());
        assert_eq!(engine.scheduler().arm_count(), 1);
        assert_eq!(engine.scheduler().interval(), Some(DEFAULT_TICK_INTERVAL));
    }

    #[test]
    fn pause_disarms_and_keeps_remaining() {
        let mut engine = TimerEngine::new(config());
        engine.start().unwrap();
        engine.advance(Duration::from_secs(3)).unwrap();
        engine.pause();
        assert!(!engine.is_running());
        assert!(!engine.scheduler().is_armed());
        assert_eq!(engine.remaining_ms(), 22_000);
    }

    #[test]
    fn pause_twice_emits_once() {
        let (log, sink) = recorder();
        let mut engine = TimerEngine::new(config());
        engine.start().unwrap();
        engine.subscribe(move |s| sink.lock().unwrap().push(*s));
        engine.pause();
        engine.pause();
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn ticks_while_stopped_are_ignored() {
        let mut engine = TimerEngine::new(config());
        engine.tick().unwrap();
        assert_eq!(engine.remaining_ms(), 25_000);
    }

    #[test]
    fn tick_decrements_by_interval() {
        let mut engine = TimerEngine::new(config()).with_tick_interval(Duration::from_millis(250));
        engine.start().unwrap();
        engine.tick().unwrap();
        assert_eq!(engine.remaining_ms(), 24_750);
    }

    #[test]
    fn final_tick_floors_at_zero_then_transitions() {
        let cfg = Configuration::new(1_500, 5_000, 15_000, 4).unwrap();
        let (log, sink) = recorder();
        let mut engine = TimerEngine::new(cfg);
        engine.subscribe(move |s| sink.lock().unwrap().push(*s));
        engine.start().unwrap();
        engine.tick().unwrap();
        engine.tick().unwrap();

        let log = log.lock().unwrap();
        let remaining: Vec<u64> = log.iter().map(|s| s.remaining_ms).collect();
        // start, tick to 500, tick to 0, next phase started
        assert_eq!(remaining, vec![1_500, 500, 0, 5_000]);
        assert_eq!(log.last().unwrap().phase, Phase::ShortBreak);
        assert!(log.last().unwrap().is_running);
    }

    #[test]
    fn expiry_snapshot_precedes_completion_event() {
        let order = Arc::new(Mutex::new(Vec::<String>::new()));
        let mut engine = TimerEngine::new(Configuration::new(1_000, 2_000, 3_000, 4).unwrap());
        engine.start().unwrap();

        let o = order.clone();
        engine.subscribe(move |s| o.lock().unwrap().push(format!("snap {} {}", s.phase, s.remaining_ms)));
        let o = order.clone();
        engine.on_phase_completed(move || o.lock().unwrap().push("done".into()));

        engine.tick().unwrap();
        assert_eq!(
            *order.lock().unwrap(),
            vec!["snap WORK 0", "done", "snap SHORT_BREAK 2000"]
        );
    }

    fn order_recorder<S: TickScheduler>(
        engine: &mut TimerEngine<S>,
    ) -> Arc<Mutex<Vec<String>>> {
        let order = Arc::new(Mutex::new(Vec::<String>::new()));
        let o = order.clone();
        engine.subscribe(move |s| {
            o.lock()
                .unwrap()
                .push(format!("snap {} {} {}", s.phase, s.remaining_ms, s.is_running))
        });
        let o = order.clone();
        engine.on_phase_completed(move || o.lock().unwrap().push("done".into()));
        order
    }

    #[test]
    fn zero_length_phase_on_start_is_shown_at_zero_before_completing() {
        let mut engine = TimerEngine::new(Configuration::new(0, 5_000, 15_000, 4).unwrap());
        let order = order_recorder(&mut engine);

        engine.start().unwrap();
        assert_eq!(
            *order.lock().unwrap(),
            vec!["snap WORK 0 true", "done", "snap SHORT_BREAK 5000 true"]
        );
    }

    #[test]
    fn chained_zero_length_break_is_shown_at_zero() {
        let mut engine = TimerEngine::new(Configuration::new(1_000, 0, 15_000, 4).unwrap());
        engine.start().unwrap();
        let order = order_recorder(&mut engine);

        engine.tick().unwrap();
        assert_eq!(
            *order.lock().unwrap(),
            vec![
                "snap WORK 0 true",
                "done",
                "snap SHORT_BREAK 0 true",
                "done",
                "snap WORK 1000 true",
            ]
        );
    }

    #[test]
    fn reset_restores_duration_of_current_phase() {
        let mut engine = TimerEngine::new(config());
        engine.start().unwrap();
        engine.advance(Duration::from_secs(25)).unwrap();
        engine.advance(Duration::from_secs(2)).unwrap();
        assert_eq!(engine.phase(), Phase::ShortBreak);
        assert_eq!(engine.remaining_ms(), 3_000);

        engine.reset(false).unwrap();
        assert_eq!(engine.phase(), Phase::ShortBreak);
        assert_eq!(engine.remaining_ms(), 5_000);
        assert!(!engine.is_running());
        assert_eq!(engine.work_sessions_completed(), 1);
    }

    #[test]
    fn reconfigure_is_deferred_until_reset() {
        let mut engine = TimerEngine::new(config());
        engine.start().unwrap();
        engine.advance(Duration::from_secs(5)).unwrap();
        engine.reconfigure(Configuration::new(60_000, 10_000, 30_000, 4).unwrap());
        assert_eq!(engine.remaining_ms(), 20_000);
        assert!(engine.is_running());

        engine.reset(false).unwrap();
        assert_eq!(engine.remaining_ms(), 60_000);
    }

    #[test]
    fn set_phase_and_durations_applies_immediately() {
        let mut engine = TimerEngine::new(config());
        engine.start().unwrap();
        engine.set_phase_and_durations(Configuration::new(50_000, 10_000, 30_000, 4).unwrap());
        assert_eq!(engine.remaining_ms(), 50_000);
        assert!(!engine.is_running());
        assert!(!engine.scheduler().is_armed());
    }

    #[test]
    fn scheduling_failure_leaves_engine_stopped() {
        let (errors, sink) = recorder();
        let mut engine = TimerEngine::new(config());
        engine.on_error(move |e| sink.lock().unwrap().push(e.clone()));
        engine
            .scheduler_mut()
            .fail_next_arm(TickError::Rejected("no timers left".into()));

        let err = engine.start().unwrap_err();
        assert!(matches!(err, CoreError::TickSource(_)));
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_ms(), 25_000);
        assert_eq!(errors.lock().unwrap().len(), 1);

        engine.start().unwrap();
        assert!(engine.is_running());
    }

    #[test]
    fn all_zero_configuration_is_degenerate() {
        let (errors, sink) = recorder();
        let completed = Arc::new(Mutex::new(0usize));
        let mut engine = TimerEngine::new(Configuration::new(0, 0, 0, 4).unwrap());
        engine.on_error(move |e| sink.lock().unwrap().push(e.clone()));
        let c = completed.clone();
        engine.on_phase_completed(move || *c.lock().unwrap() += 1);

        let err = engine.start().unwrap_err();
        assert_eq!(
            err,
            CoreError::DegenerateConfiguration {
                transitions: MAX_AUTO_TRANSITIONS
            }
        );
        assert!(!engine.is_running());
        assert!(!engine.scheduler().is_armed());
        assert_eq!(*completed.lock().unwrap(), MAX_AUTO_TRANSITIONS);
        assert_eq!(errors.lock().unwrap().len(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let (log, sink) = recorder();
        let mut engine = TimerEngine::new(config());
        let id = engine.subscribe(move |s| sink.lock().unwrap().push(*s));
        engine.start().unwrap();
        assert!(engine.unsubscribe(id));
        assert!(!engine.unsubscribe(id));
        engine.tick().unwrap();
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn progress_tracks_remaining() {
        let mut engine = TimerEngine::new(Configuration::new(10_000, 5_000, 15_000, 4).unwrap());
        assert_eq!(engine.progress_percent(), 100);
        engine.start().unwrap();
        engine.advance(Duration::from_secs(5)).unwrap();
        assert_eq!(engine.progress_percent(), 50);
    }
}
