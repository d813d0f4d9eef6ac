//! Async host for a [`TimerEngine`].
//!
//! The engine lives on a single tokio task and every command and tick is
//! applied there in arrival order, so no locking is needed around it.
//! Callers talk to it through a cloneable [`TimerHandle`] and observe it
//! through a broadcast stream of [`Event`]s.
//!
//! Commands are fire-and-forget: a failed `start` shows up on the event
//! stream as [`Event::Error`] rather than as a return value.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::config::Configuration;
use super::engine::TimerEngine;
use super::scheduler::{IntervalScheduler, Tick};
use super::snapshot::TimerSnapshot;
use crate::error::{CoreError, Result};
use crate::events::Event;

/// Buffered events per subscriber before the slowest one starts lagging.
pub const EVENT_CAPACITY: usize = 256;

#[derive(Debug)]
enum Command {
    Start,
    Pause,
    Reset { auto_start: bool },
    Reconfigure(Configuration),
    SetPhaseAndDurations(Configuration),
    Snapshot(oneshot::Sender<TimerSnapshot>),
    Shutdown,
}

/// Cloneable command/subscription handle to a running timer.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<Event>,
}

impl TimerHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| CoreError::RuntimeClosed)
    }

    pub fn start(&self) -> Result<()> {
        self.send(Command::Start)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn reset(&self, auto_start: bool) -> Result<()> {
        self.send(Command::Reset { auto_start })
    }

    pub fn reconfigure(&self, configuration: Configuration) -> Result<()> {
        self.send(Command::Reconfigure(configuration))
    }

    pub fn set_phase_and_durations(&self, configuration: Configuration) -> Result<()> {
        self.send(Command::SetPhaseAndDurations(configuration))
    }

    /// Current engine state, after every command sent before this call.
    pub async fn snapshot(&self) -> Result<TimerSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| CoreError::RuntimeClosed)
    }

    /// Stop the runtime. The engine and its tick source are dropped.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Subscribe to events emitted from now on.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}

/// Spawns timer engines onto the current tokio runtime.
pub struct TimerRuntime;

impl TimerRuntime {
    /// Spawn an engine ticking every `tick_interval`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(configuration: Configuration, tick_interval: Duration) -> (TimerHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (scheduler, ticks) = IntervalScheduler::new();

        let mut engine =
            TimerEngine::with_scheduler(configuration, scheduler).with_tick_interval(tick_interval);

        let tx = event_tx.clone();
        engine.subscribe(move |snapshot| {
            let _ = tx.send(Event::snapshot(snapshot));
        });
        let tx = event_tx.clone();
        engine.on_phase_transition(move |t| {
            let _ = tx.send(Event::PhaseCompleted {
                finished: t.finished,
                next: t.next,
                work_sessions_completed: t.work_sessions_completed,
                at: Utc::now(),
            });
        });
        let tx = event_tx.clone();
        engine.on_error(move |err| {
            let _ = tx.send(Event::error(err));
        });

        let task = tokio::spawn(run(engine, command_rx, ticks));
        (
            TimerHandle {
                commands: command_tx,
                events: event_tx,
            },
            task,
        )
    }
}

async fn run(
    mut engine: TimerEngine<IntervalScheduler>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut ticks: mpsc::UnboundedReceiver<Tick>,
) {
    debug!("timer runtime started");
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                None | Some(Command::Shutdown) => break,
                Some(command) => apply(&mut engine, command),
            },
            Some(tick) = ticks.recv() => {
                if !engine.scheduler().accepts(tick) {
                    trace!(generation = tick.generation, "dropping stale tick");
                    continue;
                }
                if let Err(err) = engine.tick() {
                    debug!(error = %err, "tick did not complete cleanly");
                }
            }
        }
    }
    engine.pause();
    debug!("timer runtime stopped");
}

fn apply(engine: &mut TimerEngine<IntervalScheduler>, command: Command) {
    trace!(?command, "applying command");
    let outcome = match command {
        Command::Start => engine.start(),
        Command::Pause => {
            engine.pause();
            Ok(())
        }
        Command::Reset { auto_start } => engine.reset(auto_start),
        Command::Reconfigure(configuration) => {
            engine.reconfigure(configuration);
            Ok(())
        }
        Command::SetPhaseAndDurations(configuration) => {
            engine.set_phase_and_durations(configuration);
            Ok(())
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(engine.snapshot());
            Ok(())
        }
        Command::Shutdown => Ok(()),
    };
    if let Err(err) = outcome {
        debug!(error = %err, "command did not complete cleanly");
    }
}
