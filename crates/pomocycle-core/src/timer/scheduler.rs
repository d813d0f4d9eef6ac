//! Periodic tick sources.
//!
//! The engine owns exactly one [`TickScheduler`]. It arms it when counting
//! starts and disarms it on pause, reset and expiry. Two implementations are
//! provided:
//!
//! - [`ManualScheduler`]: records whether ticks are wanted; the host (or a
//!   test) delivers them by calling `TimerEngine::tick()` directly.
//! - [`IntervalScheduler`]: spawns a tokio interval task that sends
//!   generation-stamped [`Tick`] messages. Disarming aborts the task and
//!   retires the generation, so a tick already sitting in the channel is
//!   recognised as stale and dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::TickError;

/// A source of periodic tick callbacks.
pub trait TickScheduler {
    /// Begin delivering ticks every `interval`. Re-arming replaces any
    /// previous registration.
    fn arm(&mut self, interval: Duration) -> Result<(), TickError>;

    /// Stop delivering ticks. Must take effect before it returns.
    fn disarm(&mut self);

    fn is_armed(&self) -> bool;
}

/// Scheduler driven by the caller.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    interval: Option<Duration>,
    arm_count: usize,
    fail_next: Option<TickError>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interval of the active registration, if armed.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Number of successful `arm` calls so far.
    pub fn arm_count(&self) -> usize {
        self.arm_count
    }

    /// Make the next `arm` call fail with `err`.
    pub fn fail_next_arm(&mut self, err: TickError) {
        self.fail_next = Some(err);
    }
}

impl TickScheduler for ManualScheduler {
    fn arm(&mut self, interval: Duration) -> Result<(), TickError> {
        if let Some(err) = self.fail_next.take() {
            self.interval = None;
            return Err(err);
        }
        if interval.is_zero() {
            return Err(TickError::ZeroInterval);
        }
        self.interval = Some(interval);
        self.arm_count += 1;
        Ok(())
    }

    fn disarm(&mut self) {
        self.interval = None;
    }

    fn is_armed(&self) -> bool {
        self.interval.is_some()
    }
}

/// One scheduled tick from an [`IntervalScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// Tokio-backed scheduler.
///
/// Must be armed from within a tokio runtime.
#[derive(Debug)]
pub struct IntervalScheduler {
    ticks: mpsc::UnboundedSender<Tick>,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl IntervalScheduler {
    /// Create a scheduler and the receiving end of its tick channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                ticks: tx,
                task: None,
                generation: 0,
            },
            rx,
        )
    }

    /// Whether `tick` belongs to the active registration.
    pub fn accepts(&self, tick: Tick) -> bool {
        self.task.is_some() && tick.generation == self.generation
    }
}

impl TickScheduler for IntervalScheduler {
    fn arm(&mut self, interval: Duration) -> Result<(), TickError> {
        if interval.is_zero() {
            return Err(TickError::ZeroInterval);
        }
        self.disarm();
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TickError::NoRuntime)?;

        self.generation += 1;
        let generation = self.generation;
        let tx = self.ticks.clone();
        self.task = Some(runtime.spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(Tick { generation }).is_err() {
                    break;
                }
            }
        }));
        tracing::debug!(generation, interval_ms = interval.as_millis() as u64, "tick source armed");
        Ok(())
    }

    fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(generation = self.generation, "tick source disarmed");
        }
    }

    fn is_armed(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}
