//! Integration tests for the tokio-hosted timer runtime.
//!
//! Time is paused so the interval ticks are driven by tokio's auto-advance.

use std::time::Duration;

use pomocycle_core::{Configuration, CoreError, Event, Phase, TimerRuntime};
use tokio::sync::broadcast;

const SECOND: Duration = Duration::from_secs(1);

async fn next_event(events: &mut broadcast::Receiver<Event>) -> Event {
    events.recv().await.expect("event stream closed")
}

#[tokio::test(start_paused = true)]
async fn counts_down_and_rolls_into_break() {
    let config = Configuration::new(3_000, 1_000, 2_000, 4).unwrap();
    let (handle, task) = TimerRuntime::spawn(config, SECOND);
    let mut events = handle.events();
    handle.start().unwrap();

    let mut remaining = Vec::new();
    loop {
        match next_event(&mut events).await {
            Event::StateSnapshot { remaining_ms, .. } => remaining.push(remaining_ms),
            Event::PhaseCompleted { finished, next, work_sessions_completed, .. } => {
                assert_eq!(finished, Phase::Work);
                assert_eq!(next, Phase::ShortBreak);
                assert_eq!(work_sessions_completed, 1);
                break;
            }
            Event::Error { message, .. } => panic!("unexpected error: {message}"),
        }
    }
    assert_eq!(remaining, vec![3_000, 2_000, 1_000, 0]);

    match next_event(&mut events).await {
        Event::StateSnapshot { phase, remaining_ms, is_running, .. } => {
            assert_eq!(phase, Phase::ShortBreak);
            assert_eq!(remaining_ms, 1_000);
            assert!(is_running);
        }
        other => panic!("expected transition snapshot, got {other:?}"),
    }

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pause_stops_ticks() {
    let config = Configuration::new(10_000, 1_000, 2_000, 4).unwrap();
    let (handle, task) = TimerRuntime::spawn(config, SECOND);
    let mut events = handle.events();
    handle.start().unwrap();

    // start snapshot, then two ticks
    for _ in 0..3 {
        next_event(&mut events).await;
    }
    handle.pause().unwrap();
    let paused = handle.snapshot().await.unwrap();
    assert!(!paused.is_running);
    assert_eq!(paused.remaining_ms, 8_000);

    tokio::time::sleep(SECOND * 30).await;
    let later = handle.snapshot().await.unwrap();
    assert_eq!(later, paused);

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn preset_change_rewinds_immediately() {
    let config = Configuration::new(10_000, 1_000, 2_000, 4).unwrap();
    let (handle, task) = TimerRuntime::spawn(config, SECOND);
    handle.start().unwrap();
    tokio::time::sleep(SECOND * 3 + Duration::from_millis(500)).await;

    let next = Configuration::new(50_000, 10_000, 30_000, 4).unwrap();
    handle.reconfigure(next).unwrap();
    let deferred = handle.snapshot().await.unwrap();
    assert_eq!(deferred.remaining_ms, 7_000);
    assert!(deferred.is_running);

    handle.set_phase_and_durations(next).unwrap();
    let applied = handle.snapshot().await.unwrap();
    assert_eq!(applied.remaining_ms, 50_000);
    assert!(!applied.is_running);

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn degenerate_configuration_is_reported_as_event() {
    let config = Configuration::new(0, 0, 0, 4).unwrap();
    let (handle, task) = TimerRuntime::spawn(config, SECOND);
    let mut events = handle.events();
    handle.start().unwrap();

    let message = loop {
        if let Event::Error { message, .. } = next_event(&mut events).await {
            break message;
        }
    };
    assert!(message.contains("Degenerate configuration"));
    assert!(!handle.snapshot().await.unwrap().is_running);

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn commands_fail_after_shutdown() {
    let (handle, task) = TimerRuntime::spawn(Configuration::default(), SECOND);
    handle.shutdown().unwrap();
    task.await.unwrap();

    assert_eq!(handle.start(), Err(CoreError::RuntimeClosed));
    assert_eq!(handle.snapshot().await, Err(CoreError::RuntimeClosed));
}
