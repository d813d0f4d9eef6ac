//! Interactive timer.
//!
//! Hosts a `TimerRuntime`, renders its events to stdout, and forwards
//! single-key commands read from stdin:
//!
//! ```text
//! <enter>  toggle start/pause     r   reset
//! s        start                  R   reset and start
//! p        pause                  c   classic preset (25/5/15)
//! q        quit                   e   extended preset (50/10/30)
//! ```

use std::io::Write;
use std::time::Duration;

use clap::Args;
use pomocycle_core::{Configuration, Event, Preset, TimerHandle, TimerRuntime};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::common::{duration_ms, parse_duration};
use crate::render::{RenderMode, Renderer};
use crate::storage::Settings;

#[derive(Args)]
pub struct RunArgs {
    /// Start from a preset instead of the saved durations
    #[arg(long)]
    preset: Option<Preset>,
    /// Work duration (e.g. 25m, 90s)
    #[arg(long, value_parser = parse_duration)]
    work: Option<Duration>,
    /// Short break duration
    #[arg(long, value_parser = parse_duration)]
    short_break: Option<Duration>,
    /// Long break duration
    #[arg(long, value_parser = parse_duration)]
    long_break: Option<Duration>,
    /// Work sessions between long breaks
    #[arg(long)]
    long_break_every: Option<u32>,
    /// Exit after this many phases have completed
    #[arg(long)]
    cycles: Option<u32>,
    /// Wait for a start command instead of starting immediately
    #[arg(long)]
    paused: bool,
    /// Emit events as JSON lines instead of a status line
    #[arg(long)]
    json: bool,
    /// Do not ring the terminal bell on phase completion
    #[arg(long)]
    no_bell: bool,
}

/// A parsed stdin command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Toggle,
    Start,
    Pause,
    Reset { auto_start: bool },
    Preset(Preset),
    Quit,
}

fn parse_key(line: &str) -> Option<Key> {
    match line.trim() {
        "" => Some(Key::Toggle),
        "s" | "start" => Some(Key::Start),
        "p" | "pause" => Some(Key::Pause),
        "r" | "reset" => Some(Key::Reset { auto_start: false }),
        "R" | "restart" => Some(Key::Reset { auto_start: true }),
        "c" | "classic" => Some(Key::Preset(Preset::Classic)),
        "e" | "extended" => Some(Key::Preset(Preset::Extended)),
        "q" | "quit" | "exit" => Some(Key::Quit),
        _ => None,
    }
}

/// Saved settings, then the preset, then individual flags.
fn resolve_configuration(
    settings: &Settings,
    args: &RunArgs,
) -> Result<Configuration, Box<dyn std::error::Error>> {
    let base = match args.preset {
        Some(preset) => preset.configuration(),
        None => settings.configuration()?,
    };
    let config = base.with_durations(
        args.work.map(duration_ms).unwrap_or(base.work_duration_ms()),
        args.short_break
            .map(duration_ms)
            .unwrap_or(base.short_break_duration_ms()),
        args.long_break
            .map(duration_ms)
            .unwrap_or(base.long_break_duration_ms()),
    );
    let config = match args.long_break_every {
        Some(every) => config.with_long_break_every(every)?,
        None => config,
    };
    if config.is_all_zero() {
        return Err("every phase has zero length; give at least one phase a duration".into());
    }
    Ok(config)
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    let config = resolve_configuration(&settings, &args)?;
    let tick_interval = settings.tick_interval()?;
    let mode = if args.json {
        RenderMode::Json
    } else {
        RenderMode::Text
    };
    let bell = settings.notifications.bell && !args.no_bell;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(drive(config, tick_interval, &args, mode, bell));
    // A pending stdin read cannot be cancelled; don't wait for it.
    runtime.shutdown_background();
    result
}

async fn drive(
    config: Configuration,
    tick_interval: Duration,
    args: &RunArgs,
    mode: RenderMode,
    bell: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (handle, task) = TimerRuntime::spawn(config, tick_interval);
    let mut events = handle.events();
    let mut renderer = Renderer::new(std::io::stdout(), config, mode, bell);

    if args.paused {
        renderer.render(&Event::snapshot(&handle.snapshot().await?))?;
    } else {
        handle.start()?;
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut completed: u32 = 0;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    renderer.render(&event)?;
                    if matches!(event, Event::PhaseCompleted { .. }) {
                        completed += 1;
                        if args.cycles.is_some_and(|n| completed >= n) {
                            info!(completed, "requested number of phases completed");
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "renderer fell behind, events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            line = stdin.next_line(), if stdin_open => match line? {
                Some(line) => match parse_key(&line) {
                    Some(Key::Quit) => break,
                    Some(key) => dispatch(&handle, &mut renderer, key).await?,
                    None => renderer.notice(&format!("unknown command: {}", line.trim()))?,
                },
                // Input closed; keep counting down until interrupted.
                None => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown()?;
    task.await?;
    if mode == RenderMode::Text {
        println!();
    }
    std::io::stdout().flush()?;
    Ok(())
}

async fn dispatch<W: Write>(
    handle: &TimerHandle,
    renderer: &mut Renderer<W>,
    key: Key,
) -> Result<(), Box<dyn std::error::Error>> {
    match key {
        Key::Toggle => {
            if handle.snapshot().await?.is_running {
                handle.pause()?;
            } else {
                handle.start()?;
            }
        }
        Key::Start => handle.start()?,
        Key::Pause => handle.pause()?,
        Key::Reset { auto_start } => handle.reset(auto_start)?,
        Key::Preset(preset) => {
            let config = preset.configuration();
            handle.set_phase_and_durations(config)?;
            renderer.set_configuration(config);
        }
        Key::Quit => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            preset: None,
            work: None,
            short_break: None,
            long_break: None,
            long_break_every: None,
            cycles: None,
            paused: false,
            json: false,
            no_bell: false,
        }
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(parse_key(""), Some(Key::Toggle));
        assert_eq!(parse_key(" p "), Some(Key::Pause));
        assert_eq!(parse_key("R"), Some(Key::Reset { auto_start: true }));
        assert_eq!(parse_key("r"), Some(Key::Reset { auto_start: false }));
        assert_eq!(parse_key("e"), Some(Key::Preset(Preset::Extended)));
        assert_eq!(parse_key("q"), Some(Key::Quit));
        assert_eq!(parse_key("x"), None);
    }

    #[test]
    fn saved_settings_are_the_default() {
        let cfg = resolve_configuration(&Settings::default(), &args()).unwrap();
        assert_eq!(cfg, Configuration::default());
    }

    #[test]
    fn flags_override_preset() {
        let mut a = args();
        a.preset = Some(Preset::Extended);
        a.work = Some(Duration::from_secs(90));
        a.long_break_every = Some(2);
        let cfg = resolve_configuration(&Settings::default(), &a).unwrap();
        assert_eq!(cfg.work_duration_ms(), 90_000);
        assert_eq!(cfg.short_break_duration_ms(), 10 * 60 * 1000);
        assert_eq!(cfg.long_break_every(), 2);
    }

    #[test]
    fn all_zero_durations_are_rejected() {
        let mut a = args();
        a.work = Some(Duration::ZERO);
        a.short_break = Some(Duration::ZERO);
        a.long_break = Some(Duration::ZERO);
        let err = resolve_configuration(&Settings::default(), &a).unwrap_err();
        assert!(err.to_string().contains("zero length"));

        a.long_break = Some(Duration::from_secs(1));
        assert!(resolve_configuration(&Settings::default(), &a).is_ok());
    }

    #[test]
    fn zero_cadence_flag_is_rejected() {
        let mut a = args();
        a.long_break_every = Some(0);
        assert!(resolve_configuration(&Settings::default(), &a).is_err());
    }
}
