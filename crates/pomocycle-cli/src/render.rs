//! Terminal rendering of timer events.
//!
//! Text mode redraws a single status line in place and rings the bell on
//! phase completion. JSON mode writes one event per line.

use std::io::{self, Write};

use pomocycle_core::{format_remaining, progress_percent, Configuration, Event};

const BAR_WIDTH: usize = 20;
const BELL: &str = "\x07";
const CLEAR_TO_EOL: &str = "\x1b[K";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Text,
    Json,
}

pub struct Renderer<W: Write> {
    out: W,
    config: Configuration,
    mode: RenderMode,
    bell: bool,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, config: Configuration, mode: RenderMode, bell: bool) -> Self {
        Self {
            out,
            config,
            mode,
            bell,
        }
    }

    /// Durations used for the progress bar.
    pub fn set_configuration(&mut self, config: Configuration) {
        self.config = config;
    }

    pub fn render(&mut self, event: &Event) -> io::Result<()> {
        match self.mode {
            RenderMode::Json => writeln!(self.out, "{}", event.to_json())?,
            RenderMode::Text => self.render_text(event)?,
        }
        self.out.flush()
    }

    /// Print a message on its own line without disturbing the status line.
    pub fn notice(&mut self, message: &str) -> io::Result<()> {
        if self.mode == RenderMode::Text {
            writeln!(self.out, "\n{message}")?;
        }
        self.out.flush()
    }

    fn render_text(&mut self, event: &Event) -> io::Result<()> {
        match event {
            Event::StateSnapshot { .. } => {
                let Some(snapshot) = event.as_snapshot() else {
                    return Ok(());
                };
                let pct = progress_percent(&snapshot, &self.config);
                write!(
                    self.out,
                    "\r{:<11} {} [{}] {:>3}%  done: {}{}{}",
                    snapshot.phase.label(),
                    format_remaining(snapshot.remaining_ms),
                    progress_bar(pct, BAR_WIDTH),
                    pct,
                    snapshot.work_sessions_completed,
                    if snapshot.is_running { "" } else { "  (paused)" },
                    CLEAR_TO_EOL,
                )
            }
            Event::PhaseCompleted { finished, next, .. } => {
                if self.bell {
                    write!(self.out, "{BELL}")?;
                }
                writeln!(self.out, "\n{} finished, {} next", finished.label(), next.label())
            }
            Event::Error { message, .. } => writeln!(self.out, "\nerror: {message}"),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// `#` for the share remaining, `-` for the share elapsed.
fn progress_bar(pct: u8, width: usize) -> String {
    let filled = (usize::from(pct.min(100)) * width + 50) / 100;
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}
