//! Preview the upcoming phase sequence without running a timer.

use clap::Args;
use pomocycle_core::{format_remaining, CycleStateMachine, Phase};
use serde::Serialize;

use crate::storage::Settings;

#[derive(Args)]
pub struct PlanArgs {
    /// Number of upcoming phases to show
    #[arg(long, default_value_t = 8)]
    count: usize,
    /// Phase currently on the clock
    #[arg(long, default_value = "work")]
    from: Phase,
    /// Work sessions already completed
    #[arg(long, default_value_t = 0)]
    completed: u32,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct PlannedPhase {
    phase: Phase,
    duration_ms: u64,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Settings::load()?.configuration()?;
    let planned: Vec<PlannedPhase> =
        CycleStateMachine::plan(&config, args.from, args.completed, args.count)
            .into_iter()
            .map(|phase| PlannedPhase {
                phase,
                duration_ms: config.duration_for(phase),
            })
            .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
        return Ok(());
    }
    println!("after {} ({} done):", args.from.label(), args.completed);
    for (i, p) in planned.iter().enumerate() {
        println!(
            "{:>3}. {:<11} {}",
            i + 1,
            p.phase.label(),
            format_remaining(p.duration_ms)
        );
    }
    Ok(())
}
