#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the raid rehearsal experience.
//!
//! Without flags it opens a window on the built-in encounter. `--headless`
//! replays the timeline with fixed ticks instead and logs a summary.

mod headless;
mod interactive;
mod logging;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use raid_rehearsal_system_authoring::{self as authoring, Encounter};
use tracing::info;

/// Practise boss encounter timelines against a scripted arena.
#[derive(Debug, Parser)]
#[command(name = "raid-rehearsal", version, about)]
struct Cli {
    /// Encounter file to load instead of the built-in encounter.
    #[arg(long, value_name = "FILE")]
    encounter: Option<PathBuf>,
    /// Replay the encounter without opening a window.
    #[arg(long)]
    headless: bool,
    /// Simulated seconds to replay in headless mode.
    #[arg(long, value_name = "SECS", default_value_t = 90.0)]
    duration: f64,
    /// Fixed tick length in headless mode.
    #[arg(
        long,
        value_name = "MS",
        default_value_t = 16,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    tick_ms: u64,
    /// Synchronise presentation with the display refresh rate.
    #[arg(long)]
    vsync: bool,
    /// Log frame timing once per second.
    #[arg(long)]
    show_fps: bool,
    /// Log this workspace's crates at debug level.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn replay_length(&self) -> Result<Duration> {
        ensure!(
            self.duration.is_finite() && self.duration > 0.0,
            "--duration must be a positive number of seconds (received {})",
            self.duration
        );
        Duration::try_from_secs_f64(self.duration).context("--duration is out of range")
    }

    fn load_encounter(&self) -> Result<Encounter> {
        match &self.encounter {
            Some(path) => authoring::load(path)
                .with_context(|| format!("failed to load encounter {}", path.display())),
            None => authoring::builtin().context("built-in encounter is invalid"),
        }
    }
}

/// Entry point for the raid rehearsal command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let encounter = cli.load_encounter()?;
    info!(
        encounter = %encounter.setup.name,
        actions = encounter.schedule.len(),
        "encounter loaded"
    );

    if cli.headless {
        let length = cli.replay_length()?;
        let summary = headless::replay(encounter, length, Duration::from_millis(cli.tick_ms))?;
        summary.log();
        return Ok(());
    }

    interactive::run(encounter, cli.vsync, cli.show_fps)
}
