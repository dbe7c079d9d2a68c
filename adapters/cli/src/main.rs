#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives a headless Hop Runner session.

mod config;
mod headless;
mod input;
mod session;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use hop_runner_core::LaneConfig;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{RunFile, DEFAULT_SEED},
    session::Session,
};

/// Headless driver for the Hop Runner lane.
#[derive(Debug, Parser)]
#[command(name = "hop-runner", version)]
struct Args {
    /// TOML run configuration with an optional `seed` and a `[lane]` table.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for the lane generator. Overrides the configuration file.
    #[arg(long)]
    seed: Option<u64>,
    /// Scripted input such as `1121.2`. The autopilot plays when omitted.
    #[arg(long)]
    script: Option<String>,
    /// Maximum number of jumps attempted by the autopilot.
    #[arg(long, default_value_t = 100)]
    jumps: u32,
    /// Simulated milliseconds advanced per tick.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Log filter applied when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Probability that a drawn tile is ground.
    #[arg(long)]
    fill_probability: Option<f64>,
    /// Number of tiles spawned before the first frame.
    #[arg(long)]
    initial_length: Option<u32>,
    /// Tiles kept spawned ahead of the settled index.
    #[arg(long)]
    ahead: Option<u32>,
    /// Tiles kept spawned behind the settled index.
    #[arg(long)]
    behind: Option<u32>,
}

impl Args {
    fn override_lane(&self, lane: &mut LaneConfig) {
        if let Some(fill_probability) = self.fill_probability {
            lane.fill_probability = fill_probability;
        }
        if let Some(initial_length) = self.initial_length {
            lane.initial_length = initial_length;
        }
        if let Some(ahead) = self.ahead {
            lane.ahead_count = ahead;
        }
        if let Some(behind) = self.behind {
            lane.behind_margin = behind;
        }
    }
}

/// Entry point for the Hop Runner command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;
    ensure!(args.tick_ms > 0, "--tick-ms must be at least 1");

    let mut file = match &args.config {
        Some(path) => config::load(path)?,
        None => RunFile::default(),
    };
    args.override_lane(&mut file.lane);
    file.lane
        .validate()
        .context("lane overrides out of range")?;
    let seed = args.seed.or(file.seed).unwrap_or(DEFAULT_SEED);

    let mut session = Session::new(file.lane, seed, Duration::from_millis(args.tick_ms))?;
    match &args.script {
        Some(script) => session.run_script(&input::parse_script(script)?),
        None => session.run_autopilot(args.jumps),
    }

    println!("{}", session.finish());
    Ok(())
}

fn init_logging(default_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .with_context(|| format!("invalid log filter `{default_level}`"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!(error))
        .context("failed to install the log subscriber")
}
