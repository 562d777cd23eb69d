#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Anchor Defence scenarios headlessly.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anchor_defence_cli::{scenario::Scenario, session::Session};
use anchor_defence_core::seconds_to_duration;
use anchor_defence_world::query;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Anchor Defence headless simulator
#[derive(Parser, Debug)]
#[command(name = "anchor-defence")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a scenario and print the final state
    Run {
        /// Scenario file (TOML)
        #[arg(long)]
        scenario: PathBuf,

        /// Simulated seconds to run
        #[arg(long, default_value = "30")]
        seconds: f64,

        /// Simulation step in milliseconds
        #[arg(long, default_value = "100")]
        step_ms: u64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build and classify the scenario field, then print the shortest path
    Path {
        /// Scenario file (TOML)
        #[arg(long)]
        scenario: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    match args.command {
        Commands::Run {
            scenario,
            seconds,
            step_ms,
            json,
        } => run(&scenario, seconds, step_ms, json),
        Commands::Path { scenario } => path(&scenario),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("anchor_defence=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run(path: &Path, seconds: f64, step_ms: u64, json: bool) -> Result<()> {
    if step_ms == 0 {
        bail!("--step-ms must be at least 1");
    }
    let scenario = Scenario::load(path)?;
    let mut session = Session::from_scenario(&scenario);
    let duration = seconds_to_duration(seconds);

    info!(seconds = duration.as_secs_f64(), step_ms, "running scenario");
    session.run_for(duration, Duration::from_millis(step_ms));

    let report = session.report();
    if json {
        let text = serde_json::to_string_pretty(&report).context("failed to encode report")?;
        println!("{text}");
    } else {
        println!("{report}");
    }
    Ok(())
}

fn path(path: &Path) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let session = Session::from_scenario(&scenario);
    let world = session.world();

    if !query::field_ready(world) {
        bail!("field could not be built from the scenario corners");
    }

    let cells = query::current_path(world);
    if cells.is_empty() {
        println!("no path from spawn to base");
        return Ok(());
    }
    for position in cells {
        match query::nearest_cell(world, *position) {
            Some(cell) => println!(
                "{},{}\t{:.3} {:.3} {:.3}",
                cell.column(),
                cell.row(),
                position.x,
                position.y,
                position.z
            ),
            None => println!("?\t{:.3} {:.3} {:.3}", position.x, position.y, position.z),
        }
    }
    Ok(())
}
