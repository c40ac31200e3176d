//! Snake Arena - headless runner
//!
//! Runs the simulation for a fixed number of ticks, optionally streaming
//! every event as JSON lines and printing the final snapshot.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use snake_arena::core::config::SimulationConfig;
use snake_arena::core::error::Result;
use snake_arena::core::types::Tick;
use snake_arena::ecs::world::World;
use snake_arena::simulation::tick::{run_simulation_tick, SimulationEvent};

/// Headless snake arena simulation
#[derive(Parser, Debug)]
#[command(name = "snake-arena")]
#[command(about = "Run the snake arena simulation without a renderer")]
struct Args {
    /// TOML config file; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 3600)]
    ticks: Tick,

    /// Override the world RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write every event as a JSON line to this file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Print the final world snapshot as JSON
    #[arg(long)]
    snapshot: bool,
}

#[derive(Serialize)]
struct EventLine<'a> {
    tick: Tick,
    #[serde(flatten)]
    event: &'a SimulationEvent,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("snake_arena=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.world.seed = seed;
    }

    let mut world = World::new(config)?;
    let mut sink = match &args.events {
        Some(path) => Some(BufWriter::new(File::create(path)?)),
        None => None,
    };

    tracing::info!(ticks = args.ticks, seed = world.config.world.seed, "Simulation starting");

    let mut total_events = 0usize;
    for _ in 0..args.ticks {
        let events = run_simulation_tick(&mut world);
        total_events += events.len();

        if let Some(out) = sink.as_mut() {
            for event in &events {
                let line = EventLine {
                    tick: world.current_tick,
                    event,
                };
                serde_json::to_writer(&mut *out, &line)?;
                out.write_all(b"\n")?;
            }
        }
    }
    if let Some(mut out) = sink {
        out.flush()?;
    }

    let snapshot = world.snapshot();
    tracing::info!(
        ticks = world.current_tick,
        elapsed = world.elapsed,
        events = total_events,
        living = snapshot.summary.living_snakes,
        hunters = snapshot.summary.hunters,
        "Simulation finished"
    );

    if args.snapshot {
        println!("{}", snapshot.to_json()?);
    }
    Ok(())
}
