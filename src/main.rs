use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::time::Duration;

use crossroads_sim::{
    compute::{ComputeBackend, SimulationBackend},
    config::{build_vehicles, format_roster, SimulationConfig, Validate, VehiclesConfig},
    render::TerminalRenderer,
    simulation::Crossroads,
};

#[derive(Parser)]
#[command(name = "crossroads")]
#[command(about = "Lock-step vehicle simulation of a 4-way grid intersection")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Vehicle roster, e.g. "aAC:bBD:cCA" (label, origin, destination)
    #[arg(long, conflicts_with = "count")]
    vehicles: Option<String>,

    /// Number of vehicles with random routes
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Random seed for reproducible rosters
    #[arg(short, long)]
    seed: Option<u64>,

    /// Vehicles allowed inside the intersection at once (1-7)
    #[arg(long)]
    capacity: Option<usize>,

    /// How vehicles are scheduled
    #[arg(short, long, value_enum, default_value_t = Backend::Threaded)]
    backend: Backend,

    /// Pause after every drawn unit step, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Do not draw the map
    #[arg(long)]
    no_render: bool,

    /// Enable verbose logging for per-move progress
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Backend {
    /// One thread per vehicle
    Threaded,
    /// Single thread, fixed order, reproducible
    Sequential,
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load_from_file(path)?,
        None => SimulationConfig::default(),
    };

    if let Some(roster) = &args.vehicles {
        config.vehicles = VehiclesConfig::from_roster(roster.clone());
    } else if let Some(count) = args.count {
        config.vehicles = VehiclesConfig::random(count);
    } else if args.config.is_none() {
        config.vehicles = VehiclesConfig::random(4);
    }
    if args.seed.is_some() {
        config.random.seed = args.seed;
    }
    if let Some(capacity) = args.capacity {
        config.intersection.capacity = capacity;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.intersection.step_delay_ms = delay_ms;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();
    info!("Starting crossroads simulation");

    let config = load_config(&args)?;
    let roster = config.roster()?;
    info!(
        "Roster: {} ({} vehicles), critical area capacity {}",
        format_roster(&roster),
        roster.len(),
        config.intersection.capacity
    );
    if let Some(seed) = config.seed_in_use() {
        info!("Random Seed: {}", seed);
    }

    let mut ctx = Crossroads::new(roster.len(), config.intersection.capacity)?;
    if !args.no_render {
        ctx = ctx.with_observer(TerminalRenderer::stdout(config.intersection.step_delay()));
    }

    let mut backend = match args.backend {
        Backend::Threaded => ComputeBackend::new_threaded(),
        Backend::Sequential => ComputeBackend::new_sequential(),
    };
    info!("Compute backend: {}", backend.get_name());

    let report = backend.run(&ctx, build_vehicles(&roster))?;

    info!("Simulation completed!");
    info!("Unit steps: {}", report.steps);
    info!("Total time: {:.3}s", report.elapsed.as_secs_f64());
    info!(
        "Waits: {} on occupied cells, {} on a full intersection (peak occupancy {})",
        report.total_cell_blocked(),
        report.total_gate_blocked(),
        report.peak_critical_occupancy
    );
    if report.elapsed > Duration::ZERO && report.steps > 0 {
        info!(
            "Average step: {:.3}ms",
            report.elapsed.as_secs_f64() * 1000.0 / report.steps as f64
        );
    }

    Ok(())
}
