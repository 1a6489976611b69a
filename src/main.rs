//! route-optimizer CLI
//!
//! Reads a technician's jobs in their current order and prints the
//! suggested order with its savings.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use route_optimizer::config::EngineConfig;
use route_optimizer::format::{format_distance, format_duration};
use route_optimizer::optimizer::{Optimization, Stop, optimize_route};
use route_optimizer::solver::TourClosure;
use route_optimizer::traits::{Coordinates, Job, Location};

#[derive(Parser)]
#[command(name = "route-optimizer", about = "Order a technician's jobs to minimize travel")]
struct Cli {
    /// JSON file with the jobs in their current order
    jobs: PathBuf,
    /// Starting point as `lat,lng`
    #[arg(long, value_parser = parse_coordinates)]
    start: Option<Coordinates>,
    /// Overrides ROUTE_TOUR_CLOSURE
    #[arg(long, value_enum)]
    closure: Option<ClosureArg>,
    /// Print a readable summary instead of JSON
    #[arg(long)]
    summary: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ClosureArg {
    Open,
    Closed,
}

impl From<ClosureArg> for TourClosure {
    fn from(arg: ClosureArg) -> Self {
        match arg {
            ClosureArg::Open => TourClosure::Open,
            ClosureArg::Closed => TourClosure::Closed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobInput {
    id: String,
    location: Location,
    #[serde(default)]
    scheduled_start: Option<DateTime<Utc>>,
    #[serde(default)]
    scheduled_end: Option<DateTime<Utc>>,
}

impl Job for JobInput {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn scheduled_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.scheduled_start.zip(self.scheduled_end)
    }
}

fn parse_coordinates(value: &str) -> Result<Coordinates, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lng, got {value:?}"))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude {lat:?}"))?;
    let lng: f64 = lng.trim().parse().map_err(|_| format!("invalid longitude {lng:?}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(format!("coordinates out of range: {value}"));
    }
    Ok(Coordinates::new(lat, lng))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,route_optimizer=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env()?;
    if let Some(closure) = cli.closure {
        config.roster.optimize.closure = closure.into();
    }

    let raw = fs::read_to_string(&cli.jobs).with_context(|| format!("cannot read {}", cli.jobs.display()))?;
    let jobs: Vec<JobInput> = serde_json::from_str(&raw).context("job file is not a valid job list")?;
    let provider = config.build_provider()?;

    info!(jobs = jobs.len(), "optimizing route");
    let start = cli.start.map(Location::Coordinates);
    let outcome = optimize_route(&jobs, start.as_ref(), &provider, &config.roster.optimize);

    if cli.summary {
        print_summary(&outcome);
    } else {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    Ok(())
}

fn print_summary(outcome: &Optimization<String>) {
    match outcome {
        Optimization::Optimized(_) => println!("Optimized route"),
        Optimization::Trivial(_) => println!("Nothing to optimize"),
        Optimization::Degraded { reason, .. } => println!("Original order kept: {:?}", reason),
    }

    let result = outcome.result();
    for (position, stop) in result.route.iter().enumerate() {
        let name = match &stop.stop {
            Stop::Start => "start",
            Stop::Job(id) => id.as_str(),
        };
        match stop.from_previous {
            Some(leg) => println!(
                "{:>3}. {}  (+{}, {})",
                position + 1,
                name,
                format_duration(leg.duration_secs),
                format_distance(leg.distance_meters)
            ),
            None => println!("{:>3}. {}", position + 1, name),
        }
    }

    println!(
        "Total: {}, {}",
        format_duration(result.total_travel_time),
        format_distance(result.total_distance)
    );
    println!(
        "Saves {} seconds ({}%)",
        result.savings.time_seconds, result.savings.percent_improvement
    );
}
