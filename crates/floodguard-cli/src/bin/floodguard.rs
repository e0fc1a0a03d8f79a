//! floodguard - flood risk assessment, evacuation targets and disaster alerts.
//!
//! Usage:
//!   floodguard assess --lat 26.1445 --lon 91.7362
//!   floodguard alerts refresh
//!   floodguard alerts nearby --lat 26.1445 --lon 91.7362

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use floodguard_cli::{init_logging, load_floods, BfeAnswer, CliConfig, RefreshSummary};
use floodguard_core::{nearby_alerts, AlertCollector, Coordinate, EvacuationPlanner, FloodIndex};
use floodguard_services::{AlertStore, Services};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(author, version, about = "Flood risk assessment and evacuation routing")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
struct Location {
    /// Latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,
}

impl Location {
    fn coordinate(self) -> Result<Coordinate> {
        Ok(Coordinate::checked(self.lat, self.lon)?)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full site assessment: risk, POIs, low areas and evacuation targets
    Assess(Location),

    /// Ring samples at or below the local flood elevation
    LowAreas(Location),

    /// Nearest shelter by category priority, then distance
    Shelter {
        #[command(flatten)]
        at: Location,

        /// Search radius in metres (default from planner rules)
        #[arg(long)]
        radius: Option<f64>,
    },

    /// Nearest point noticeably higher than the baseline
    HighGround {
        #[command(flatten)]
        at: Location,

        /// Baseline elevation in metres (default: none)
        #[arg(long, allow_negative_numbers = true)]
        baseline: Option<f64>,
    },

    /// Base flood elevation at a point
    Bfe {
        #[command(flatten)]
        at: Location,

        /// Do not fall back to the nearest flood zone
        #[arg(long)]
        no_fallback: bool,
    },

    /// Disaster alert feed
    #[command(subcommand)]
    Alerts(AlertsCommand),
}

#[derive(Subcommand, Debug)]
enum AlertsCommand {
    /// Fetch, deduplicate and store the current feed
    Refresh,

    /// Stored alerts ordered by distance
    Nearby(Location),
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}

fn main() -> Result<()> {
    let config = CliConfig::from_env();
    init_logging(config.log_format).context("failed to initialise logging")?;

    let cli = Cli::parse();
    let services = Services::new(&config.services).context("failed to build HTTP clients")?;

    match cli.command {
        Command::Assess(at) => {
            let at = at.coordinate()?;
            let floods = load_floods(&config.bfe_path);
            let planner = EvacuationPlanner::new(services.collaborators(), &floods);
            print_json(&planner.assess(at))?;
        }
        Command::LowAreas(at) => {
            let at = at.coordinate()?;
            let floods = load_floods(&config.bfe_path);
            let planner = EvacuationPlanner::new(services.collaborators(), &floods);
            print_json(&planner.low_areas(at))?;
        }
        Command::Shelter { at, radius } => {
            let at = at.coordinate()?;
            let floods = FloodIndex::new();
            let planner = EvacuationPlanner::new(services.collaborators(), &floods);
            let radius = radius.unwrap_or(planner.planner_rules().shelter_search_radius_m);
            print_json(&planner.nearest_shelter(at, radius))?;
        }
        Command::HighGround { at, baseline } => {
            let at = at.coordinate()?;
            let floods = FloodIndex::new();
            let planner = EvacuationPlanner::new(services.collaborators(), &floods);
            print_json(&planner.high_ground(at, baseline))?;
        }
        Command::Bfe { at, no_fallback } => {
            let at = at.coordinate()?;
            let floods = load_floods(&config.bfe_path);
            print_json(&BfeAnswer::lookup(&floods, at, !no_fallback))?;
        }
        Command::Alerts(AlertsCommand::Refresh) => {
            let batch = AlertCollector::new(&services.feed)
                .collect()
                .context("failed to read the alert feed")?;
            let store = AlertStore::new(&config.alerts_path);
            store.save(&batch.alerts).with_context(|| {
                format!("failed to save alerts to {}", config.alerts_path.display())
            })?;
            print_json(&RefreshSummary::new(store.path(), batch))?;
        }
        Command::Alerts(AlertsCommand::Nearby(at)) => {
            let at = at.coordinate()?;
            let alerts = AlertStore::new(&config.alerts_path)
                .load()
                .context("failed to read stored alerts")?;
            print_json(&nearby_alerts(alerts, at))?;
        }
    }

    Ok(())
}
