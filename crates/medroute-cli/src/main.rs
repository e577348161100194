//! medroute - plan medical-delivery drone flights from a snapshot directory

mod config;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{ArgAction, Parser, Subcommand};
use medroute_core::drone_query;
use medroute_core::geometry;
use medroute_core::{
    batch_date, export_as_geojson_with_config, plan_route_with_config, query_available_drone_ids,
    replay_frames, Departure, JsonDirSnapshot, MedDispatchRec, Position, QueryCondition, Snapshot,
    SnapshotProvider,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding drones.json, service-points.json and friends
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Node-expansion limit for each A* leg
    #[arg(long, global = true)]
    max_expansions: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Euclidean distance between two positions
    Distance {
        #[arg(allow_negative_numbers = true)]
        lng1: f64,
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lng2: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
    },
    /// Whether two positions are less than one step apart
    CloseTo {
        #[arg(allow_negative_numbers = true)]
        lng1: f64,
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lng2: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
    },
    /// One step from a position along a 22.5 degree heading
    NextPosition {
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        angle: f64,
    },
    /// Whether a position lies in a named restricted region
    InRegion {
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        region: String,
    },
    /// Drones able to carry a whole batch
    Available { batch: PathBuf },
    /// Plan flights for a batch
    Plan { batch: PathBuf },
    /// Plan a batch and render it as GeoJSON
    Geojson { batch: PathBuf },
    /// Roster queries
    Drones {
        #[command(subcommand)]
        query: DroneCommand,
    },
    /// Telemetry frames a simulator would emit for a planned batch
    Replay {
        batch: PathBuf,
        /// Simulated seconds between frames
        #[arg(long, default_value_t = 1)]
        tick_secs: u32,
        /// Departure date (defaults to the batch date, then today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Departure time
        #[arg(long, default_value = "09:00:00")]
        time: NaiveTime,
    },
}

#[derive(Subcommand, Debug)]
enum DroneCommand {
    /// Ids of drones whose cooling flag matches
    Cooling {
        #[arg(action = ArgAction::Set)]
        state: bool,
    },
    /// Full record of one drone
    Details { id: String },
    /// Ids of drones whose attribute equals a value
    QueryAsPath { attribute: String, value: String },
    /// Ids of drones matching every condition in a JSON file
    Query { conditions: PathBuf },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_snapshot(dir: &Path) -> Result<Snapshot> {
    JsonDirSnapshot::new(dir)
        .snapshot()
        .with_context(|| format!("loading snapshot from {}", dir.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("medroute=info".parse()?))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(dir) = cli.snapshot {
        config.snapshot_dir = dir;
    }
    if cli.max_expansions.is_some() {
        config.max_expansions = cli.max_expansions;
    }
    let planner = config.planner();

    match cli.command {
        Command::Distance { lng1, lat1, lng2, lat2 } => {
            let d = geometry::distance(&Position::new(lng1, lat1), &Position::new(lng2, lat2))?;
            print_json(&d)
        }
        Command::CloseTo { lng1, lat1, lng2, lat2 } => {
            let close =
                geometry::is_close_to(&Position::new(lng1, lat1), &Position::new(lng2, lat2))?;
            print_json(&close)
        }
        Command::NextPosition { lng, lat, angle } => {
            print_json(&geometry::next_position(&Position::new(lng, lat), angle)?)
        }
        Command::InRegion { lng, lat, region } => {
            let snapshot = load_snapshot(&config.snapshot_dir)?;
            let region = snapshot
                .region(&region)
                .ok_or_else(|| anyhow!("no restricted region named '{}'", region))?;
            print_json(&geometry::is_in_region(&Position::new(lng, lat), region)?)
        }
        Command::Available { batch } => {
            let batch: Vec<MedDispatchRec> = read_json(&batch)?;
            let snapshot = load_snapshot(&config.snapshot_dir)?;
            print_json(&query_available_drone_ids(&batch, &snapshot)?)
        }
        Command::Plan { batch } => {
            let batch: Vec<MedDispatchRec> = read_json(&batch)?;
            let snapshot = load_snapshot(&config.snapshot_dir)?;
            print_json(&plan_route_with_config(&batch, &snapshot, &planner)?)
        }
        Command::Geojson { batch } => {
            let batch: Vec<MedDispatchRec> = read_json(&batch)?;
            let snapshot = load_snapshot(&config.snapshot_dir)?;
            print_json(&export_as_geojson_with_config(&batch, &snapshot, &planner)?)
        }
        Command::Drones { query } => {
            let snapshot = load_snapshot(&config.snapshot_dir)?;
            let drones = &snapshot.drones;
            match query {
                DroneCommand::Cooling { state } => {
                    print_json(&drone_query::drones_with_cooling(drones, state))
                }
                DroneCommand::Details { id } => {
                    print_json(drone_query::drone_details(drones, &id)?)
                }
                DroneCommand::QueryAsPath { attribute, value } => {
                    print_json(&drone_query::query_as_path(drones, &attribute, &value)?)
                }
                DroneCommand::Query { conditions } => {
                    let conditions: Vec<QueryCondition> = read_json(&conditions)?;
                    print_json(&drone_query::query(drones, &conditions)?)
                }
            }
        }
        Command::Replay {
            batch,
            tick_secs,
            date,
            time,
        } => {
            let batch: Vec<MedDispatchRec> = read_json(&batch)?;
            let snapshot = load_snapshot(&config.snapshot_dir)?;
            let plan = plan_route_with_config(&batch, &snapshot, &planner)?;
            let date = match date {
                Some(date) => date,
                None => batch_date(&batch)?
                    .unwrap_or_else(|| chrono::Local::now().date_naive()),
            };

            let mut frames = Vec::new();
            for path in &plan.drone_paths {
                let departure = Departure::for_path(path, &snapshot, date, time)?;
                frames.extend(replay_frames(path, &departure, tick_secs));
            }
            tracing::info!("Replayed {} flights into {} frames", plan.drone_paths.len(), frames.len());
            print_json(&frames)
        }
    }
}
