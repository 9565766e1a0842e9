#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route-risk scoring and incident proximity queries from the command line.
//!
//! ```text
//! saferoute score   --incidents incidents.csv --routes routes.json [--buffer 180] [--geojson]
//! saferoute radius  --incidents incidents.csv --lat 43.65 --lng -79.38 [--radius 500]
//! saferoute nearest --incidents incidents.csv --lat 43.65 --lng -79.38 [--k 10]
//! saferoute bounds  --incidents incidents.csv --bbox=-79.4,43.64,-79.37,43.66
//! saferoute stats   --incidents incidents.csv
//! ```
//!
//! Results are written to stdout as JSON. `SAFEROUTE_BUFFER_M` and
//! `SAFEROUTE_UTM_ZONE` override the default buffer and planar frame.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use saferoute_cli::{Settings, check_buffer, load_incidents, load_routes};
use saferoute_incident::IncidentFilter;
use saferoute_incident_models::LonLat;
use saferoute_route::geojson::{incident_feature_collection, route_feature_collection};
use saferoute_spatial::{GeoBounds, IncidentIndex, IncidentMatch, build_index};

#[derive(Parser)]
#[command(
    name = "saferoute",
    about = "Score walking routes against historical incident density"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexArgs {
    /// Incident CSV with `lon,lat,category,occurred_at` columns
    #[arg(long)]
    incidents: PathBuf,
    /// Only index incidents of this exact category
    #[arg(long)]
    category: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score and compare route candidates
    Score {
        #[command(flatten)]
        index: IndexArgs,
        /// JSON array of route candidates
        #[arg(long)]
        routes: PathBuf,
        /// Corridor half-width in metres (50-500)
        #[arg(long)]
        buffer: Option<f64>,
        /// Emit a `GeoJSON` feature collection instead of the analysis
        #[arg(long)]
        geojson: bool,
    },
    /// Incidents within a radius of a point
    Radius {
        #[command(flatten)]
        index: IndexArgs,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Radius in metres
        #[arg(long, default_value = "500")]
        radius: f64,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
        /// Emit `GeoJSON` points
        #[arg(long)]
        geojson: bool,
    },
    /// The k incidents closest to a point
    Nearest {
        #[command(flatten)]
        index: IndexArgs,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, default_value = "10")]
        k: usize,
        /// Emit `GeoJSON` points
        #[arg(long)]
        geojson: bool,
    },
    /// Incidents inside a `min_lon,min_lat,max_lon,max_lat` box
    Bounds {
        #[command(flatten)]
        index: IndexArgs,
        #[arg(long, allow_hyphen_values = true)]
        bbox: String,
    },
    /// Index summary
    Stats {
        #[command(flatten)]
        index: IndexArgs,
    },
}

fn build(args: &IndexArgs, settings: &Settings) -> Result<IncidentIndex, Box<dyn std::error::Error>> {
    let incidents = load_incidents(&args.incidents)?;
    let index = build_index(incidents, Utc::now(), Arc::new(settings.projector))?;

    Ok(match &args.category {
        Some(category) => index.filtered(&IncidentFilter::category(category.clone())),
        None => index,
    })
}

fn print_matches(matches: &[IncidentMatch], geojson: bool) -> Result<(), serde_json::Error> {
    let out = if geojson {
        serde_json::to_string_pretty(&incident_feature_collection(matches))?
    } else {
        serde_json::to_string_pretty(matches)?
    };
    println!("{out}");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Score {
            index,
            routes,
            buffer,
            geojson,
        } => {
            let buffer = check_buffer(buffer.unwrap_or(settings.buffer_meters))?;
            let index = build(&index, &settings)?;
            let candidates = load_routes(&routes)?;
            let analysis = saferoute_route::analyze_routes(&index, &candidates, buffer);

            let out = if geojson {
                serde_json::to_string_pretty(&route_feature_collection(&analysis.routes))?
            } else {
                serde_json::to_string_pretty(&analysis)?
            };
            println!("{out}");

            if let Some(comparison) = analysis.comparison.as_compared() {
                log::info!("{}", comparison.recommendation.summary());
            }
        }
        Commands::Radius {
            index,
            lat,
            lng,
            radius,
            limit,
            geojson,
        } => {
            let index = build(&index, &settings)?;
            let matches = index.within_radius(LonLat::new(lng, lat), radius, limit)?;
            print_matches(&matches, geojson)?;
        }
        Commands::Nearest {
            index,
            lat,
            lng,
            k,
            geojson,
        } => {
            let index = build(&index, &settings)?;
            let matches = index.nearest(LonLat::new(lng, lat), k)?;
            print_matches(&matches, geojson)?;
        }
        Commands::Bounds { index, bbox } => {
            let bounds: GeoBounds = bbox.parse()?;
            let index = build(&index, &settings)?;
            let incidents: Vec<_> = index
                .within_bounds(bounds)?
                .into_iter()
                .filter_map(|position| index.get(position).map(|(incident, _)| incident))
                .collect();
            println!("{}", serde_json::to_string_pretty(&incidents)?);
        }
        Commands::Stats { index } => {
            let index = build(&index, &settings)?;
            println!("{}", serde_json::to_string_pretty(&index.stats())?);
        }
    }

    Ok(())
}
