#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Input loading and settings for the `saferoute` binary.
//!
//! Incidents arrive as an already-cleaned CSV with the columns
//! `lon,lat,category,occurred_at` (RFC 3339 timestamps). Route candidates
//! arrive as a JSON array in the shape of
//! [`saferoute_route_models::RouteCandidate`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use saferoute_incident_models::{Incident, LonLat};
use saferoute_projection::{Hemisphere, ProjectionError, UtmProjector};
use saferoute_route::DEFAULT_BUFFER_METERS;
use saferoute_route_models::RouteCandidate;
use saferoute_spatial::{BoundsParseError, IndexError};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable overriding the corridor buffer.
pub const BUFFER_ENV: &str = "SAFEROUTE_BUFFER_M";

/// Environment variable selecting the UTM zone, e.g. `17N` or `56S`.
pub const UTM_ZONE_ENV: &str = "SAFEROUTE_UTM_ZONE";

/// Smallest buffer the CLI accepts, in metres.
pub const MIN_BUFFER_METERS: f64 = 50.0;

/// Largest buffer the CLI accepts, in metres.
pub const MAX_BUFFER_METERS: f64 = 500.0;

/// Errors surfaced by the command-line driver.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be opened.
    #[error("failed to open {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The incident CSV is malformed.
    #[error("invalid incident CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The routes file is not a valid candidate array, or output failed to
    /// serialize.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An `occurred_at` value is not RFC 3339.
    #[error("row {row}: invalid timestamp {value:?}: {source}")]
    Timestamp {
        /// One-based data row number.
        row: usize,
        /// The offending value.
        value: String,
        /// Underlying parse failure.
        #[source]
        source: chrono::ParseError,
    },

    /// `SAFEROUTE_BUFFER_M` is not a number.
    #[error("invalid buffer {0:?}, expected metres e.g. 180")]
    Buffer(String),

    /// The requested buffer is outside the accepted range.
    #[error("buffer {0} m is outside the accepted 50-500 m range")]
    BufferOutOfRange(f64),

    /// `SAFEROUTE_UTM_ZONE` could not be parsed.
    #[error("invalid UTM zone {0:?}, expected e.g. 17N")]
    Zone(String),

    /// The projection could not be built.
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// Indexing or an index query failed.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// A `--bbox` argument is malformed.
    #[error(transparent)]
    Bounds(#[from] BoundsParseError),
}

#[derive(Debug, Deserialize)]
struct IncidentRow {
    lon: f64,
    lat: f64,
    category: String,
    occurred_at: String,
}

fn open(path: &Path) -> Result<BufReader<File>, CliError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Parses incidents from CSV.
///
/// # Errors
///
/// * [`CliError::Csv`] for a malformed row
/// * [`CliError::Timestamp`] for a timestamp that is not RFC 3339
pub fn read_incidents(reader: impl Read) -> Result<Vec<Incident>, CliError> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut incidents = Vec::new();

    for (i, row) in csv.deserialize::<IncidentRow>().enumerate() {
        let row = row?;
        let occurred_at = DateTime::parse_from_rfc3339(&row.occurred_at)
            .map_err(|source| CliError::Timestamp {
                row: i + 1,
                value: row.occurred_at.clone(),
                source,
            })?
            .with_timezone(&Utc);
        incidents.push(Incident::new(
            LonLat::new(row.lon, row.lat),
            row.category,
            occurred_at,
        ));
    }

    Ok(incidents)
}

/// Reads the incident CSV at `path`.
///
/// # Errors
///
/// See [`read_incidents`]; also [`CliError::Io`] if the file cannot be
/// opened.
pub fn load_incidents(path: &Path) -> Result<Vec<Incident>, CliError> {
    let incidents = read_incidents(open(path)?)?;
    log::info!("Loaded {} incidents from {}", incidents.len(), path.display());
    Ok(incidents)
}

/// Reads the route candidate array at `path`.
///
/// # Errors
///
/// * [`CliError::Io`] if the file cannot be opened
/// * [`CliError::Json`] if it is not a candidate array
pub fn load_routes(path: &Path) -> Result<Vec<RouteCandidate>, CliError> {
    let routes: Vec<RouteCandidate> = serde_json::from_reader(open(path)?)?;
    log::info!("Loaded {} route candidates from {}", routes.len(), path.display());
    Ok(routes)
}

/// Parses a zone such as `17`, `17N` or `56S`. A bare number is northern.
#[must_use]
pub fn parse_zone(raw: &str) -> Option<(u8, Hemisphere)> {
    let raw = raw.trim();
    let (digits, hemisphere) = match raw.char_indices().last()? {
        (i, 'N' | 'n') => (&raw[..i], Hemisphere::North),
        (i, 'S' | 's') => (&raw[..i], Hemisphere::South),
        _ => (raw, Hemisphere::North),
    };
    Some((digits.parse().ok()?, hemisphere))
}

/// Settings that may come from the environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Default corridor half-width.
    pub buffer_meters: f64,
    /// Planar frame.
    pub projector: UtmProjector,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Settings::from_lookup`].
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`. Unset variables fall back to the
    /// defaults.
    ///
    /// # Errors
    ///
    /// * [`CliError::Buffer`] if the buffer variable is not a number
    /// * [`CliError::Zone`] if the zone variable is malformed
    /// * [`CliError::Projection`] if the zone number is out of range
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        let buffer_meters = match lookup(BUFFER_ENV) {
            Some(raw) => raw.trim().parse::<f64>().map_err(|_| CliError::Buffer(raw))?,
            None => DEFAULT_BUFFER_METERS,
        };

        let projector = match lookup(UTM_ZONE_ENV) {
            Some(raw) => {
                let (zone, hemisphere) = parse_zone(&raw).ok_or(CliError::Zone(raw))?;
                UtmProjector::new(zone, hemisphere)?
            }
            None => UtmProjector::default(),
        };

        Ok(Self {
            buffer_meters,
            projector,
        })
    }
}

/// Checks a buffer against the accepted range.
///
/// # Errors
///
/// Returns [`CliError::BufferOutOfRange`] outside `[50, 500]` metres.
pub fn check_buffer(buffer_meters: f64) -> Result<f64, CliError> {
    if (MIN_BUFFER_METERS..=MAX_BUFFER_METERS).contains(&buffer_meters) {
        Ok(buffer_meters)
    } else {
        Err(CliError::BufferOutOfRange(buffer_meters))
    }
}
