#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident record types and the category severity table.
//!
//! Incidents arrive here already cleaned: every record has a location, a
//! canonical category string, and a timestamp. Records with missing fields
//! are dropped upstream before they reach the index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Severity assigned to any category that is not in [`IncidentCategory`].
pub const DEFAULT_SEVERITY: f64 = 0.5;

/// A geographic coordinate in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    /// Longitude in degrees, east positive.
    pub lon: f64,
    /// Latitude in degrees, north positive.
    pub lat: f64,
}

impl LonLat {
    /// Creates a coordinate from longitude and latitude, in that order.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Returns `true` if both components are finite numbers.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl From<(f64, f64)> for LonLat {
    fn from((lon, lat): (f64, f64)) -> Self {
        Self { lon, lat }
    }
}

/// Categories with a known severity.
///
/// The string forms are the canonical category names produced by the
/// upstream cleaning step. Parsing is an exact, case-sensitive match:
/// `"assault"` and `"Theft Over"` do not parse and fall back to
/// [`DEFAULT_SEVERITY`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum IncidentCategory {
    /// Physical attack on a person
    #[serde(rename = "Assault")]
    #[strum(serialize = "Assault")]
    Assault,
    /// Taking property by force or threat
    #[serde(rename = "Robbery")]
    #[strum(serialize = "Robbery")]
    Robbery,
    /// Unlawful entry into a building
    #[serde(rename = "Break and Enter")]
    #[strum(serialize = "Break and Enter")]
    BreakAndEnter,
    /// Unlawful taking of property without force
    #[serde(rename = "Theft")]
    #[strum(serialize = "Theft")]
    Theft,
    /// Theft of a motor vehicle
    #[serde(rename = "Auto Theft")]
    #[strum(serialize = "Auto Theft")]
    AutoTheft,
}

impl IncidentCategory {
    /// Returns the severity of this category in `[0.0, 1.0]`.
    #[must_use]
    pub const fn severity(self) -> f64 {
        match self {
            Self::Assault => 1.0,
            Self::Robbery => 0.9,
            Self::BreakAndEnter => 0.7,
            Self::Theft | Self::AutoTheft => 0.6,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Assault,
            Self::Robbery,
            Self::BreakAndEnter,
            Self::Theft,
            Self::AutoTheft,
        ]
    }
}

/// Looks up the severity for a raw category string.
///
/// Unknown categories are not an error; they get [`DEFAULT_SEVERITY`].
#[must_use]
pub fn severity_for(category: &str) -> f64 {
    category
        .parse::<IncidentCategory>()
        .map_or(DEFAULT_SEVERITY, IncidentCategory::severity)
}

/// A single recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Where the incident happened.
    pub location: LonLat,
    /// Canonical category name (e.g. `"Assault"`).
    pub category: String,
    /// When the incident occurred.
    pub occurred_at: DateTime<Utc>,
}

impl Incident {
    /// Creates an incident from its parts.
    #[must_use]
    pub fn new(location: LonLat, category: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            location,
            category: category.into(),
            occurred_at,
        }
    }

    /// Returns the severity of this incident's category.
    #[must_use]
    pub fn severity(&self) -> f64 {
        severity_for(&self.category)
    }
}
