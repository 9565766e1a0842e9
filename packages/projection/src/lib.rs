#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic to planar coordinate projection.
//!
//! Distances, buffers and route lengths are all computed in metres on a
//! single planar frame chosen for the service region. The default frame is
//! UTM zone 17 North (EPSG:32617), which covers Toronto. The transform
//! itself is delegated to PROJ through the `proj` crate.

mod utm;

use saferoute_incident_models::LonLat;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

pub use utm::UtmProjector;

/// Errors raised while converting between geographic and planar coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// One of the input components was NaN or infinite.
    #[error("coordinate ({x}, {y}) is not finite")]
    NonFinite {
        /// First component (longitude or easting).
        x: f64,
        /// Second component (latitude or northing).
        y: f64,
    },

    /// The coordinate lies outside the frame's region of validity.
    #[error("coordinate (lon {lon}, lat {lat}) is outside UTM zone {zone}{hemisphere}")]
    OutOfDomain {
        /// Longitude in degrees.
        lon: f64,
        /// Latitude in degrees.
        lat: f64,
        /// Zone number of the frame.
        zone: u8,
        /// Hemisphere of the frame.
        hemisphere: Hemisphere,
    },

    /// The requested UTM zone number does not exist.
    #[error("invalid UTM zone {zone}: expected 1-60")]
    InvalidZone {
        /// The rejected zone number.
        zone: u8,
    },

    /// PROJ could not build the transform for a frame.
    #[error("failed to create transform for EPSG:{epsg}: {message}")]
    Setup {
        /// Target frame.
        epsg: u32,
        /// PROJ's description of the failure.
        message: String,
    },

    /// PROJ rejected a coordinate.
    #[error("failed to transform ({x}, {y}): {message}")]
    Transform {
        /// First input component.
        x: f64,
        /// Second input component.
        y: f64,
        /// PROJ's description of the failure.
        message: String,
    },
}

/// UTM hemisphere; selects the false northing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Hemisphere {
    /// False northing 0 m.
    #[default]
    #[serde(rename = "N")]
    #[strum(serialize = "N")]
    North,
    /// False northing 10 000 000 m.
    #[serde(rename = "S")]
    #[strum(serialize = "S")]
    South,
}

/// Converts between geographic coordinates and a fixed planar metric frame.
///
/// Implementations must be pure: the same input always projects to the same
/// output, so a projector can be shared freely between threads.
pub trait Projector: Send + Sync + std::fmt::Debug {
    /// Projects a geographic coordinate to planar `[x, y]` metres.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate is not finite or falls outside
    /// the frame's region of validity.
    fn to_planar(&self, coord: LonLat) -> Result<[f64; 2], ProjectionError>;

    /// Converts planar `[x, y]` metres back to a geographic coordinate.
    ///
    /// # Errors
    ///
    /// Returns an error if the point is not finite.
    fn to_geographic(&self, point: [f64; 2]) -> Result<LonLat, ProjectionError>;

    /// Projects a sequence of coordinates, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the first coordinate that fails to project.
    fn to_planar_all(&self, coords: &[LonLat]) -> Result<Vec<[f64; 2]>, ProjectionError> {
        coords.iter().map(|c| self.to_planar(*c)).collect()
    }
}
