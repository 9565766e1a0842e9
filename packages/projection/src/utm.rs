//! WGS84 Universal Transverse Mercator backed by PROJ.
//!
//! `proj::Proj` handles are not `Sync`, so each thread keeps its own
//! transforms, created on first use and keyed by EPSG code and direction.

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use proj::Proj;
use saferoute_incident_models::LonLat;
use serde::{Deserialize, Serialize};

use crate::{Hemisphere, ProjectionError, Projector};

const WGS84_CRS: &str = "EPSG:4326";

/// Maximum longitude offset from the central meridian accepted for input.
const MAX_MERIDIAN_OFFSET_DEG: f64 = 9.0;
const MIN_LATITUDE_DEG: f64 = -80.0;
const MAX_LATITUDE_DEG: f64 = 84.0;

/// Toronto's zone.
const DEFAULT_ZONE: u8 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    ToPlanar,
    ToGeographic,
}

thread_local! {
    static TRANSFORMS: RefCell<HashMap<(u32, Direction), Proj>> = RefCell::new(HashMap::new());
}

/// Runs `convert` against this thread's transform for `epsg`, creating it
/// on first use. Both ends use `lon, lat` / `easting, northing` order.
fn with_transform<T>(
    epsg: u32,
    direction: Direction,
    convert: impl FnOnce(&Proj) -> Result<T, ProjectionError>,
) -> Result<T, ProjectionError> {
    TRANSFORMS.with(|cell| {
        let mut cache = cell.borrow_mut();
        let proj = match cache.entry((epsg, direction)) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let planar = format!("EPSG:{epsg}");
                let (from, to) = match direction {
                    Direction::ToPlanar => (WGS84_CRS, planar.as_str()),
                    Direction::ToGeographic => (planar.as_str(), WGS84_CRS),
                };
                let proj = Proj::new_known_crs(from, to, None).map_err(|e| {
                    ProjectionError::Setup {
                        epsg,
                        message: e.to_string(),
                    }
                })?;
                entry.insert(proj)
            }
        };
        convert(proj)
    })
}

fn convert_pair(proj: &Proj, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
    let (a, b) = proj
        .convert((x, y))
        .map_err(|e| ProjectionError::Transform {
            x,
            y,
            message: e.to_string(),
        })?;
    if a.is_finite() && b.is_finite() {
        Ok((a, b))
    } else {
        Err(ProjectionError::NonFinite { x: a, y: b })
    }
}

/// Serializable description of a [`UtmProjector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtmZone {
    /// Zone number, 1-60.
    pub zone: u8,
    /// Hemisphere.
    pub hemisphere: Hemisphere,
}

/// A single UTM zone on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmProjector {
    zone: u8,
    hemisphere: Hemisphere,
    central_meridian: f64,
}

impl Default for UtmProjector {
    fn default() -> Self {
        Self::build(DEFAULT_ZONE, Hemisphere::North)
    }
}

impl UtmProjector {
    /// Creates a projector for the given zone.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::InvalidZone`] if `zone` is not in 1-60.
    pub fn new(zone: u8, hemisphere: Hemisphere) -> Result<Self, ProjectionError> {
        if !(1..=60).contains(&zone) {
            return Err(ProjectionError::InvalidZone { zone });
        }
        Ok(Self::build(zone, hemisphere))
    }

    /// Creates a projector for the zone containing `lon`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::NonFinite`] if `lon` is not finite.
    pub fn for_longitude(lon: f64, hemisphere: Hemisphere) -> Result<Self, ProjectionError> {
        if !lon.is_finite() {
            return Err(ProjectionError::NonFinite { x: lon, y: 0.0 });
        }
        let wrapped = (lon + 180.0).rem_euclid(360.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let zone = ((wrapped / 6.0).floor() as u8 + 1).min(60);
        Self::new(zone, hemisphere)
    }

    fn build(zone: u8, hemisphere: Hemisphere) -> Self {
        Self {
            zone,
            hemisphere,
            central_meridian: f64::from(zone).mul_add(6.0, -183.0),
        }
    }

    /// Zone number, 1-60.
    #[must_use]
    pub const fn zone(&self) -> u8 {
        self.zone
    }

    /// Hemisphere of this zone.
    #[must_use]
    pub const fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    /// Central meridian in degrees.
    #[must_use]
    pub const fn central_meridian(&self) -> f64 {
        self.central_meridian
    }

    /// EPSG code of this frame (`326zz` north, `327zz` south).
    #[must_use]
    pub fn epsg(&self) -> u32 {
        let base = match self.hemisphere {
            Hemisphere::North => 32600,
            Hemisphere::South => 32700,
        };
        base + u32::from(self.zone)
    }

    /// Zone description for configuration output.
    #[must_use]
    pub const fn describe(&self) -> UtmZone {
        UtmZone {
            zone: self.zone,
            hemisphere: self.hemisphere,
        }
    }

    fn check_domain(&self, coord: LonLat) -> Result<(), ProjectionError> {
        if !coord.is_finite() {
            return Err(ProjectionError::NonFinite {
                x: coord.lon,
                y: coord.lat,
            });
        }
        let offset = coord.lon - self.central_meridian;
        if !(MIN_LATITUDE_DEG..=MAX_LATITUDE_DEG).contains(&coord.lat)
            || offset.abs() > MAX_MERIDIAN_OFFSET_DEG
        {
            return Err(ProjectionError::OutOfDomain {
                lon: coord.lon,
                lat: coord.lat,
                zone: self.zone,
                hemisphere: self.hemisphere,
            });
        }
        Ok(())
    }
}

impl TryFrom<UtmZone> for UtmProjector {
    type Error = ProjectionError;

    fn try_from(value: UtmZone) -> Result<Self, Self::Error> {
        Self::new(value.zone, value.hemisphere)
    }
}

impl Projector for UtmProjector {
    fn to_planar(&self, coord: LonLat) -> Result<[f64; 2], ProjectionError> {
        self.check_domain(coord)?;
        let (x, y) = with_transform(self.epsg(), Direction::ToPlanar, |proj| {
            convert_pair(proj, coord.lon, coord.lat)
        })?;
        Ok([x, y])
    }

    fn to_geographic(&self, point: [f64; 2]) -> Result<LonLat, ProjectionError> {
        let [x, y] = point;
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::NonFinite { x, y });
        }
        let (lon, lat) = with_transform(self.epsg(), Direction::ToGeographic, |proj| {
            convert_pair(proj, x, y)
        })?;
        Ok(LonLat { lon, lat })
    }
}
