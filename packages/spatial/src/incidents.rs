//! Incident-level index: weighting, projection and geographic queries.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rstar::AABB;
use saferoute_incident::{IncidentFilter, WeightModel};
use saferoute_incident_models::{Incident, LonLat};
use saferoute_projection::Projector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{IndexError, PlanarBounds, SpatialIndex};

/// Samples per edge when projecting a geographic box outline.
const BOUNDS_OUTLINE_SAMPLES: u32 = 32;

/// Padding added to the projected outline envelope to cover the curvature
/// of parallels and meridians between samples.
const BOUNDS_ENVELOPE_PADDING_M: f64 = 5.0;

/// An incident returned by a proximity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentMatch {
    /// Position of the incident in the index.
    pub position: usize,
    /// The incident record.
    pub incident: Incident,
    /// Weight assigned at build time.
    pub weight: f64,
    /// Planar distance from the query center in metres.
    pub distance_meters: f64,
}

/// Summary of an index, for health reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Number of indexed incidents.
    pub incident_count: usize,
    /// Sum of all incident weights.
    pub total_weight: f64,
    /// Planar extent, `None` when empty.
    pub planar_bounds: Option<PlanarBounds>,
    /// The `now` the weights were computed against.
    pub built_at: DateTime<Utc>,
}

/// A longitude/latitude box, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoBounds {
    /// Western edge.
    pub min_lon: f64,
    /// Southern edge.
    pub min_lat: f64,
    /// Eastern edge.
    pub max_lon: f64,
    /// Northern edge.
    pub max_lat: f64,
}

impl GeoBounds {
    /// Returns `true` if `coord` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, coord: LonLat) -> bool {
        (self.min_lon..=self.max_lon).contains(&coord.lon)
            && (self.min_lat..=self.max_lat).contains(&coord.lat)
    }

    /// Returns `true` if every edge is finite and the box is not inverted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
            .iter()
            .all(|v| v.is_finite())
            && self.min_lon <= self.max_lon
            && self.min_lat <= self.max_lat
    }

    /// Points along the box outline, `samples` per edge.
    fn outline(&self, samples: u32) -> Vec<LonLat> {
        let step = 1.0 / f64::from(samples);
        let lerp = |a: f64, b: f64, t: f64| (b - a).mul_add(t, a);
        let mut points = Vec::with_capacity(samples as usize * 4);
        for i in 0..samples {
            let t = f64::from(i) * step;
            points.push(LonLat::new(lerp(self.min_lon, self.max_lon, t), self.min_lat));
            points.push(LonLat::new(self.max_lon, lerp(self.min_lat, self.max_lat, t)));
            points.push(LonLat::new(lerp(self.max_lon, self.min_lon, t), self.max_lat));
            points.push(LonLat::new(self.min_lon, lerp(self.max_lat, self.min_lat, t)));
        }
        points
    }
}

/// Error parsing a `minLon,minLat,maxLon,maxLat` string.
#[derive(Debug, Error)]
pub enum BoundsParseError {
    /// Wrong number of comma-separated fields.
    #[error("expected 4 comma-separated values, got {0}")]
    FieldCount(usize),

    /// A field was not a number.
    #[error("invalid number {value:?}: {source}")]
    Number {
        /// The offending field.
        value: String,
        /// Parse failure.
        #[source]
        source: std::num::ParseFloatError,
    },
}

impl FromStr for GeoBounds {
    type Err = BoundsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        if fields.len() != 4 {
            return Err(BoundsParseError::FieldCount(fields.len()));
        }
        let mut values = [0.0; 4];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = field.parse().map_err(|source| BoundsParseError::Number {
                value: (*field).to_string(),
                source,
            })?;
        }
        let [min_lon, min_lat, max_lon, max_lat] = values;
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }
}

/// Spatial index over weighted incidents, with geographic query helpers.
///
/// The incidents, their weights and their projected points are parallel
/// arrays; a query position indexes all three.
pub struct IncidentIndex {
    spatial: SpatialIndex,
    incidents: Vec<Incident>,
    projector: Arc<dyn Projector>,
    built_at: DateTime<Utc>,
}

impl std::fmt::Debug for IncidentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncidentIndex")
            .field("spatial", &self.spatial)
            .field("projector", &self.projector)
            .field("built_at", &self.built_at)
            .finish_non_exhaustive()
    }
}

/// Weighs, projects and indexes `incidents` with the default [`WeightModel`].
///
/// # Errors
///
/// Returns [`IndexError::IncidentProjection`] naming the first incident
/// whose location cannot be projected.
pub fn build_index(
    incidents: Vec<Incident>,
    now: DateTime<Utc>,
    projector: Arc<dyn Projector>,
) -> Result<IncidentIndex, IndexError> {
    IncidentIndex::build(incidents, now, projector, &WeightModel::default())
}

impl IncidentIndex {
    /// Weighs, projects and indexes `incidents`.
    ///
    /// # Errors
    ///
    /// * [`IndexError::WeightModel`] if `model` fails
    ///   [`WeightModel::validate`]
    /// * [`IndexError::IncidentProjection`] naming the first incident whose
    ///   location cannot be projected
    pub fn build(
        incidents: Vec<Incident>,
        now: DateTime<Utc>,
        projector: Arc<dyn Projector>,
        model: &WeightModel,
    ) -> Result<Self, IndexError> {
        model.validate()?;

        let mut points = Vec::with_capacity(incidents.len());
        for (position, incident) in incidents.iter().enumerate() {
            let point = projector
                .to_planar(incident.location)
                .map_err(|source| IndexError::IncidentProjection { position, source })?;
            points.push(point);
        }

        let weighted = model.weigh_all(incidents, now);
        let (incidents, weights): (Vec<Incident>, Vec<f64>) = weighted
            .into_iter()
            .map(|w| (w.incident, w.weight))
            .unzip();

        let spatial = SpatialIndex::build(points, weights);
        log::info!(
            "Built incident index: {} incidents, total weight {:.2}",
            spatial.len(),
            spatial.total_weight()
        );

        Ok(Self {
            spatial,
            incidents,
            projector,
            built_at: now,
        })
    }

    /// The underlying planar index.
    #[must_use]
    pub const fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// The projector used for every coordinate in this index.
    #[must_use]
    pub fn projector(&self) -> &dyn Projector {
        self.projector.as_ref()
    }

    /// Indexed incidents, in position order.
    #[must_use]
    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    /// Incident and weight at `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<(&Incident, f64)> {
        Some((self.incidents.get(position)?, self.spatial.weight(position)?))
    }

    /// Number of indexed incidents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    /// The `now` the weights were computed against.
    #[must_use]
    pub const fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Health summary.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            incident_count: self.len(),
            total_weight: self.spatial.total_weight(),
            planar_bounds: self.spatial.planar_bounds(),
            built_at: self.built_at,
        }
    }

    /// Incidents within `radius_meters` of `center`, nearest first, capped
    /// at `limit` results when given.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::QueryProjection`] if `center` cannot be
    /// projected.
    pub fn within_radius(
        &self,
        center: LonLat,
        radius_meters: f64,
        limit: Option<usize>,
    ) -> Result<Vec<IncidentMatch>, IndexError> {
        let planar = self.projector.to_planar(center)?;
        let mut hits = self.spatial.query_radius(planar, radius_meters);
        if let Some(limit) = limit {
            hits.truncate(limit);
        }
        Ok(self.to_matches(hits))
    }

    /// The `k` incidents closest to `center`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::QueryProjection`] if `center` cannot be
    /// projected.
    pub fn nearest(&self, center: LonLat, k: usize) -> Result<Vec<IncidentMatch>, IndexError> {
        let planar = self.projector.to_planar(center)?;
        Ok(self.to_matches(self.spatial.query_nearest(planar, k)))
    }

    /// Positions of incidents whose geographic location lies in `bounds`,
    /// in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::QueryProjection`] if the box outline cannot be
    /// projected.
    pub fn within_bounds(&self, bounds: GeoBounds) -> Result<Vec<usize>, IndexError> {
        if !bounds.is_valid() || self.is_empty() {
            return Ok(Vec::new());
        }

        let outline = self
            .projector
            .to_planar_all(&bounds.outline(BOUNDS_OUTLINE_SAMPLES))?;
        let envelope = AABB::from_points(outline.iter());
        let padded = AABB::from_corners(
            [
                envelope.lower()[0] - BOUNDS_ENVELOPE_PADDING_M,
                envelope.lower()[1] - BOUNDS_ENVELOPE_PADDING_M,
            ],
            [
                envelope.upper()[0] + BOUNDS_ENVELOPE_PADDING_M,
                envelope.upper()[1] + BOUNDS_ENVELOPE_PADDING_M,
            ],
        );

        Ok(self
            .spatial
            .query_region(&padded)
            .into_iter()
            .filter(|&i| bounds.contains(self.incidents[i].location))
            .collect())
    }

    /// A new index over the incidents matching `filter`.
    ///
    /// Weights and planar points are carried over unchanged, so the subset
    /// reflects the same `now` as this index. A filter matching nothing
    /// yields an empty index.
    #[must_use]
    pub fn filtered(&self, filter: &IncidentFilter) -> Self {
        let mut points = Vec::new();
        let mut weights = Vec::new();
        let mut incidents = Vec::new();

        for (i, incident) in self.incidents.iter().enumerate() {
            if !filter.matches(incident) {
                continue;
            }
            if let (Some(point), Some(weight)) = (self.spatial.point(i), self.spatial.weight(i)) {
                points.push(point);
                weights.push(weight);
                incidents.push(incident.clone());
            }
        }

        log::info!(
            "Filtered incident index: {} of {} incidents match",
            incidents.len(),
            self.len()
        );

        Self {
            spatial: SpatialIndex::build(points, weights),
            incidents,
            projector: Arc::clone(&self.projector),
            built_at: self.built_at,
        }
    }

    fn to_matches(&self, hits: Vec<(usize, f64)>) -> Vec<IncidentMatch> {
        hits.into_iter()
            .filter_map(|(position, distance_meters)| {
                let (incident, weight) = self.get(position)?;
                Some(IncidentMatch {
                    position,
                    incident: incident.clone(),
                    weight,
                    distance_meters,
                })
            })
            .collect()
    }
}
