#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index over projected incident locations.
//!
//! Points are bulk-loaded into an R-tree once and never mutated. Every
//! query runs a bounding-box broad-phase against the tree followed by an
//! exact geometric test on the surviving candidates, so answers are exact
//! with respect to the indexed point set. Rebuilding produces a new index;
//! [`SharedIndex`] swaps the active instance for readers.

mod incidents;
mod region;
mod shared;

use rstar::{AABB, RTree, primitives::GeomWithData};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use incidents::{
    BoundsParseError, GeoBounds, IncidentIndex, IncidentMatch, IndexStats, build_index,
};
pub use region::Region;
pub use shared::SharedIndex;

pub use saferoute_incident::WeightModelError;
pub use saferoute_projection::ProjectionError;

/// Errors raised while building or querying an [`IncidentIndex`].
#[derive(Debug, Error)]
pub enum IndexError {
    /// An incident location could not be projected while building.
    #[error("failed to project incident {position}: {source}")]
    IncidentProjection {
        /// Position of the incident in the input.
        position: usize,
        /// Underlying projection failure.
        #[source]
        source: ProjectionError,
    },

    /// The weight model would produce weights outside `[0.2, 1.0]`.
    #[error("invalid weight model: {0}")]
    WeightModel(#[from] WeightModelError),

    /// A query coordinate could not be projected.
    #[error("failed to project query coordinate: {0}")]
    QueryProjection(#[from] ProjectionError),
}

/// An indexed point tagged with its position in the input arrays.
type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Axis-aligned planar extent, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarBounds {
    /// Lower-left corner `[x, y]`.
    pub min: [f64; 2],
    /// Upper-right corner `[x, y]`.
    pub max: [f64; 2],
}

impl From<AABB<[f64; 2]>> for PlanarBounds {
    fn from(aabb: AABB<[f64; 2]>) -> Self {
        Self {
            min: aabb.lower(),
            max: aabb.upper(),
        }
    }
}

/// Planar Euclidean distance in metres.
#[must_use]
pub fn planar_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// Immutable R-tree over planar points with a parallel weight array.
///
/// Position `i` in the point array, the weight array, and the `usize`
/// results of every query all refer to the same input record.
pub struct SpatialIndex {
    points: Vec<[f64; 2]>,
    weights: Vec<f64>,
    tree: RTree<IndexedPoint>,
    bounds: Option<PlanarBounds>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.points.len())
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl SpatialIndex {
    /// Bulk-loads an index over `points` with parallel `weights`.
    ///
    /// An empty input is allowed and produces an index whose queries all
    /// return empty results.
    ///
    /// # Panics
    ///
    /// Panics if `points` and `weights` differ in length.
    #[must_use]
    pub fn build(points: Vec<[f64; 2]>, weights: Vec<f64>) -> Self {
        assert_eq!(
            points.len(),
            weights.len(),
            "spatial index requires one weight per point"
        );

        let entries: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new(*p, i))
            .collect();
        let tree = RTree::bulk_load(entries);

        let bounds = if points.is_empty() {
            None
        } else {
            Some(AABB::from_points(points.iter()).into())
        };

        log::debug!("Built spatial index over {} points", points.len());

        Self {
            points,
            weights,
            tree,
            bounds,
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if no points are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Planar location of point `i`.
    #[must_use]
    pub fn point(&self, i: usize) -> Option<[f64; 2]> {
        self.points.get(i).copied()
    }

    /// Weight of point `i`.
    #[must_use]
    pub fn weight(&self, i: usize) -> Option<f64> {
        self.weights.get(i).copied()
    }

    /// All weights, in input order.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Extent of all indexed points, or `None` when empty.
    #[must_use]
    pub const fn planar_bounds(&self) -> Option<PlanarBounds> {
        self.bounds
    }

    /// Positions of all points inside `region` (boundary inclusive), in
    /// ascending order.
    #[must_use]
    pub fn query_region<R: Region + ?Sized>(&self, region: &R) -> Vec<usize> {
        let Some(envelope) = region.envelope() else {
            return Vec::new();
        };

        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|entry| region.contains_point(*entry.geom()))
            .map(|entry| entry.data)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Every point within `radius` metres of `center`, as `(position,
    /// distance)` pairs sorted by distance then position.
    ///
    /// A negative or NaN radius, or a non-finite center, matches nothing.
    /// An infinite radius matches every point.
    #[must_use]
    pub fn query_radius(&self, center: [f64; 2], radius: f64) -> Vec<(usize, f64)> {
        if radius.is_nan() || radius < 0.0 || !is_finite_point(center) {
            return Vec::new();
        }

        // Slightly widen the squared radius so rounding in `r * r` can never
        // drop a point the exact `distance <= radius` test would accept.
        let broad_radius_2 = radius * radius * (1.0 + 4.0 * f64::EPSILON);

        let mut hits: Vec<(usize, f64)> = self
            .tree
            .locate_within_distance(center, broad_radius_2)
            .map(|entry| (entry.data, planar_distance(center, *entry.geom())))
            .filter(|(_, distance)| *distance <= radius)
            .collect();
        sort_by_distance(&mut hits);
        hits
    }

    /// The `k` points closest to `center`, as `(position, distance)` pairs
    /// sorted by distance then position.
    ///
    /// The tree is walked best-first, so the search keeps expanding until
    /// the `k` nearest points are confirmed no matter how unevenly the
    /// points are distributed. Points tied with the `k`-th distance are
    /// resolved by lowest position.
    #[must_use]
    pub fn query_nearest(&self, center: [f64; 2], k: usize) -> Vec<(usize, f64)> {
        if k == 0 || !is_finite_point(center) {
            return Vec::new();
        }

        let mut hits: Vec<(usize, f64)> = Vec::with_capacity(k.min(self.len()));
        let mut cutoff_2: Option<f64> = None;

        for (entry, distance_2) in self.tree.nearest_neighbor_iter_with_distance_2(&center) {
            if let Some(cutoff) = cutoff_2
                && distance_2 > cutoff
            {
                break;
            }
            hits.push((entry.data, planar_distance(center, *entry.geom())));
            if cutoff_2.is_none() && hits.len() == k {
                cutoff_2 = Some(distance_2);
            }
        }

        sort_by_distance(&mut hits);
        hits.truncate(k);
        hits
    }
}

fn is_finite_point(p: [f64; 2]) -> bool {
    p[0].is_finite() && p[1].is_finite()
}

fn sort_by_distance(hits: &mut [(usize, f64)]) {
    hits.sort_unstable_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
}
