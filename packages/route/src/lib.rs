#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route-risk scoring over an incident index.
//!
//! Each candidate path is buffered into a corridor, the incidents inside
//! the corridor are summed by weight, and the sum is normalized by path
//! length. Scored routes can then be ranked with [`compare_routes`], and
//! rendered as `GeoJSON` with the helpers in [`crate::geojson`].

pub mod analyze;
pub mod compare;
pub mod corridor;
pub mod geojson;
pub mod scorer;

use saferoute_projection::ProjectionError;
use saferoute_route_models::RiskThresholds;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use analyze::{PARALLEL_THRESHOLD, RouteAnalysis, analyze_routes, score_routes};
pub use compare::{RecommendationPolicy, compare_routes, time_penalty};
pub use corridor::Corridor;
pub use scorer::{score_candidate, score_planar, score_route};

/// Corridor half-width used when the caller does not choose one.
pub const DEFAULT_BUFFER_METERS: f64 = 180.0;

/// Errors raised while scoring a route.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// A route vertex could not be projected to the planar frame.
    #[error("failed to project route vertex {position}: {source}")]
    Projection {
        /// Index of the offending vertex.
        position: usize,
        /// Underlying projection failure.
        #[source]
        source: ProjectionError,
    },

    /// The corridor half-width is negative or not finite.
    #[error("invalid buffer distance {0} m")]
    InvalidBuffer(f64),
}

/// Tunables for scoring and comparing routes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    /// Corridor half-width in metres.
    pub buffer_meters: f64,
    /// Risk band boundaries.
    pub thresholds: RiskThresholds,
    /// Recommendation rules.
    pub policy: RecommendationPolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            buffer_meters: DEFAULT_BUFFER_METERS,
            thresholds: RiskThresholds::default(),
            policy: RecommendationPolicy::default(),
        }
    }
}

impl ScoringConfig {
    /// Default configuration with a different buffer.
    #[must_use]
    pub fn with_buffer(buffer_meters: f64) -> Self {
        Self {
            buffer_meters,
            ..Self::default()
        }
    }
}
