#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route candidate, risk score and comparison result types.
//!
//! A [`RouteCandidate`] comes from an external routing provider and is
//! treated opaquely: its distance and duration are carried through to the
//! [`ScoredRoute`] without being recomputed.

use saferoute_incident_models::LonLat;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A candidate path between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCandidate {
    /// Identifier assigned by the caller (e.g. the provider's alternative
    /// index).
    pub route_id: usize,
    /// Path geometry as ordered geographic vertices.
    pub vertices: Vec<LonLat>,
    /// Provider-reported route length in metres.
    pub distance_meters: f64,
    /// Provider-reported travel time in seconds.
    pub duration_seconds: f64,
}

/// Risk density of a single path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteScore {
    /// Total matched weight per kilometre.
    pub risk_score: f64,
    /// Number of incidents inside the buffered corridor.
    pub incident_count: usize,
    /// Planar path length in kilometres.
    pub length_km: f64,
    /// Sum of the weights of matched incidents.
    pub total_weight: f64,
}

impl RouteScore {
    /// Result for a degenerate path (fewer than two vertices or zero
    /// length).
    pub const ZERO: Self = Self {
        risk_score: 0.0,
        incident_count: 0,
        length_km: 0.0,
        total_weight: 0.0,
    };

    /// Returns `true` if this is the degenerate-path sentinel.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Qualitative risk level derived from a risk score.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskBand {
    /// Score below the medium threshold.
    Low,
    /// Score in `[medium, high)`.
    Medium,
    /// Score in `[high, very_high)`.
    High,
    /// Score at or above the very-high threshold.
    VeryHigh,
}

impl RiskBand {
    /// Band for `score` under the default [`RiskThresholds`].
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        RiskThresholds::default().classify(score)
    }
}

/// Lower bounds of each risk band above [`RiskBand::Low`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskThresholds {
    /// Scores at or above this are at least medium.
    pub medium: f64,
    /// Scores at or above this are at least high.
    pub high: f64,
    /// Scores at or above this are very high.
    pub very_high: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 1.0,
            high: 3.0,
            very_high: 6.0,
        }
    }
}

impl RiskThresholds {
    /// Maps a score to its band.
    #[must_use]
    pub fn classify(&self, score: f64) -> RiskBand {
        if score >= self.very_high {
            RiskBand::VeryHigh
        } else if score >= self.high {
            RiskBand::High
        } else if score >= self.medium {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}

/// A route candidate together with its risk analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRoute {
    /// The candidate as supplied by the routing provider.
    #[serde(flatten)]
    pub candidate: RouteCandidate,
    /// Risk density of the path.
    #[serde(flatten)]
    pub score: RouteScore,
    /// Band of [`RouteScore::risk_score`].
    pub risk_band: RiskBand,
    /// Corridor half-width used for scoring.
    pub buffer_meters: f64,
}

impl ScoredRoute {
    /// Identifier of the underlying candidate.
    #[must_use]
    pub const fn route_id(&self) -> usize {
        self.candidate.route_id
    }

    /// Risk density of the path.
    #[must_use]
    pub const fn risk_score(&self) -> f64 {
        self.score.risk_score
    }

    /// Provider-reported travel time.
    #[must_use]
    pub const fn duration_seconds(&self) -> f64 {
        self.candidate.duration_seconds
    }

    /// Planar path length.
    #[must_use]
    pub const fn length_km(&self) -> f64 {
        self.score.length_km
    }
}

/// Minimum, maximum and mean of a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Arithmetic mean.
    pub avg: f64,
}

impl ValueRange {
    /// Summarizes `values`, or `None` if there are none.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0_u32;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        (count > 0).then(|| Self {
            min,
            max,
            avg: sum / f64::from(count),
        })
    }
}

/// Why the safest route was recommended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SafestReason {
    /// The safest route is barely slower than the fastest.
    MinimalTimePenalty,
    /// The safest route is low-risk enough to justify the extra time.
    LowRisk,
}

/// Outcome of the recommendation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    /// Take the safest route.
    #[serde(rename_all = "camelCase")]
    Safest {
        /// The safest route.
        route_id: usize,
        /// Which rule selected it.
        reason: SafestReason,
    },
    /// Even the safest route is high-risk; the fastest minimizes exposure
    /// time but the caller should surface a risk warning.
    #[serde(rename_all = "camelCase")]
    FastestWithRiskCaveat {
        /// The fastest route.
        route_id: usize,
        /// The safest route, for reference.
        safest_route_id: usize,
    },
    /// No single recommendation: offer both.
    #[serde(rename_all = "camelCase")]
    Alternatives {
        /// Route to take for safety.
        safest_route_id: usize,
        /// Route to take for speed.
        fastest_route_id: usize,
    },
}

impl Recommendation {
    /// The single recommended route, if there is one.
    #[must_use]
    pub const fn route_id(&self) -> Option<usize> {
        match self {
            Self::Safest { route_id, .. } | Self::FastestWithRiskCaveat { route_id, .. } => {
                Some(*route_id)
            }
            Self::Alternatives { .. } => None,
        }
    }

    /// Human-readable advice.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Safest {
                route_id,
                reason: SafestReason::MinimalTimePenalty,
            } => format!("Take route {route_id}: safest option with minimal time penalty"),
            Self::Safest {
                route_id,
                reason: SafestReason::LowRisk,
            } => format!("Take route {route_id}: low risk, worth the extra time"),
            Self::FastestWithRiskCaveat { route_id, .. } => format!(
                "Consider route {route_id} if time is critical, but be aware of higher crime risk"
            ),
            Self::Alternatives {
                safest_route_id,
                fastest_route_id,
            } => format!(
                "Route {safest_route_id} recommended for safety, route {fastest_route_id} for speed"
            ),
        }
    }
}

/// Summary of a non-empty set of scored routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteComparison {
    /// Number of routes compared.
    pub total_routes: usize,
    /// Route with the lowest risk score.
    pub safest_route_id: usize,
    /// Route with the shortest duration.
    pub fastest_route_id: usize,
    /// Route with the shortest planar length.
    pub shortest_route_id: usize,
    /// Risk score statistics.
    pub risk_score_range: ValueRange,
    /// Duration statistics, in seconds.
    pub duration_range: ValueRange,
    /// Extra time of the safest route relative to the fastest.
    pub time_penalty: f64,
    /// Outcome of the recommendation rules.
    pub recommendation: Recommendation,
}

/// Result of comparing a set of scored routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Comparison {
    /// There was nothing to compare.
    NoRoutes,
    /// At least one route was compared.
    Compared(RouteComparison),
}

impl Comparison {
    /// The comparison, if any routes were supplied.
    #[must_use]
    pub const fn as_compared(&self) -> Option<&RouteComparison> {
        match self {
            Self::NoRoutes => None,
            Self::Compared(c) => Some(c),
        }
    }
}
