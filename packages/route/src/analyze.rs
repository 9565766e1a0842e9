//! Batch scoring of route alternatives.

use rayon::prelude::*;
use saferoute_route_models::{Comparison, RouteCandidate, ScoredRoute};
use saferoute_spatial::IncidentIndex;
use serde::{Deserialize, Serialize};

use crate::{ScoreError, ScoringConfig, compare::compare_routes_with, scorer::score_candidate_with};

/// Candidate counts above this are scored on the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 4;

/// Scored and compared route alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAnalysis {
    /// Successfully scored routes, safest first.
    pub routes: Vec<ScoredRoute>,
    /// Comparison of [`RouteAnalysis::routes`].
    pub comparison: Comparison,
    /// Ids of candidates that could not be scored.
    pub skipped: Vec<usize>,
}

/// Scores every candidate, returning results in input order.
#[must_use]
pub fn score_routes(
    index: &IncidentIndex,
    candidates: &[RouteCandidate],
    buffer_meters: f64,
) -> Vec<Result<ScoredRoute, ScoreError>> {
    score_routes_with(index, candidates, &ScoringConfig::with_buffer(buffer_meters))
}

/// Scores every candidate under `config`, returning results in input order.
#[must_use]
pub fn score_routes_with(
    index: &IncidentIndex,
    candidates: &[RouteCandidate],
    config: &ScoringConfig,
) -> Vec<Result<ScoredRoute, ScoreError>> {
    if candidates.len() > PARALLEL_THRESHOLD {
        candidates
            .par_iter()
            .map(|candidate| score_candidate_with(index, candidate, config))
            .collect()
    } else {
        candidates
            .iter()
            .map(|candidate| score_candidate_with(index, candidate, config))
            .collect()
    }
}

/// Scores, ranks and compares candidates with the given buffer.
#[must_use]
pub fn analyze_routes(
    index: &IncidentIndex,
    candidates: &[RouteCandidate],
    buffer_meters: f64,
) -> RouteAnalysis {
    analyze_routes_with(index, candidates, &ScoringConfig::with_buffer(buffer_meters))
}

/// Scores, ranks and compares candidates under `config`.
///
/// Candidates that fail to score are logged and left out of the ranking.
/// The surviving routes are sorted by ascending risk score, keeping input
/// order among equal scores.
#[must_use]
pub fn analyze_routes_with(
    index: &IncidentIndex,
    candidates: &[RouteCandidate],
    config: &ScoringConfig,
) -> RouteAnalysis {
    let mut routes = Vec::with_capacity(candidates.len());
    let mut skipped = Vec::new();

    for (candidate, result) in candidates
        .iter()
        .zip(score_routes_with(index, candidates, config))
    {
        match result {
            Ok(scored) => routes.push(scored),
            Err(e) => {
                log::warn!("Skipping route {}: {e}", candidate.route_id);
                skipped.push(candidate.route_id);
            }
        }
    }

    routes.sort_by(|a, b| a.risk_score().total_cmp(&b.risk_score()));
    let comparison = compare_routes_with(&routes, &config.policy);

    log::info!(
        "Analyzed {} routes ({} skipped)",
        routes.len(),
        skipped.len()
    );

    RouteAnalysis {
        routes,
        comparison,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use saferoute_incident_models::{Incident, LonLat};
    use saferoute_projection::UtmProjector;
    use saferoute_spatial::build_index;

    use super::*;

    fn index() -> IncidentIndex {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let incidents = (0..5)
            .map(|i| {
                let offset = f64::from(i) * 0.001;
                Incident::new(LonLat::new(-79.39 + offset, 43.65), "Robbery", now)
            })
            .collect();
        build_index(incidents, now, Arc::new(UtmProjector::default())).unwrap()
    }

    /// An east-west route at `lat` spanning the indexed incidents.
    fn candidate(route_id: usize, lat: f64, duration_seconds: f64) -> RouteCandidate {
        RouteCandidate {
            route_id,
            vertices: vec![LonLat::new(-79.40, lat), LonLat::new(-79.38, lat)],
            distance_meters: 1_600.0,
            duration_seconds,
        }
    }

    #[test]
    fn results_keep_input_order_in_parallel() {
        let index = index();
        let candidates: Vec<_> = (0..10)
            .map(|i| candidate(i, 43.65 + 0.01 * f64::from(u32::try_from(i).unwrap()), 600.0))
            .collect();
        assert!(candidates.len() > PARALLEL_THRESHOLD);

        let results = score_routes(&index, &candidates, 180.0);
        let ids: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().route_id())
            .collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
        assert_eq!(results[0].as_ref().unwrap().score.incident_count, 5);
        assert_eq!(results[9].as_ref().unwrap().score.incident_count, 0);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let index = index();
        let candidates: Vec<_> = (0..6)
            .map(|i| candidate(i, 43.649 + 0.001 * f64::from(u32::try_from(i).unwrap()), 600.0))
            .collect();

        let parallel = score_routes(&index, &candidates, 180.0);
        for (candidate, result) in candidates.iter().zip(parallel) {
            let sequential = score_routes(&index, std::slice::from_ref(candidate), 180.0);
            assert_eq!(
                result.unwrap(),
                sequential.into_iter().next().unwrap().unwrap()
            );
        }
    }

    #[test]
    fn analysis_sorts_and_skips_failures() {
        let index = index();
        let mut broken = candidate(1, 43.65, 500.0);
        broken.vertices[1] = LonLat::new(f64::NAN, 43.65);

        let candidates = vec![
            candidate(0, 43.65, 600.0),
            broken,
            candidate(2, 43.70, 800.0),
            candidate(3, 43.75, 900.0),
        ];
        let analysis = analyze_routes(&index, &candidates, 180.0);

        assert_eq!(analysis.skipped, vec![1]);
        let ids: Vec<_> = analysis.routes.iter().map(ScoredRoute::route_id).collect();
        assert_eq!(ids, vec![2, 3, 0], "zero-risk routes keep input order");

        let comparison = analysis.comparison.as_compared().unwrap();
        assert_eq!(comparison.total_routes, 3);
        assert_eq!(comparison.safest_route_id, 2);
        assert_eq!(comparison.fastest_route_id, 0);
    }

    #[test]
    fn invalid_buffer_skips_everything() {
        let index = index();
        let analysis = analyze_routes(&index, &[candidate(0, 43.65, 600.0)], -5.0);
        assert!(analysis.routes.is_empty());
        assert_eq!(analysis.skipped, vec![0]);
        assert_eq!(analysis.comparison, Comparison::NoRoutes);
    }
}
