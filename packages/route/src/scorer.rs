//! Corridor scoring of a single path.

use geo::{Coord, Euclidean, Length, LineString};
use saferoute_incident_models::LonLat;
use saferoute_route_models::{RouteCandidate, RouteScore, ScoredRoute};
use saferoute_spatial::{IncidentIndex, SpatialIndex};

use crate::{Corridor, ScoreError, ScoringConfig};

fn check_buffer(buffer_meters: f64) -> Result<(), ScoreError> {
    if buffer_meters.is_finite() && buffer_meters >= 0.0 {
        Ok(())
    } else {
        Err(ScoreError::InvalidBuffer(buffer_meters))
    }
}

/// Scores a geographic path against `index`.
///
/// Paths with fewer than two vertices score [`RouteScore::ZERO`] whatever
/// the buffer.
///
/// # Errors
///
/// * [`ScoreError::InvalidBuffer`] if the path has two or more vertices and
///   `buffer_meters` is negative or not finite
/// * [`ScoreError::Projection`] if a vertex cannot be projected
pub fn score_route(
    index: &IncidentIndex,
    vertices: &[LonLat],
    buffer_meters: f64,
) -> Result<RouteScore, ScoreError> {
    if vertices.len() < 2 {
        return Ok(RouteScore::ZERO);
    }
    check_buffer(buffer_meters)?;

    let projector = index.projector();
    let coords = vertices
        .iter()
        .enumerate()
        .map(|(position, &vertex)| {
            projector
                .to_planar(vertex)
                .map(|[x, y]| Coord { x, y })
                .map_err(|source| ScoreError::Projection { position, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    score_planar(index.spatial(), &LineString::new(coords), buffer_meters)
}

/// Scores an already-projected polyline against a planar index.
///
/// Lines with fewer than two vertices score [`RouteScore::ZERO`] whatever
/// the buffer.
///
/// # Errors
///
/// Returns [`ScoreError::InvalidBuffer`] if the line has two or more
/// vertices and `buffer_meters` is negative or not finite.
pub fn score_planar(
    index: &SpatialIndex,
    line: &LineString<f64>,
    buffer_meters: f64,
) -> Result<RouteScore, ScoreError> {
    if line.0.len() < 2 {
        return Ok(RouteScore::ZERO);
    }
    check_buffer(buffer_meters)?;

    let length_km = Euclidean.length(line) / 1000.0;
    if length_km <= 0.0 {
        return Ok(RouteScore::ZERO);
    }

    let inside = index.query_region(&Corridor::new(line, buffer_meters));
    let total_weight: f64 = inside.iter().filter_map(|&i| index.weight(i)).sum();

    Ok(RouteScore {
        risk_score: total_weight / length_km,
        incident_count: inside.len(),
        length_km,
        total_weight,
    })
}

/// Scores `candidate` with the default thresholds and the given buffer.
///
/// # Errors
///
/// See [`score_route`].
pub fn score_candidate(
    index: &IncidentIndex,
    candidate: &RouteCandidate,
    buffer_meters: f64,
) -> Result<ScoredRoute, ScoreError> {
    score_candidate_with(index, candidate, &ScoringConfig::with_buffer(buffer_meters))
}

/// Scores `candidate` under `config`.
///
/// # Errors
///
/// See [`score_route`].
pub fn score_candidate_with(
    index: &IncidentIndex,
    candidate: &RouteCandidate,
    config: &ScoringConfig,
) -> Result<ScoredRoute, ScoreError> {
    let score = score_route(index, &candidate.vertices, config.buffer_meters)?;
    let risk_band = config.thresholds.classify(score.risk_score);

    log::debug!(
        "Route {}: {} incidents over {:.3} km, score {:.3} ({risk_band})",
        candidate.route_id,
        score.incident_count,
        score.length_km,
        score.risk_score,
    );

    Ok(ScoredRoute {
        candidate: candidate.clone(),
        score,
        risk_band,
        buffer_meters: config.buffer_meters,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use saferoute_incident_models::Incident;
    use saferoute_projection::UtmProjector;
    use saferoute_route_models::RiskBand;
    use saferoute_spatial::build_index;

    use super::*;

    fn straight_km() -> LineString<f64> {
        LineString::from(vec![(0.0, 0.0), (1_000.0, 0.0)])
    }

    #[test]
    fn three_incidents_on_one_km_route() {
        let index = SpatialIndex::build(vec![[500.0, 0.0]; 3], vec![0.5, 0.5, 1.0]);
        let score = score_planar(&index, &straight_km(), 180.0).unwrap();

        assert_eq!(score.incident_count, 3);
        assert!((score.total_weight - 2.0).abs() < 1e-12);
        assert!((score.length_km - 1.0).abs() < 1e-12);
        assert!((score.risk_score - 2.0).abs() < 1e-12);
        assert_eq!(RiskBand::from_score(score.risk_score), RiskBand::Medium);
    }

    #[test]
    fn corridor_uses_round_caps() {
        let index = SpatialIndex::build(
            vec![
                [-180.0, 0.0],   // on the boundary
                [500.0, 180.5],  // just outside
                [-100.0, 100.0], // inside the start cap
                [-130.0, 130.0], // inside the envelope, outside the cap
                [1_127.0, 0.0],  // past the end, inside the cap
            ],
            vec![1.0; 5],
        );
        let score = score_planar(&index, &straight_km(), 180.0).unwrap();
        assert_eq!(score.incident_count, 3);
    }

    #[test]
    fn degenerate_paths_score_zero() {
        let index = SpatialIndex::build(vec![[0.0, 0.0]], vec![1.0]);

        let single = LineString::from(vec![(0.0, 0.0)]);
        assert!(score_planar(&index, &single, 180.0).unwrap().is_zero());

        let repeated = LineString::from(vec![(0.0, 0.0), (0.0, 0.0)]);
        assert!(score_planar(&index, &repeated, 180.0).unwrap().is_zero());
    }

    #[test]
    fn empty_index_scores_zero_risk() {
        let index = SpatialIndex::build(Vec::new(), Vec::new());
        let score = score_planar(&index, &straight_km(), 180.0).unwrap();
        assert_eq!(score.incident_count, 0);
        assert!(score.risk_score.abs() < f64::EPSILON);
        assert!((score.length_km - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_invalid_buffer() {
        let index = SpatialIndex::build(Vec::new(), Vec::new());
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                score_planar(&index, &straight_km(), bad),
                Err(ScoreError::InvalidBuffer(_))
            ));
        }
    }

    #[test]
    fn degenerate_path_ignores_buffer() {
        let index = SpatialIndex::build(vec![[0.0, 0.0]], vec![1.0]);
        let single = LineString::from(vec![(0.0, 0.0)]);
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(score_planar(&index, &single, bad).unwrap().is_zero());
        }
    }

    fn toronto_index() -> IncidentIndex {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let incidents = vec![
            Incident::new(LonLat::new(-79.39, 43.65), "Assault", now),
            Incident::new(LonLat::new(-79.39, 43.66), "Assault", now),
            Incident::new(
                LonLat::new(-79.385, 43.6502),
                "Theft",
                now - Duration::days(365),
            ),
        ];
        build_index(incidents, now, Arc::new(UtmProjector::default())).unwrap()
    }

    #[test]
    fn scores_geographic_route() {
        let index = toronto_index();
        let route = [LonLat::new(-79.40, 43.65), LonLat::new(-79.38, 43.65)];
        let score = score_route(&index, &route, 180.0).unwrap();

        assert_eq!(score.incident_count, 2, "the northern incident is ~1.1 km away");
        assert!((score.length_km - 1.61).abs() < 0.01, "{}", score.length_km);
        assert!(score.total_weight > 1.0 && score.total_weight < 1.5);
        assert!((score.risk_score - score.total_weight / score.length_km).abs() < 1e-12);
    }

    #[test]
    fn unprojectable_vertex_is_reported() {
        let index = toronto_index();
        let route = [LonLat::new(-79.40, 43.65), LonLat::new(f64::NAN, 43.65)];
        let err = score_route(&index, &route, 180.0).unwrap_err();
        assert!(matches!(err, ScoreError::Projection { position: 1, .. }));
    }

    #[test]
    fn single_vertex_route_is_not_projected() {
        let index = toronto_index();
        let route = [LonLat::new(f64::NAN, f64::NAN)];
        assert!(score_route(&index, &route, 180.0).unwrap().is_zero());
        assert!(score_route(&index, &[], f64::NAN).unwrap().is_zero());
        assert!(score_route(&index, &route, -5.0).unwrap().is_zero());
    }

    #[test]
    fn candidate_carries_metadata_through() {
        let index = toronto_index();
        let candidate = RouteCandidate {
            route_id: 7,
            vertices: vec![LonLat::new(-79.40, 43.65), LonLat::new(-79.38, 43.65)],
            distance_meters: 1_700.0,
            duration_seconds: 1_260.0,
        };
        let scored = score_candidate(&index, &candidate, 120.0).unwrap();

        assert_eq!(scored.route_id(), 7);
        assert_eq!(scored.candidate, candidate);
        assert!((scored.buffer_meters - 120.0).abs() < f64::EPSILON);
        assert_eq!(scored.risk_band, RiskBand::from_score(scored.risk_score()));
    }

    mod props {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn wider_buffer_never_loses_incidents(
                points in prop::collection::vec((-500.0..1_500.0_f64, -500.0..500.0_f64), 0..60),
                narrow in 0.0..300.0_f64,
                extra in 0.0..300.0_f64,
            ) {
                let n = points.len();
                let index = SpatialIndex::build(
                    points.into_iter().map(|(x, y)| [x, y]).collect(),
                    vec![0.5; n],
                );
                let line = LineString::from(vec![(0.0, 0.0), (400.0, 300.0), (1_000.0, 0.0)]);
                let a = score_planar(&index, &line, narrow).unwrap();
                let b = score_planar(&index, &line, narrow + extra).unwrap();
                prop_assert!(a.incident_count <= b.incident_count);
                prop_assert!(a.risk_score <= b.risk_score);
            }
        }
    }
}
