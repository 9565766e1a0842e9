//! `GeoJSON` rendering of scored routes and incident matches.
//!
//! Coordinates are written in the geographic `[lon, lat]` order `GeoJSON`
//! requires; no planar coordinates leave the crate.

use ::geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value, feature::Id};
use saferoute_route_models::ScoredRoute;
use saferoute_spatial::IncidentMatch;
use serde_json::{Value as JsonValue, json};

fn object(value: JsonValue) -> Option<JsonObject> {
    match value {
        JsonValue::Object(map) => Some(map),
        _ => None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// A `LineString` feature for one scored route.
#[must_use]
pub fn scored_route_feature(route: &ScoredRoute) -> Feature {
    let line = route
        .candidate
        .vertices
        .iter()
        .map(|v| vec![v.lon, v.lat])
        .collect();

    let properties = json!({
        "route_id": route.route_id(),
        "risk_score": route.score.risk_score,
        "incidents": route.score.incident_count,
        "length_km": route.score.length_km,
        "total_weight": route.score.total_weight,
        "distance_meters": route.candidate.distance_meters,
        "duration_seconds": route.candidate.duration_seconds,
        "buffer_meters": route.buffer_meters,
        "risk_level": route.risk_band.as_ref(),
    });

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(line))),
        id: Some(Id::Number(route.route_id().into())),
        properties: object(properties),
        foreign_members: None,
    }
}

/// One feature per route, in input order.
#[must_use]
pub fn route_feature_collection(routes: &[ScoredRoute]) -> FeatureCollection {
    collection(routes.iter().map(scored_route_feature).collect())
}

/// `Point` features for incident query results.
#[must_use]
pub fn incident_feature_collection(matches: &[IncidentMatch]) -> FeatureCollection {
    collection(
        matches
            .iter()
            .map(|m| {
                let location = m.incident.location;
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(vec![location.lon, location.lat]))),
                    id: Some(Id::Number(m.position.into())),
                    properties: object(json!({
                        "category": m.incident.category,
                        "occurred_at": m.incident.occurred_at.to_rfc3339(),
                        "weight": m.weight,
                        "distance_meters": m.distance_meters,
                    })),
                    foreign_members: None,
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use saferoute_incident_models::{Incident, LonLat};
    use saferoute_route_models::{RiskBand, RouteCandidate, RouteScore};

    use super::*;

    fn scored() -> ScoredRoute {
        ScoredRoute {
            candidate: RouteCandidate {
                route_id: 1,
                vertices: vec![LonLat::new(-79.40, 43.65), LonLat::new(-79.38, 43.65)],
                distance_meters: 1_650.0,
                duration_seconds: 1_200.0,
            },
            score: RouteScore {
                risk_score: 6.5,
                incident_count: 11,
                length_km: 1.6,
                total_weight: 10.4,
            },
            risk_band: RiskBand::VeryHigh,
            buffer_meters: 180.0,
        }
    }

    #[test]
    fn route_feature_is_lon_lat_linestring() {
        let feature = scored_route_feature(&scored());
        let Some(Geometry {
            value: Value::LineString(coords),
            ..
        }) = &feature.geometry
        else {
            panic!("expected a LineString geometry");
        };
        assert_eq!(coords, &vec![vec![-79.40, 43.65], vec![-79.38, 43.65]]);
    }

    #[test]
    fn route_feature_properties() {
        let feature = scored_route_feature(&scored());
        let props = feature.properties.unwrap();
        assert_eq!(props["route_id"], 1);
        assert_eq!(props["incidents"], 11);
        assert_eq!(props["risk_level"], "very_high");
        assert_eq!(props["buffer_meters"], 180.0);
        assert_eq!(props["duration_seconds"], 1_200.0);
    }

    #[test]
    fn collection_keeps_order() {
        let mut second = scored();
        second.candidate.route_id = 4;
        let fc = route_feature_collection(&[scored(), second]);
        let ids: Vec<_> = fc.features.iter().map(|f| f.id.clone()).collect();
        assert_eq!(
            ids,
            vec![Some(Id::Number(1.into())), Some(Id::Number(4.into()))]
        );
    }

    #[test]
    fn incident_points() {
        let at = Utc.with_ymd_and_hms(2024, 3, 2, 22, 15, 0).unwrap();
        let matches = [IncidentMatch {
            position: 3,
            incident: Incident::new(LonLat::new(-79.39, 43.65), "Robbery", at),
            weight: 0.72,
            distance_meters: 41.5,
        }];
        let fc = incident_feature_collection(&matches);
        assert_eq!(fc.features.len(), 1);

        let feature = &fc.features[0];
        assert!(matches!(
            feature.geometry.as_ref().map(|g| &g.value),
            Some(Value::Point(p)) if p == &vec![-79.39, 43.65]
        ));
        let props = feature.properties.as_ref().unwrap();
        assert_eq!(props["category"], "Robbery");
        assert_eq!(props["occurred_at"], "2024-03-02T22:15:00+00:00");
    }
}
