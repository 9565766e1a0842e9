//! Ranking of scored routes and the safety/speed recommendation.

use std::cmp::Ordering;

use saferoute_route_models::{
    Comparison, Recommendation, RouteComparison, SafestReason, ScoredRoute, ValueRange,
};
use serde::{Deserialize, Serialize};

/// Thresholds of the recommendation rules.
///
/// The rules are applied in order: a small time penalty recommends the
/// safest route, then a low safest score does, then a high safest score
/// recommends the fastest route with a caveat, and otherwise both are
/// offered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationPolicy {
    /// Relative time penalty below which the safest route always wins.
    pub max_time_penalty: f64,
    /// Safest-route score below which it is worth the extra time.
    pub low_risk_score: f64,
    /// Safest-route score above which speed is preferred.
    pub high_risk_score: f64,
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self {
            max_time_penalty: 0.2,
            low_risk_score: 2.0,
            high_risk_score: 5.0,
        }
    }
}

impl RecommendationPolicy {
    /// Applies the rules to the safest and fastest routes.
    #[must_use]
    pub fn recommend(&self, safest: &ScoredRoute, fastest: &ScoredRoute) -> Recommendation {
        let penalty = time_penalty(safest.duration_seconds(), fastest.duration_seconds());
        let safest_route_id = safest.route_id();

        if penalty < self.max_time_penalty {
            Recommendation::Safest {
                route_id: safest_route_id,
                reason: SafestReason::MinimalTimePenalty,
            }
        } else if safest.risk_score() < self.low_risk_score {
            Recommendation::Safest {
                route_id: safest_route_id,
                reason: SafestReason::LowRisk,
            }
        } else if safest.risk_score() > self.high_risk_score {
            Recommendation::FastestWithRiskCaveat {
                route_id: fastest.route_id(),
                safest_route_id,
            }
        } else {
            Recommendation::Alternatives {
                safest_route_id,
                fastest_route_id: fastest.route_id(),
            }
        }
    }
}

/// Extra travel time of the safest route, relative to the fastest.
///
/// A zero fastest duration gives a penalty of zero when the safest
/// duration is also zero, and positive infinity otherwise.
#[must_use]
pub fn time_penalty(safest_seconds: f64, fastest_seconds: f64) -> f64 {
    if fastest_seconds > 0.0 {
        (safest_seconds - fastest_seconds) / fastest_seconds
    } else if safest_seconds > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// First route minimizing `key`.
fn first_min_by(routes: &[ScoredRoute], key: impl Fn(&ScoredRoute) -> f64) -> &ScoredRoute {
    let mut best = &routes[0];
    for route in &routes[1..] {
        if key(route).total_cmp(&key(best)) == Ordering::Less {
            best = route;
        }
    }
    best
}

/// Compares scored routes under the default [`RecommendationPolicy`].
#[must_use]
pub fn compare_routes(routes: &[ScoredRoute]) -> Comparison {
    compare_routes_with(routes, &RecommendationPolicy::default())
}

/// Compares scored routes.
///
/// Safest, fastest and shortest are the minima of risk score, duration and
/// planar length respectively, with ties going to the earliest route.
#[must_use]
pub fn compare_routes_with(routes: &[ScoredRoute], policy: &RecommendationPolicy) -> Comparison {
    let (Some(risk_score_range), Some(duration_range)) = (
        ValueRange::from_values(routes.iter().map(ScoredRoute::risk_score)),
        ValueRange::from_values(routes.iter().map(ScoredRoute::duration_seconds)),
    ) else {
        return Comparison::NoRoutes;
    };

    let safest = first_min_by(routes, ScoredRoute::risk_score);
    let fastest = first_min_by(routes, ScoredRoute::duration_seconds);
    let shortest = first_min_by(routes, ScoredRoute::length_km);

    Comparison::Compared(RouteComparison {
        total_routes: routes.len(),
        safest_route_id: safest.route_id(),
        fastest_route_id: fastest.route_id(),
        shortest_route_id: shortest.route_id(),
        risk_score_range,
        duration_range,
        time_penalty: time_penalty(safest.duration_seconds(), fastest.duration_seconds()),
        recommendation: policy.recommend(safest, fastest),
    })
}

#[cfg(test)]
mod tests {
    use saferoute_route_models::{RiskBand, RouteCandidate, RouteScore};

    use super::*;

    fn route(route_id: usize, risk_score: f64, duration_seconds: f64, length_km: f64) -> ScoredRoute {
        ScoredRoute {
            candidate: RouteCandidate {
                route_id,
                vertices: Vec::new(),
                distance_meters: length_km * 1_000.0,
                duration_seconds,
            },
            score: RouteScore {
                risk_score,
                incident_count: 0,
                length_km,
                total_weight: risk_score * length_km,
            },
            risk_band: RiskBand::from_score(risk_score),
            buffer_meters: 180.0,
        }
    }

    fn compared(routes: &[ScoredRoute]) -> RouteComparison {
        compare_routes(routes)
            .as_compared()
            .cloned()
            .expect("routes were supplied")
    }

    #[test]
    fn empty_input_has_no_routes() {
        assert_eq!(compare_routes(&[]), Comparison::NoRoutes);
    }

    #[test]
    fn low_risk_rule_applies_after_time_penalty() {
        let routes = [
            route(0, 0.5, 600.0, 1.2),
            route(1, 2.5, 650.0, 1.3),
            route(2, 6.0, 500.0, 1.0),
        ];
        let c = compared(&routes);

        assert_eq!(c.total_routes, 3);
        assert_eq!(c.safest_route_id, 0);
        assert_eq!(c.fastest_route_id, 2);
        assert_eq!(c.shortest_route_id, 2);
        assert!((c.time_penalty - 0.2).abs() < 1e-12);
        assert_eq!(
            c.recommendation,
            Recommendation::Safest {
                route_id: 0,
                reason: SafestReason::LowRisk,
            }
        );
        assert!((c.risk_score_range.min - 0.5).abs() < 1e-12);
        assert!((c.risk_score_range.max - 6.0).abs() < 1e-12);
        assert!((c.risk_score_range.avg - 3.0).abs() < 1e-12);
        assert!((c.duration_range.min - 500.0).abs() < 1e-12);
        assert!((c.duration_range.max - 650.0).abs() < 1e-12);
    }

    #[test]
    fn minimal_time_penalty_wins_first() {
        let routes = [route(0, 4.0, 500.0, 1.0), route(1, 3.0, 540.0, 1.1)];
        assert_eq!(
            compared(&routes).recommendation,
            Recommendation::Safest {
                route_id: 1,
                reason: SafestReason::MinimalTimePenalty,
            }
        );
    }

    #[test]
    fn high_risk_everywhere_prefers_speed() {
        let routes = [route(4, 5.5, 900.0, 1.0), route(9, 8.0, 600.0, 1.0)];
        assert_eq!(
            compared(&routes).recommendation,
            Recommendation::FastestWithRiskCaveat {
                route_id: 9,
                safest_route_id: 4,
            }
        );
    }

    #[test]
    fn middling_risk_offers_both() {
        let routes = [route(0, 3.0, 900.0, 1.0), route(1, 4.0, 600.0, 1.0)];
        assert_eq!(
            compared(&routes).recommendation,
            Recommendation::Alternatives {
                safest_route_id: 0,
                fastest_route_id: 1,
            }
        );
    }

    #[test]
    fn ties_go_to_first_route() {
        let routes = [
            route(3, 1.0, 600.0, 2.0),
            route(1, 1.0, 600.0, 2.0),
            route(2, 1.0, 600.0, 2.0),
        ];
        let c = compared(&routes);
        assert_eq!(c.safest_route_id, 3);
        assert_eq!(c.fastest_route_id, 3);
        assert_eq!(c.shortest_route_id, 3);
    }

    #[test]
    fn single_route_recommends_itself() {
        let c = compared(&[route(5, 9.0, 300.0, 0.4)]);
        assert_eq!(c.total_routes, 1);
        assert!(c.time_penalty.abs() < f64::EPSILON);
        assert_eq!(c.recommendation.route_id(), Some(5));
    }

    #[test]
    fn zero_fastest_duration() {
        assert!(time_penalty(0.0, 0.0).abs() < f64::EPSILON);
        assert!(time_penalty(10.0, 0.0).is_infinite());

        let routes = [route(0, 3.0, 120.0, 1.0), route(1, 4.0, 0.0, 1.0)];
        assert_eq!(
            compared(&routes).recommendation,
            Recommendation::Alternatives {
                safest_route_id: 0,
                fastest_route_id: 1,
            }
        );
    }

    #[test]
    fn custom_policy_thresholds() {
        let policy = RecommendationPolicy {
            max_time_penalty: 0.5,
            ..RecommendationPolicy::default()
        };
        let routes = [route(0, 3.0, 640.0, 1.0), route(1, 4.0, 500.0, 1.0)];
        let c = compare_routes_with(&routes, &policy);
        assert_eq!(
            c.as_compared().map(|c| c.recommendation),
            Some(Recommendation::Safest {
                route_id: 0,
                reason: SafestReason::MinimalTimePenalty,
            })
        );
    }
}
