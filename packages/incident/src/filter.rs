//! Incident subset selection by category and time window.

use chrono::{DateTime, Utc};
use saferoute_incident_models::Incident;
use serde::{Deserialize, Serialize};

/// Selects a subset of incidents.
///
/// Category matching is an exact, case-sensitive comparison against the
/// canonical category string. Both ends of the time window are inclusive.
/// An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentFilter {
    /// Only keep incidents with exactly this category.
    pub category: Option<String>,
    /// Only keep incidents that occurred at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Only keep incidents that occurred at or before this instant.
    pub to: Option<DateTime<Utc>>,
}

impl IncidentFilter {
    /// Filter on a single category.
    #[must_use]
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// Restricts the filter to an inclusive time window.
    #[must_use]
    pub const fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Returns `true` if the filter has no constraints.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.category.is_none() && self.from.is_none() && self.to.is_none()
    }

    /// Returns `true` if `incident` passes every constraint.
    #[must_use]
    pub fn matches(&self, incident: &Incident) -> bool {
        if let Some(category) = &self.category
            && incident.category != *category
        {
            return false;
        }
        if let Some(from) = self.from
            && incident.occurred_at < from
        {
            return false;
        }
        if let Some(to) = self.to
            && incident.occurred_at > to
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn incident(category: &str, day: u32) -> Incident {
        Incident::new(
            (-79.38, 43.65).into(),
            category,
            Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = IncidentFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&incident("Theft", 1)));
    }

    #[test]
    fn category_match_is_exact() {
        let filter = IncidentFilter::category("Theft");
        assert!(filter.matches(&incident("Theft", 1)));
        assert!(!filter.matches(&incident("Theft Over", 1)));
        assert!(!filter.matches(&incident("theft", 1)));
    }

    #[test]
    fn time_window_is_inclusive() {
        let from = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let filter = IncidentFilter::default().between(Some(from), Some(to));

        assert!(!filter.matches(&incident("Assault", 4)));
        assert!(filter.matches(&incident("Assault", 5)));
        assert!(filter.matches(&incident("Assault", 10)));
        assert!(!filter.matches(&incident("Assault", 11)));
    }
}
