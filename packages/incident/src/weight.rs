//! Severity/recency weight model.

use chrono::{DateTime, Utc};
use saferoute_incident_models::{Incident, severity_for};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SECONDS_PER_DAY: i64 = 86_400;

/// Outer limits every weight must stay within.
pub const WEIGHT_FLOOR: f64 = 0.2;
pub const WEIGHT_CEILING: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WeightModelError {
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidFactor { name: &'static str, value: f64 },
    #[error("recency scale must be finite and positive, got {0} days")]
    InvalidRecencyScale(f64),
    #[error("weight bounds [{min}, {max}] must be ordered and within [0.2, 1.0]")]
    InvalidBounds { min: f64, max: f64 },
}

/// Coefficients of the weight formula.
///
/// `weight = clamp(severity_factor * severity + recency_factor * recency,
/// min_weight, max_weight)` where
/// `recency = 1 / (1 + age_days / recency_scale_days)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightModel {
    /// Contribution of category severity.
    pub severity_factor: f64,
    /// Contribution of recency.
    pub recency_factor: f64,
    /// Age in days at which recency has decayed to one half.
    pub recency_scale_days: f64,
    /// Lower clamp bound.
    pub min_weight: f64,
    /// Upper clamp bound.
    pub max_weight: f64,
}

impl Default for WeightModel {
    fn default() -> Self {
        Self {
            severity_factor: 0.4,
            recency_factor: 0.6,
            recency_scale_days: 30.0,
            min_weight: WEIGHT_FLOOR,
            max_weight: WEIGHT_CEILING,
        }
    }
}

impl WeightModel {
    /// Builds a model, rejecting coefficients [`validate`](Self::validate)
    /// would reject.
    ///
    /// # Errors
    ///
    /// See [`WeightModel::validate`].
    pub fn new(
        severity_factor: f64,
        recency_factor: f64,
        recency_scale_days: f64,
        min_weight: f64,
        max_weight: f64,
    ) -> Result<Self, WeightModelError> {
        let model = Self {
            severity_factor,
            recency_factor,
            recency_scale_days,
            min_weight,
            max_weight,
        };
        model.validate()?;
        Ok(model)
    }

    /// Checks that every weight this model produces is a finite number in
    /// `[0.2, 1.0]`.
    ///
    /// # Errors
    ///
    /// * [`WeightModelError::InvalidFactor`] if a factor is negative or not
    ///   finite
    /// * [`WeightModelError::InvalidRecencyScale`] if the scale is not a
    ///   finite positive number of days
    /// * [`WeightModelError::InvalidBounds`] if `min_weight > max_weight` or
    ///   either bound lies outside `[0.2, 1.0]`
    pub fn validate(&self) -> Result<(), WeightModelError> {
        for (name, value) in [
            ("severity factor", self.severity_factor),
            ("recency factor", self.recency_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(WeightModelError::InvalidFactor { name, value });
            }
        }
        if !self.recency_scale_days.is_finite() || self.recency_scale_days <= 0.0 {
            return Err(WeightModelError::InvalidRecencyScale(
                self.recency_scale_days,
            ));
        }
        let limits = WEIGHT_FLOOR..=WEIGHT_CEILING;
        if !limits.contains(&self.min_weight)
            || !limits.contains(&self.max_weight)
            || self.min_weight > self.max_weight
        {
            return Err(WeightModelError::InvalidBounds {
                min: self.min_weight,
                max: self.max_weight,
            });
        }
        Ok(())
    }

    /// Recency factor for an age in whole days.
    ///
    /// Negative ages (incidents timestamped after `now`) are treated as
    /// age zero, so a future timestamp never weighs more than a same-day one.
    #[must_use]
    pub fn recency(&self, age_days: i64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let age = age_days.max(0) as f64;
        1.0 / (1.0 + age / self.recency_scale_days)
    }

    /// Weight for a category string and occurrence time, relative to `now`.
    ///
    /// The model must pass [`WeightModel::validate`]; an unordered pair of
    /// bounds panics in the clamp.
    #[must_use]
    pub fn weight(&self, category: &str, occurred_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let severity = severity_for(category);
        let recency = self.recency(age_days(occurred_at, now));
        let raw = self
            .severity_factor
            .mul_add(severity, self.recency_factor * recency);
        raw.clamp(self.min_weight, self.max_weight)
    }

    /// Weighs every incident against the same `now`, preserving order.
    #[must_use]
    pub fn weigh_all(&self, incidents: Vec<Incident>, now: DateTime<Utc>) -> Vec<WeightedIncident> {
        incidents
            .into_iter()
            .map(|incident| {
                let weight = self.weight(&incident.category, incident.occurred_at, now);
                WeightedIncident { incident, weight }
            })
            .collect()
    }
}

/// Whole days elapsed from `occurred_at` to `now`, rounded toward negative
/// infinity. Negative when `occurred_at` is in the future.
#[must_use]
pub fn age_days(occurred_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - occurred_at).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Weight of an incident under the default [`WeightModel`].
#[must_use]
pub fn weight(category: &str, occurred_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    WeightModel::default().weight(category, occurred_at, now)
}

/// An incident together with the weight it was assigned at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedIncident {
    /// The incident record.
    pub incident: Incident,
    /// Risk weight in `[0.2, 1.0]`.
    pub weight: f64,
}
