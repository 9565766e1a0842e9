#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident risk weighting and record filtering.
//!
//! Every incident gets a scalar weight in `[0.2, 1.0]` combining the
//! severity of its category with how recently it happened. Weights are
//! computed once, when an index is built, against an explicit `now`.

pub mod filter;
pub mod weight;

pub use filter::IncidentFilter;
pub use weight::{WeightModel, WeightModelError, WeightedIncident, age_days, weight};
