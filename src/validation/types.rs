//! Result types produced by the validation engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Outcome of [`validate`](super::validate). `is_valid` holds iff `errors` is
/// empty; warnings never affect validity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub(crate) fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Aggregate counts derived from one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_trips: usize,
    pub total_vehicles: usize,
    pub total_alerts: usize,
    pub routes_covered: BTreeSet<String>,
    pub last_update: Option<u64>,
    pub data_age_minutes: Option<f64>,
}

/// Outcome of [`coverage`](super::coverage).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub complete: bool,
    pub missing: BTreeSet<String>,
}
