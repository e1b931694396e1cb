use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::IngestError;

/// How the freshness thresholds combine.
///
/// `Legacy` only evaluates the error threshold when the warning threshold did
/// not fire, so in practice stale data never becomes an error. `Strict` lets
/// both fire independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessPolicy {
    #[default]
    Legacy,
    Strict,
}

impl FromStr for FreshnessPolicy {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(FreshnessPolicy::Legacy),
            "strict" => Ok(FreshnessPolicy::Strict),
            other => Err(IngestError::Configuration(format!(
                "unknown freshness policy: {other}"
            ))),
        }
    }
}

/// Bounding box that reported vehicle coordinates are expected to fall in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl Geofence {
    /// The New York City service area.
    pub const NYC: Geofence = Geofence {
        min_latitude: 40.4,
        max_latitude: 40.9,
        min_longitude: -74.3,
        max_longitude: -73.7,
    };

    /// Inclusive on every edge.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&latitude)
            && (self.min_longitude..=self.max_longitude).contains(&longitude)
    }
}

impl Default for Geofence {
    fn default() -> Self {
        Geofence::NYC
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub freshness: FreshnessPolicy,
    pub stale_warning_minutes: f64,
    pub stale_error_minutes: f64,
    pub geofence: Geofence,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            freshness: FreshnessPolicy::Legacy,
            stale_warning_minutes: 10.0,
            stale_error_minutes: 30.0,
            geofence: Geofence::NYC,
        }
    }
}
