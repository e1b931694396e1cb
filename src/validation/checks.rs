use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::config::{FreshnessPolicy, ValidatorConfig};
use super::types::ValidationResult;
use crate::model::{EntityPayload, Snapshot, TripUpdate, VehiclePosition};

/// Fresh accumulator for a single validation run.
#[derive(Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Findings {
    fn error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    fn finish(self) -> ValidationResult {
        ValidationResult::from_findings(self.errors, self.warnings)
    }
}

/// Validates `snapshot` against the current wall clock.
pub fn validate(snapshot: &Snapshot, config: &ValidatorConfig) -> ValidationResult {
    validate_at(snapshot, config, Utc::now())
}

/// Runs the ordered check pipeline with `now` as the reference time.
///
/// A snapshot without a usable header timestamp fails the structural check
/// and nothing else runs.
pub fn validate_at(
    snapshot: &Snapshot,
    config: &ValidatorConfig,
    now: DateTime<Utc>,
) -> ValidationResult {
    let mut findings = Findings::default();

    let Some(timestamp) = snapshot.feed_timestamp() else {
        findings.error("Missing timestamp in header".to_string());
        return findings.finish();
    };

    check_freshness(&mut findings, config, timestamp, now);

    for (i, trip) in snapshot.trip_updates().enumerate() {
        check_trip(&mut findings, i, trip);
    }

    for (i, vehicle) in snapshot.vehicles().enumerate() {
        check_vehicle(&mut findings, config, i, vehicle);
    }

    check_entities(&mut findings, snapshot);

    let result = findings.finish();
    debug!(
        channel = %snapshot.channel,
        is_valid = result.is_valid,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "Snapshot validated"
    );
    result
}

pub(crate) fn age_minutes(timestamp: u64, now: DateTime<Utc>) -> f64 {
    (now.timestamp() as f64 - timestamp as f64) / 60.0
}

fn check_freshness(
    findings: &mut Findings,
    config: &ValidatorConfig,
    timestamp: u64,
    now: DateTime<Utc>,
) {
    let age = age_minutes(timestamp, now);
    let stale = age > config.stale_warning_minutes;
    let too_stale = age > config.stale_error_minutes;

    if stale {
        findings.warn(format!("Feed data is {age:.1} minutes old (may be stale)"));
    }

    let escalate = match config.freshness {
        // Only reachable when the warning threshold did not fire.
        FreshnessPolicy::Legacy => !stale && too_stale,
        FreshnessPolicy::Strict => too_stale,
    };
    if escalate {
        findings.error(format!("Feed data is {age:.1} minutes old (too stale)"));
    }
}

fn check_trip(findings: &mut Findings, index: usize, trip: &TripUpdate) {
    if is_blank(trip.trip_id.as_deref()) {
        findings.warn(format!("Trip {index} missing required field: trip_id"));
    }
    if is_blank(trip.route_id.as_deref()) {
        findings.warn(format!("Trip {index} missing required field: route_id"));
    }

    for (j, update) in trip.stop_time_updates.iter().enumerate() {
        if update.stop_id.is_empty() {
            findings.warn(format!("Trip {index} stop update {j} missing stop_id"));
        }

        let has_arrival = update.arrival_time.is_some_and(|t| t != 0);
        let has_departure = update.departure_time.is_some_and(|t| t != 0);
        if !has_arrival && !has_departure {
            findings.warn(format!(
                "Trip {index} stop update {j} missing timing information"
            ));
        }
    }
}

fn check_vehicle(
    findings: &mut Findings,
    config: &ValidatorConfig,
    index: usize,
    vehicle: &VehiclePosition,
) {
    if is_blank(vehicle.trip_id.as_deref()) {
        findings.warn(format!("Vehicle {index} missing trip_id association"));
    }

    let Some(position) = vehicle.position else {
        return;
    };

    match (position.latitude, position.longitude) {
        (Some(lat), Some(lon)) => {
            if !config.geofence.contains(lat, lon) {
                findings.warn(format!(
                    "Vehicle {index} position outside service area: {lat}, {lon}"
                ));
            }
        }
        _ => findings.warn(format!("Vehicle {index} missing position coordinates")),
    }
}

fn check_entities(findings: &mut Findings, snapshot: &Snapshot) {
    let mut trip_updates = 0usize;
    let mut vehicle_positions = 0usize;
    let mut alerts = 0usize;

    for (i, entity) in snapshot.entities.iter().enumerate() {
        if entity.id.is_empty() {
            findings.error(format!("Entity {i} missing id field"));
        }

        match entity.payload {
            EntityPayload::TripUpdate(_) => trip_updates += 1,
            EntityPayload::Vehicle(_) => vehicle_positions += 1,
            EntityPayload::Alert(_) => alerts += 1,
            EntityPayload::Empty => {}
        }
    }

    info!(
        channel = %snapshot.channel,
        trip_updates,
        vehicle_positions,
        alerts,
        "Feed contents"
    );

    if trip_updates == 0 && vehicle_positions == 0 {
        findings.warn("Feed contains no trip or vehicle data".to_string());
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}
