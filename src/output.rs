//! Log-friendly rendering of validation results and statistics.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::validation::{Statistics, ValidationResult};

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Logs every error and warning of a validation run, then a one-line verdict.
pub fn log_validation(channel: &str, result: &ValidationResult) {
    for message in &result.errors {
        error!(channel, "{message}");
    }
    for message in &result.warnings {
        warn!(channel, "{message}");
    }
    info!(
        channel,
        is_valid = result.is_valid,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "Validation finished"
    );
}

pub fn log_statistics(channel: &str, stats: &Statistics) {
    let routes: Vec<&str> = stats.routes_covered.iter().map(String::as_str).collect();
    info!(
        channel,
        trips = stats.total_trips,
        vehicles = stats.total_vehicles,
        alerts = stats.total_alerts,
        routes = %routes.join(","),
        last_update = ?stats.last_update,
        age_minutes = ?stats.data_age_minutes.map(|m| (m * 10.0).round() / 10.0),
        "Feed statistics"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&Statistics::default());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&ValidationResult::default()).unwrap();
    }

    #[test]
    fn test_log_helpers_do_not_panic() {
        let result = ValidationResult {
            is_valid: false,
            errors: vec!["Missing timestamp in header".to_string()],
            warnings: vec!["Feed contains no trip or vehicle data".to_string()],
        };
        log_validation("ace", &result);

        let mut stats = Statistics::default();
        stats.routes_covered.insert("A".to_string());
        stats.data_age_minutes = Some(2.345);
        log_statistics("ace", &stats);
    }
}
