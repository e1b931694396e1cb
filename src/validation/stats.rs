use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use super::checks::age_minutes;
use super::types::{Coverage, Statistics};
use crate::model::Snapshot;

pub fn statistics(snapshot: &Snapshot) -> Statistics {
    statistics_at(snapshot, Utc::now())
}

/// Recomputes aggregate counts from the entity list.
///
/// `routes_covered` collects route ids from trip updates only; vehicle route
/// ids are considered by [`coverage`].
pub fn statistics_at(snapshot: &Snapshot, now: DateTime<Utc>) -> Statistics {
    let last_update = snapshot.feed_timestamp();

    Statistics {
        total_trips: snapshot.trip_updates().count(),
        total_vehicles: snapshot.vehicles().count(),
        total_alerts: snapshot.alerts().count(),
        routes_covered: snapshot
            .trip_updates()
            .filter_map(|t| t.route_id.clone())
            .filter(|r| !r.is_empty())
            .collect(),
        last_update,
        data_age_minutes: last_update.map(|ts| age_minutes(ts, now)),
    }
}

/// Checks that every route in `expected_routes` appears on a trip update or
/// vehicle in the snapshot.
pub fn coverage<S: AsRef<str>>(snapshot: &Snapshot, expected_routes: &[S]) -> Coverage {
    let found: BTreeSet<&str> = snapshot
        .trip_updates()
        .filter_map(|t| t.route_id.as_deref())
        .chain(snapshot.vehicles().filter_map(|v| v.route_id.as_deref()))
        .filter(|r| !r.is_empty())
        .collect();

    let missing: BTreeSet<String> = expected_routes
        .iter()
        .map(|route| route.as_ref())
        .filter(|route| !found.contains(route))
        .map(str::to_string)
        .collect();

    Coverage {
        complete: missing.is_empty(),
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alert, Entity, EntityPayload, FeedHeader, TripUpdate, VehiclePosition};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn entity(id: &str, payload: EntityPayload) -> Entity {
        Entity {
            id: id.to_string(),
            payload,
        }
    }

    fn trip(route: Option<&str>) -> EntityPayload {
        EntityPayload::TripUpdate(TripUpdate {
            route_id: route.map(str::to_string),
            ..Default::default()
        })
    }

    fn vehicle(route: Option<&str>) -> EntityPayload {
        EntityPayload::Vehicle(VehiclePosition {
            route_id: route.map(str::to_string),
            ..Default::default()
        })
    }

    fn snapshot(timestamp: Option<u64>, entities: Vec<Entity>) -> Snapshot {
        Snapshot {
            channel: "ace".to_string(),
            fetched_at: now(),
            header: FeedHeader {
                version: "1.0".to_string(),
                timestamp,
                incrementality: "FULL_DATASET".to_string(),
            },
            entities,
        }
    }

    #[test]
    fn test_statistics_counts() {
        let snap = snapshot(
            Some(1_700_000_000 - 90),
            vec![
                entity("1", trip(Some("A"))),
                entity("2", trip(Some("C"))),
                entity("3", trip(Some("A"))),
                entity("4", trip(None)),
                entity("5", vehicle(Some("E"))),
                entity("6", EntityPayload::Alert(Alert::default())),
                entity("7", EntityPayload::Empty),
            ],
        );

        let stats = statistics_at(&snap, now());
        assert_eq!(stats.total_trips, 4);
        assert_eq!(stats.total_vehicles, 1);
        assert_eq!(stats.total_alerts, 1);
        assert_eq!(
            stats.routes_covered.into_iter().collect::<Vec<_>>(),
            vec!["A".to_string(), "C".to_string()]
        );
        assert_eq!(stats.last_update, Some(1_700_000_000 - 90));
        assert_eq!(stats.data_age_minutes, Some(1.5));
    }

    #[test]
    fn test_statistics_without_timestamp() {
        let stats = statistics_at(&snapshot(None, vec![]), now());
        assert_eq!(stats.last_update, None);
        assert_eq!(stats.data_age_minutes, None);
        assert_eq!(stats.total_trips, 0);
        assert!(stats.routes_covered.is_empty());
    }

    #[test]
    fn test_coverage_complete() {
        let snap = snapshot(
            Some(1),
            vec![entity("1", trip(Some("A"))), entity("2", vehicle(Some("C")))],
        );
        let result = coverage(&snap, &["A", "C"]);
        assert!(result.complete);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_coverage_reports_missing_routes() {
        let snap = snapshot(Some(1), vec![entity("1", trip(Some("A")))]);
        let result = coverage(&snap, &["A", "C", "E"]);
        assert!(!result.complete);
        assert_eq!(
            result.missing.into_iter().collect::<Vec<_>>(),
            vec!["C".to_string(), "E".to_string()]
        );
    }

    #[test]
    fn test_coverage_with_no_expectations() {
        let snap = snapshot(Some(1), vec![]);
        let expected: [&str; 0] = [];
        assert!(coverage(&snap, &expected).complete);
    }
}
