//! Conversion of decoded GTFS-RT messages into [`Snapshot`] records.
//!
//! Pure transformation, no I/O. Unset optional fields become `None`; empty
//! strings are treated as unset since the wire format cannot tell them
//! apart. Stop-time `stop_sequence`/`stop_id` fall back to the schema
//! defaults (`0` and `""`), which loses the unset/zero distinction.

use chrono::{DateTime, SubsecRound, Utc};

use crate::gtfs_rt;
use crate::model::{
    Alert, Entity, EntityPayload, FeedHeader, Position, Snapshot, StopTimeUpdate, TripUpdate,
    VehiclePosition,
};

/// Builds a [`Snapshot`] for `channel` from a decoded feed message.
///
/// `fetched_at` is truncated to whole seconds, the precision it is stored at.
pub fn canonicalize(
    channel: &str,
    feed: &gtfs_rt::FeedMessage,
    fetched_at: DateTime<Utc>,
) -> Snapshot {
    Snapshot {
        channel: channel.to_string(),
        fetched_at: fetched_at.trunc_subsecs(0),
        header: FeedHeader {
            version: feed.header.gtfs_realtime_version.clone(),
            timestamp: feed.header.timestamp,
            incrementality: feed.header.incrementality().as_str_name().to_string(),
        },
        entities: feed.entity.iter().map(canonical_entity).collect(),
    }
}

fn canonical_entity(entity: &gtfs_rt::FeedEntity) -> Entity {
    let payload = if let Some(trip_update) = &entity.trip_update {
        EntityPayload::TripUpdate(canonical_trip_update(trip_update))
    } else if let Some(vehicle) = &entity.vehicle {
        EntityPayload::Vehicle(canonical_vehicle(vehicle))
    } else if let Some(alert) = &entity.alert {
        EntityPayload::Alert(canonical_alert(alert))
    } else {
        EntityPayload::Empty
    };

    Entity {
        id: entity.id.clone(),
        payload,
    }
}

fn canonical_trip_update(trip_update: &gtfs_rt::TripUpdate) -> TripUpdate {
    let trip = &trip_update.trip;
    TripUpdate {
        trip_id: non_empty(trip.trip_id.as_deref()),
        route_id: non_empty(trip.route_id.as_deref()),
        start_time: non_empty(trip.start_time.as_deref()),
        start_date: non_empty(trip.start_date.as_deref()),
        schedule_relationship: trip.schedule_relationship().as_str_name().to_string(),
        stop_time_updates: trip_update
            .stop_time_update
            .iter()
            .map(|stu| StopTimeUpdate {
                stop_sequence: stu.stop_sequence(),
                stop_id: stu.stop_id().to_string(),
                arrival_time: stu.arrival.as_ref().and_then(|e| e.time),
                departure_time: stu.departure.as_ref().and_then(|e| e.time),
            })
            .collect(),
    }
}

fn canonical_vehicle(vehicle: &gtfs_rt::VehiclePosition) -> VehiclePosition {
    let trip = vehicle.trip.as_ref();
    VehiclePosition {
        trip_id: non_empty(trip.and_then(|t| t.trip_id.as_deref())),
        route_id: non_empty(trip.and_then(|t| t.route_id.as_deref())),
        position: vehicle.position.as_ref().map(|p| Position {
            latitude: Some(f64::from(p.latitude)),
            longitude: Some(f64::from(p.longitude)),
        }),
        current_stop_sequence: vehicle.current_stop_sequence,
        current_status: vehicle.current_status().as_str_name().to_string(),
        timestamp: vehicle.timestamp,
        stop_id: non_empty(vehicle.stop_id.as_deref()),
    }
}

fn canonical_alert(alert: &gtfs_rt::Alert) -> Alert {
    Alert {
        cause: alert.cause().as_str_name().to_string(),
        effect: alert.effect().as_str_name().to_string(),
        header_text: first_translation(alert.header_text.as_ref()),
        description_text: first_translation(alert.description_text.as_ref()),
    }
}

/// Keeps only the first translation of a localized string.
fn first_translation(text: Option<&gtfs_rt::TranslatedString>) -> Option<String> {
    text?.translation.first().map(|t| t.text.clone())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}
