//! Canonical domain records produced from a decoded feed.
//!
//! These types are what the validator inspects and what the store writes to
//! `parsed/*.json`. All time values serialize as epoch seconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One canonicalized, timestamped capture of a channel's feed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub channel: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub fetched_at: DateTime<Utc>,
    pub header: FeedHeader,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedHeader {
    #[serde(default)]
    pub version: String,
    /// Feed creation time in POSIX seconds, as reported upstream.
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub incrementality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Empty when the upstream entity carried no id.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub payload: EntityPayload,
}

/// What an entity carries. `Empty` covers upstream entities with none of the
/// three supported payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityPayload {
    #[default]
    Empty,
    TripUpdate(TripUpdate),
    Vehicle(VehiclePosition),
    Alert(Alert),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripUpdate {
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
    pub start_time: Option<String>,
    pub start_date: Option<String>,
    #[serde(default)]
    pub schedule_relationship: String,
    #[serde(default)]
    pub stop_time_updates: Vec<StopTimeUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopTimeUpdate {
    #[serde(default)]
    pub stop_sequence: u32,
    #[serde(default)]
    pub stop_id: String,
    pub arrival_time: Option<i64>,
    pub departure_time: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehiclePosition {
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
    pub position: Option<Position>,
    pub current_stop_sequence: Option<u32>,
    #[serde(default)]
    pub current_status: String,
    pub timestamp: Option<u64>,
    pub stop_id: Option<String>,
}

/// Reported coordinates. Either side may be missing in stored snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub cause: String,
    #[serde(default)]
    pub effect: String,
    pub header_text: Option<String>,
    pub description_text: Option<String>,
}

impl Snapshot {
    pub fn trip_updates(&self) -> impl Iterator<Item = &TripUpdate> {
        self.entities.iter().filter_map(|e| match &e.payload {
            EntityPayload::TripUpdate(t) => Some(t),
            _ => None,
        })
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &VehiclePosition> {
        self.entities.iter().filter_map(|e| match &e.payload {
            EntityPayload::Vehicle(v) => Some(v),
            _ => None,
        })
    }

    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.entities.iter().filter_map(|e| match &e.payload {
            EntityPayload::Alert(a) => Some(a),
            _ => None,
        })
    }

    /// Header timestamp, treating `0` as unset.
    pub fn feed_timestamp(&self) -> Option<u64> {
        self.header.timestamp.filter(|ts| *ts != 0)
    }
}
