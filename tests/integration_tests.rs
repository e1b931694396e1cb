use chrono::{Duration, Utc};
use prost::Message;
use transit_feed_ingest::canonical::canonicalize;
use transit_feed_ingest::gtfs_rt::{
    Alert, FeedEntity, FeedHeader, FeedMessage, Position, TranslatedString, TripDescriptor,
    TripUpdate, VehiclePosition, translated_string::Translation,
    trip_update::{StopTimeEvent, StopTimeUpdate},
};
use transit_feed_ingest::model::EntityPayload;
use transit_feed_ingest::parser::parse_feed;
use transit_feed_ingest::router::{Channel, ChannelRouter};
use transit_feed_ingest::store::{FileKind, SnapshotStore};
use transit_feed_ingest::validation::{
    FreshnessPolicy, ValidatorConfig, coverage, statistics, validate,
};

fn sample_feed(timestamp: u64) -> FeedMessage {
    FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: "1.0".to_string(),
            timestamp: Some(timestamp),
            incrementality: Some(0),
            feed_version: None,
        },
        entity: vec![
            FeedEntity {
                id: "000001L".to_string(),
                trip_update: Some(TripUpdate {
                    trip: TripDescriptor {
                        trip_id: Some("047650_L..S".to_string()),
                        route_id: Some("L".to_string()),
                        start_date: Some("20240101".to_string()),
                        ..Default::default()
                    },
                    stop_time_update: vec![StopTimeUpdate {
                        stop_sequence: Some(1),
                        stop_id: Some("L01S".to_string()),
                        arrival: Some(StopTimeEvent {
                            time: Some(timestamp as i64 + 120),
                            ..Default::default()
                        }),
                        departure: Some(StopTimeEvent {
                            time: Some(timestamp as i64 + 150),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
                ..Default::default()
            },
            FeedEntity {
                id: "000002L".to_string(),
                vehicle: Some(VehiclePosition {
                    trip: Some(TripDescriptor {
                        trip_id: Some("047650_L..S".to_string()),
                        route_id: Some("L".to_string()),
                        ..Default::default()
                    }),
                    position: Some(Position {
                        latitude: 40.75,
                        longitude: -73.875,
                        bearing: None,
                        odometer: None,
                        speed: None,
                    }),
                    current_stop_sequence: Some(1),
                    timestamp: Some(timestamp),
                    stop_id: Some("L01S".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            FeedEntity {
                id: "000003L".to_string(),
                alert: Some(Alert {
                    header_text: Some(TranslatedString {
                        translation: vec![Translation {
                            text: "L trains are delayed".to_string(),
                            language: Some("en".to_string()),
                        }],
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ],
    }
}

#[test]
fn test_full_pipeline() {
    let tmp = tempfile::tempdir().unwrap();
    let store = SnapshotStore::open(tmp.path()).unwrap();
    let router = ChannelRouter::default();

    let channels = router.resolve_many(&["L"]).unwrap();
    assert_eq!(channels.into_iter().collect::<Vec<_>>(), vec![Channel::L]);

    let now = Utc::now();
    let bytes = sample_feed((now - Duration::seconds(45)).timestamp() as u64).encode_to_vec();
    let raw_path = store.persist_raw(Channel::L.as_str(), &bytes).unwrap();

    let feed = parse_feed(&store.load_raw(&raw_path).unwrap()).expect("Failed to parse feed");
    let snapshot = canonicalize(Channel::L.as_str(), &feed, now);

    let result = validate(&snapshot, &ValidatorConfig::default());
    assert!(result.is_valid, "{:?}", result.errors);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let stats = statistics(&snapshot);
    assert_eq!(stats.total_trips, 1);
    assert_eq!(stats.total_vehicles, 1);
    assert_eq!(stats.total_alerts, 1);
    assert!(stats.data_age_minutes.unwrap() < 2.0);

    assert!(coverage(&snapshot, &router.lines_for(Channel::L)).complete);

    store.persist_canonical(Channel::L.as_str(), &snapshot).unwrap();
    let latest = store.latest_snapshot(Channel::L.as_str()).unwrap();
    assert_eq!(latest, snapshot);
    let EntityPayload::Alert(alert) = &latest.entities[2].payload else {
        panic!("expected alert");
    };
    assert_eq!(alert.header_text.as_deref(), Some("L trains are delayed"));
    assert_eq!(alert.cause, "UNKNOWN_CAUSE");
}

#[test]
fn test_stale_feed_policies() {
    let stale = (Utc::now() - Duration::minutes(40)).timestamp() as u64;
    let feed = parse_feed(&sample_feed(stale).encode_to_vec()).unwrap();
    let snapshot = canonicalize("l", &feed, Utc::now());

    let legacy = validate(&snapshot, &ValidatorConfig::default());
    assert!(legacy.is_valid);
    assert_eq!(legacy.warnings.len(), 1);
    assert!(legacy.warnings[0].contains("may be stale"));

    let strict = validate(
        &snapshot,
        &ValidatorConfig {
            freshness: FreshnessPolicy::Strict,
            ..Default::default()
        },
    );
    assert!(!strict.is_valid);
    assert_eq!(strict.errors.len(), 1);
    assert_eq!(strict.warnings.len(), 1);
}

#[test]
fn test_feed_without_timestamp_fails_structurally() {
    let mut message = sample_feed(0);
    message.header.timestamp = None;
    let feed = parse_feed(&message.encode_to_vec()).unwrap();
    let snapshot = canonicalize("l", &feed, Utc::now());

    let result = validate(&snapshot, &ValidatorConfig::default());
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);
    assert!(result.warnings.is_empty());

    let stats = statistics(&snapshot);
    assert_eq!(stats.last_update, None);
    assert_eq!(stats.data_age_minutes, None);
}

#[test]
fn test_store_listing_and_summary_after_persist() {
    let tmp = tempfile::tempdir().unwrap();
    let store = SnapshotStore::open(tmp.path()).unwrap();
    let feed = sample_feed(Utc::now().timestamp() as u64);
    let snapshot = canonicalize("ace", &feed, Utc::now());

    store.persist_raw("ace", &feed.encode_to_vec()).unwrap();
    store.persist_canonical("ace", &snapshot).unwrap();
    store.persist_sample("ace", &snapshot, Some("fixture")).unwrap();

    let listing = store.list(None);
    for kind in FileKind::ALL {
        assert_eq!(listing[&kind].len(), 1, "{kind}");
        assert!(store.latest("ace", kind).is_some());
    }

    let summary = store.summary();
    assert_eq!(summary.channels.into_iter().collect::<Vec<_>>(), vec!["ace".to_string()]);
}
