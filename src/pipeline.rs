//! One ingestion cycle: fetch → decode → canonicalize → validate → persist.
//!
//! Steps run strictly in sequence. Every failure is logged and turns into an
//! absent result for that channel; only unknown lines are surfaced as errors,
//! before anything is fetched.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::canonical::canonicalize;
use crate::error::Result;
use crate::fetch::{HttpClient, fetch_channel};
use crate::model::Snapshot;
use crate::output::{log_statistics, log_validation};
use crate::parser::parse_feed;
use crate::router::{Channel, ChannelRouter};
use crate::store::SnapshotStore;
use crate::validation::{Statistics, ValidationResult, ValidatorConfig, statistics, validate};

/// Everything produced for one channel in one cycle.
#[derive(Debug)]
pub struct IngestReport {
    pub channel: Channel,
    pub snapshot: Snapshot,
    pub validation: ValidationResult,
    pub statistics: Statistics,
    /// `None` when raw persistence is disabled, the write failed, or the
    /// bytes did not come from a fetch.
    pub raw_path: Option<PathBuf>,
    /// `None` when the canonical write failed.
    pub parsed_path: Option<PathBuf>,
}

pub struct Ingestor<'a, C> {
    client: C,
    router: &'a ChannelRouter,
    store: SnapshotStore,
    validator: ValidatorConfig,
    timeout: Duration,
    persist_raw: bool,
}

impl<'a, C: HttpClient> Ingestor<'a, C> {
    pub fn new(client: C, router: &'a ChannelRouter, store: SnapshotStore) -> Self {
        Self {
            client,
            router,
            store,
            validator: ValidatorConfig::default(),
            timeout: Duration::from_secs(30),
            persist_raw: true,
        }
    }

    pub fn with_validator(mut self, validator: ValidatorConfig) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_raw_persistence(mut self, enabled: bool) -> Self {
        self.persist_raw = enabled;
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Fetches and processes a single channel.
    #[tracing::instrument(skip(self), fields(channel = %channel))]
    pub async fn ingest_channel(&self, channel: Channel) -> Option<IngestReport> {
        let bytes = fetch_channel(&self.client, self.router, channel, self.timeout).await?;
        let raw_path = if self.persist_raw {
            self.store.persist_raw(channel.as_str(), &bytes).ok()
        } else {
            None
        };

        let mut report = self.ingest_bytes(channel, &bytes, Utc::now())?;
        report.raw_path = raw_path;
        Some(report)
    }

    /// Decodes, validates and persists bytes that are already on hand, such
    /// as a file read back from `raw/`. The raw bytes are not written again.
    pub fn ingest_bytes(
        &self,
        channel: Channel,
        bytes: &[u8],
        fetched_at: DateTime<Utc>,
    ) -> Option<IngestReport> {
        let feed = match parse_feed(bytes) {
            Ok(feed) => feed,
            Err(e) => {
                error!(channel = %channel, error = %e, "Error parsing feed data");
                return None;
            }
        };

        let snapshot = canonicalize(channel.as_str(), &feed, fetched_at);
        let validation = validate(&snapshot, &self.validator);
        let statistics = statistics(&snapshot);
        log_validation(channel.as_str(), &validation);
        log_statistics(channel.as_str(), &statistics);

        let parsed_path = self
            .store
            .persist_canonical(channel.as_str(), &snapshot)
            .ok();

        Some(IngestReport {
            channel,
            snapshot,
            validation,
            statistics,
            raw_path: None,
            parsed_path,
        })
    }

    /// Ingests the channels carrying `lines`, fetching each channel once.
    ///
    /// # Errors
    ///
    /// Fails without fetching anything if any line is unknown.
    pub async fn ingest_lines<S: AsRef<str>>(
        &self,
        lines: &[S],
    ) -> Result<BTreeMap<Channel, IngestReport>> {
        let channels = self.router.resolve_many(lines)?;
        Ok(self.ingest_channels(channels).await)
    }

    /// Ingests every channel referenced by the line table.
    pub async fn ingest_all(&self) -> BTreeMap<Channel, IngestReport> {
        self.ingest_channels(self.router.channels()).await
    }

    async fn ingest_channels(
        &self,
        channels: impl IntoIterator<Item = Channel>,
    ) -> BTreeMap<Channel, IngestReport> {
        let mut reports = BTreeMap::new();
        for channel in channels {
            match self.ingest_channel(channel).await {
                Some(report) => {
                    reports.insert(channel, report);
                }
                None => error!(channel = %channel, "Failed to ingest feed"),
            }
        }
        info!(ingested = reports.len(), "Ingest cycle finished");
        reports
    }
}
