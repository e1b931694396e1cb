//! Runtime settings read from the environment.
//!
//! Binaries call `dotenvy::dotenv()` first so a local `.env` file can supply
//! any of these:
//!
//! | Variable                    | Default |
//! |-----------------------------|---------|
//! | `INGEST_DATA_DIR`           | `data`  |
//! | `INGEST_FETCH_TIMEOUT_SECS` | `30`    |
//! | `INGEST_FRESHNESS_POLICY`   | `legacy` |
//! | `INGEST_RETENTION_DAYS`     | `7`     |
//! | `INGEST_LINE_TABLE`         | built-in NYC table |
//! | `INGEST_FEED_BASE_URL`      | MTA endpoint |

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{IngestError, Result};
use crate::router::ChannelRouter;
use crate::validation::{FreshnessPolicy, ValidatorConfig};

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub data_dir: PathBuf,
    pub fetch_timeout: Duration,
    pub freshness: FreshnessPolicy,
    pub retention: Duration,
    pub line_table: Option<String>,
    pub feed_base_url: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            fetch_timeout: Duration::from_secs(30),
            freshness: FreshnessPolicy::Legacy,
            retention: Duration::from_secs(7 * 24 * 3600),
            line_table: None,
            feed_base_url: None,
        }
    }
}

impl IngestConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = lookup("INGEST_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("INGEST_FETCH_TIMEOUT_SECS") {
            let secs = parse_number("INGEST_FETCH_TIMEOUT_SECS", &secs)?;
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(policy) = lookup("INGEST_FRESHNESS_POLICY") {
            config.freshness = policy.parse()?;
        }
        if let Some(days) = lookup("INGEST_RETENTION_DAYS") {
            let days = parse_number("INGEST_RETENTION_DAYS", &days)?;
            config.retention = retention_from_days(days)?;
        }
        config.line_table = lookup("INGEST_LINE_TABLE");
        config.feed_base_url = lookup("INGEST_FEED_BASE_URL");

        Ok(config)
    }

    /// Loads the line table once; the result is passed around by reference.
    pub fn router(&self) -> Result<ChannelRouter> {
        let router = match &self.line_table {
            Some(path) => ChannelRouter::load(path)?,
            None => ChannelRouter::default(),
        };
        Ok(match &self.feed_base_url {
            Some(url) => router.with_base_url(url.clone()),
            None => router,
        })
    }

    pub fn validator(&self) -> ValidatorConfig {
        ValidatorConfig {
            freshness: self.freshness,
            ..Default::default()
        }
    }
}

/// Converts a retention window in days, rejecting values that overflow.
pub fn retention_from_days(days: u64) -> Result<Duration> {
    days.checked_mul(SECONDS_PER_DAY)
        .map(Duration::from_secs)
        .ok_or_else(|| IngestError::Configuration(format!("retention of {days} days is too large")))
}

const SECONDS_PER_DAY: u64 = 24 * 3600;

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        IngestError::Configuration(format!("{key} must be a whole number, got {value:?}"))
    })
}
