//! Line → channel routing.
//!
//! Each upstream feed (a [`Channel`]) carries several subway lines. The
//! mapping is immutable configuration: either the built-in NYC subway table
//! or a JSON override loaded once at startup, then passed around by
//! reference.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{IngestError, Result};

/// Base URL for MTA GTFS-RT feeds. Each channel appends its own suffix.
pub const MTA_FEED_BASE_URL: &str =
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs";

/// One upstream realtime feed. The set is closed: anything else is rejected
/// before a request is ever made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "ace")]
    Ace,
    #[serde(rename = "bdfm")]
    Bdfm,
    #[serde(rename = "g")]
    G,
    #[serde(rename = "jz")]
    Jz,
    #[serde(rename = "nqrw")]
    Nqrw,
    #[serde(rename = "l")]
    L,
    #[serde(rename = "123456")]
    Irt,
    #[serde(rename = "sir")]
    Sir,
}

impl Channel {
    pub const ALL: [Channel; 8] = [
        Channel::Ace,
        Channel::Bdfm,
        Channel::G,
        Channel::Jz,
        Channel::Nqrw,
        Channel::L,
        Channel::Irt,
        Channel::Sir,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Ace => "ace",
            Channel::Bdfm => "bdfm",
            Channel::G => "g",
            Channel::Jz => "jz",
            Channel::Nqrw => "nqrw",
            Channel::L => "l",
            Channel::Irt => "123456",
            Channel::Sir => "sir",
        }
    }

    /// Path suffix appended to the feed base URL.
    fn url_suffix(&self) -> &'static str {
        match self {
            Channel::Ace => "-ace",
            Channel::Bdfm => "-bdfm",
            Channel::G => "-g",
            Channel::Jz => "-jz",
            Channel::Nqrw => "-nqrw",
            Channel::L => "-l",
            Channel::Irt => "",
            Channel::Sir => "-si",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| IngestError::UnknownChannel(s.to_string()))
    }
}

/// Built-in line table for the NYC subway feeds.
static DEFAULT_LINES: &[(&str, Channel)] = &[
    ("A", Channel::Ace),
    ("C", Channel::Ace),
    ("E", Channel::Ace),
    ("H", Channel::Ace),
    ("FS", Channel::Ace),
    ("B", Channel::Bdfm),
    ("D", Channel::Bdfm),
    ("F", Channel::Bdfm),
    ("M", Channel::Bdfm),
    ("G", Channel::G),
    ("J", Channel::Jz),
    ("Z", Channel::Jz),
    ("N", Channel::Nqrw),
    ("Q", Channel::Nqrw),
    ("R", Channel::Nqrw),
    ("W", Channel::Nqrw),
    ("L", Channel::L),
    ("1", Channel::Irt),
    ("2", Channel::Irt),
    ("3", Channel::Irt),
    ("4", Channel::Irt),
    ("5", Channel::Irt),
    ("6", Channel::Irt),
    ("7", Channel::Irt),
    ("S", Channel::Irt),
    ("SIR", Channel::Sir),
];

/// Resolves user-facing line identifiers to channels and channels to feed URLs.
#[derive(Debug, Clone)]
pub struct ChannelRouter {
    lines: BTreeMap<String, Channel>,
    base_url: String,
}

impl Default for ChannelRouter {
    fn default() -> Self {
        Self {
            lines: DEFAULT_LINES
                .iter()
                .map(|(line, channel)| (line.to_string(), *channel))
                .collect(),
            base_url: MTA_FEED_BASE_URL.to_string(),
        }
    }
}

impl ChannelRouter {
    /// Loads a line table from a JSON file at `path`.
    ///
    /// The file is a plain object mapping lines to channel names:
    /// ```json
    /// { "A": "ace", "L": "l", "SIR": "sir" }
    /// ```
    /// Channel names outside the closed [`Channel`] set are rejected.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| IngestError::storage(path, e))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let entries: HashMap<String, String> = serde_json::from_str(content)?;
        let mut lines = BTreeMap::new();
        for (line, channel) in entries {
            let channel = channel.parse::<Channel>().map_err(|_| {
                IngestError::Configuration(format!("line {line} maps to unknown channel {channel}"))
            })?;
            lines.insert(line, channel);
        }
        if lines.is_empty() {
            return Err(IngestError::Configuration("line table is empty".into()));
        }
        Ok(Self {
            lines,
            base_url: MTA_FEED_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn resolve(&self, line_id: &str) -> Result<Channel> {
        self.lines
            .get(line_id)
            .copied()
            .ok_or_else(|| IngestError::UnknownLine(line_id.to_string()))
    }

    /// Resolves every line, collapsing lines that share a channel so each
    /// channel is fetched once. Fails on the first unknown line.
    pub fn resolve_many<S: AsRef<str>>(&self, line_ids: &[S]) -> Result<BTreeSet<Channel>> {
        line_ids
            .iter()
            .map(|line| self.resolve(line.as_ref()))
            .collect()
    }

    /// Like [`resolve_many`](Self::resolve_many) but skips unknown lines with a warning.
    pub fn resolve_many_lenient<S: AsRef<str>>(&self, line_ids: &[S]) -> BTreeSet<Channel> {
        let mut channels = BTreeSet::new();
        for line in line_ids {
            match self.resolve(line.as_ref()) {
                Ok(channel) => {
                    channels.insert(channel);
                }
                Err(_) => warn!(line = line.as_ref(), "Unknown subway line, skipping"),
            }
        }
        channels
    }

    /// Channels referenced by the line table, in stable order.
    pub fn channels(&self) -> BTreeSet<Channel> {
        self.lines.values().copied().collect()
    }

    pub fn lines_for(&self, channel: Channel) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(_, c)| **c == channel)
            .map(|(line, _)| line.as_str())
            .collect()
    }

    pub fn feed_url(&self, channel: Channel) -> String {
        format!("{}{}", self.base_url, channel.url_suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_lines() {
        let router = ChannelRouter::default();
        assert_eq!(router.resolve("A").unwrap(), Channel::Ace);
        assert_eq!(router.resolve("N").unwrap(), Channel::Nqrw);
        assert_eq!(router.resolve("7").unwrap(), Channel::Irt);
        assert_eq!(router.resolve("SIR").unwrap(), Channel::Sir);
    }

    #[test]
    fn test_resolve_is_total_and_deterministic_over_table() {
        let router = ChannelRouter::default();
        for (line, channel) in DEFAULT_LINES {
            assert_eq!(router.resolve(line).unwrap(), *channel);
            assert_eq!(router.resolve(line).unwrap(), router.resolve(line).unwrap());
        }
    }

    #[test]
    fn test_resolve_unknown_line() {
        let router = ChannelRouter::default();
        let err = router.resolve("X").unwrap_err();
        assert!(matches!(err, IngestError::UnknownLine(ref l) if l == "X"));
        assert!(err.is_configuration());
        // lookups are case sensitive
        assert!(router.resolve("sir").is_err());
    }

    #[test]
    fn test_resolve_many_deduplicates() {
        let router = ChannelRouter::default();
        let channels = router.resolve_many(&["1", "2", "3", "A", "C"]).unwrap();
        assert_eq!(channels.len(), 2);
        assert!(channels.contains(&Channel::Irt));
        assert!(channels.contains(&Channel::Ace));
    }

    #[test]
    fn test_resolve_many_fails_on_unknown() {
        let router = ChannelRouter::default();
        assert!(router.resolve_many(&["A", "nope"]).is_err());
        let lenient = router.resolve_many_lenient(&["A", "nope"]);
        assert_eq!(lenient.into_iter().collect::<Vec<_>>(), vec![Channel::Ace]);
    }

    #[test]
    fn test_channel_round_trips_through_str() {
        for channel in Channel::ALL {
            assert_eq!(channel.as_str().parse::<Channel>().unwrap(), channel);
        }
        assert!("xyz".parse::<Channel>().is_err());
    }

    #[test]
    fn test_feed_urls() {
        let router = ChannelRouter::default();
        assert_eq!(router.feed_url(Channel::Irt), MTA_FEED_BASE_URL);
        assert!(router.feed_url(Channel::Sir).ends_with("gtfs-si"));
        let router = router.with_base_url("http://localhost/feed");
        assert_eq!(router.feed_url(Channel::L), "http://localhost/feed-l");
    }

    #[test]
    fn test_from_json_table() {
        let router = ChannelRouter::from_json(r#"{"X1": "ace", "X2": "ace"}"#).unwrap();
        assert_eq!(router.resolve("X1").unwrap(), Channel::Ace);
        assert!(router.resolve("A").is_err());
        assert_eq!(router.channels().len(), 1);
        assert_eq!(router.lines_for(Channel::Ace), vec!["X1", "X2"]);
    }

    #[test]
    fn test_from_json_rejects_unknown_channel() {
        let err = ChannelRouter::from_json(r#"{"X1": "moon"}"#).unwrap_err();
        assert!(err.is_configuration());
    }
}
