//! File naming for stored snapshots: `{channel}_{YYYYMMDD_HHMMSS}.{ext}`.
//!
//! The timestamp is fixed width, so names sort chronologically, but lookups
//! parse it back into a [`DateTime`] instead of relying on string order.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::IngestError;

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Suffix appended to the channel for curated sample files.
pub(crate) const SAMPLE_SUFFIX: &str = "sample";

/// Which managed directory a file lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Raw,
    Parsed,
    Samples,
}

impl FileKind {
    pub const ALL: [FileKind; 3] = [FileKind::Raw, FileKind::Parsed, FileKind::Samples];

    pub fn dir_name(&self) -> &'static str {
        match self {
            FileKind::Raw => "raw",
            FileKind::Parsed => "parsed",
            FileKind::Samples => "samples",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Raw => "pb",
            FileKind::Parsed | FileKind::Samples => "json",
        }
    }

    pub(crate) fn has_extension(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(self.extension())
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for FileKind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(FileKind::Raw),
            "parsed" => Ok(FileKind::Parsed),
            "samples" | "sample" => Ok(FileKind::Samples),
            other => Err(IngestError::Configuration(format!("unknown data type: {other}"))),
        }
    }
}

/// A stored file whose name follows the naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Everything before the timestamp, e.g. `ace` or `ace_sample`.
    pub channel: String,
    pub kind: FileKind,
    pub created_at: DateTime<Utc>,
    pub path: PathBuf,
}

impl StoredFile {
    /// Parses `path`'s file name. Returns `None` for names that do not follow
    /// the convention or carry the wrong extension for `kind`.
    pub fn parse(kind: FileKind, path: &Path) -> Option<Self> {
        if !kind.has_extension(path) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;

        let mut parts = stem.rsplitn(3, '_');
        let time = parts.next()?;
        let date = parts.next()?;
        let channel = parts.next()?;
        if channel.is_empty() {
            return None;
        }

        let created_at =
            NaiveDateTime::parse_from_str(&format!("{date}_{time}"), TIMESTAMP_FORMAT)
                .ok()?
                .and_utc();

        Some(Self {
            channel: channel.to_string(),
            kind,
            created_at,
            path: path.to_path_buf(),
        })
    }

    /// `true` if the file belongs to `channel`, including derived outputs
    /// such as `{channel}_sample`.
    pub fn belongs_to(&self, channel: &str) -> bool {
        match self.channel.strip_prefix(channel) {
            Some(rest) => rest.is_empty() || rest.starts_with('_'),
            None => false,
        }
    }
}

pub(crate) fn file_name(prefix: &str, kind: FileKind, at: DateTime<Utc>) -> String {
    format!("{prefix}_{}.{}", at.format(TIMESTAMP_FORMAT), kind.extension())
}
