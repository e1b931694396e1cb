//! Filesystem-backed snapshot store.
//!
//! Layout under the root directory:
//!
//! ```text
//! raw/      {channel}_{YYYYMMDD_HHMMSS}.pb      exact feed bytes
//! parsed/   {channel}_{YYYYMMDD_HHMMSS}.json    canonical Snapshot
//! samples/  {channel}_sample_{...}.json         curated fixtures
//! ```
//!
//! Files are written once and never modified. Writes are independent: a
//! crash between persisting the raw bytes and the canonical snapshot leaves
//! one without the other. Two writers persisting the same channel within
//! the same second collide and the later write wins.

mod naming;
mod retention;
mod summary;

pub use naming::{FileKind, StoredFile};
pub use retention::PruneReport;
pub use summary::StoreSummary;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::error::{IngestError, Result};
use crate::model::Snapshot;
use naming::{SAMPLE_SUFFIX, TIMESTAMP_FORMAT, file_name};

/// Metadata wrapper written around curated sample payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub description: String,
    pub timestamp: String,
    #[serde(alias = "feed_name")]
    pub channel: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Opens a store rooted at `root`, creating the managed directories.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { root: root.into() };
        for kind in FileKind::ALL {
            let dir = store.dir(kind);
            fs::create_dir_all(&dir).map_err(|e| IngestError::storage(&dir, e))?;
        }
        debug!(root = %store.root.display(), "Snapshot store ready");
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, kind: FileKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Writes the exact feed bytes under `raw/`.
    pub fn persist_raw(&self, channel: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.write(FileKind::Raw, channel, Utc::now(), bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Saved raw feed data");
        Ok(path)
    }

    /// Writes `snapshot` as pretty JSON under `parsed/`. Time values are
    /// stored as epoch seconds.
    pub fn persist_canonical(&self, channel: &str, snapshot: &Snapshot) -> Result<PathBuf> {
        let body = serde_json::to_vec_pretty(snapshot)?;
        let path = self.write(FileKind::Parsed, channel, Utc::now(), &body)?;
        info!(path = %path.display(), entities = snapshot.entities.len(), "Saved parsed feed data");
        Ok(path)
    }

    /// Wraps `payload` with description/timestamp/channel metadata and writes
    /// it under `samples/`.
    pub fn persist_sample(
        &self,
        channel: &str,
        payload: &impl Serialize,
        description: Option<&str>,
    ) -> Result<PathBuf> {
        let now = Utc::now();
        let record = SampleRecord {
            description: description
                .map(str::to_string)
                .unwrap_or_else(|| format!("Sample data for {channel}")),
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            channel: channel.to_string(),
            data: serde_json::to_value(payload)?,
        };
        let body = serde_json::to_vec_pretty(&record)?;
        let prefix = format!("{channel}_{SAMPLE_SUFFIX}");
        let path = self.write(FileKind::Samples, &prefix, now, &body)?;
        info!(path = %path.display(), "Saved sample data");
        Ok(path)
    }

    fn write(
        &self,
        kind: FileKind,
        prefix: &str,
        at: DateTime<Utc>,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        let path = self.dir(kind).join(file_name(prefix, kind, at));
        fs::write(&path, bytes).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to write file");
            IngestError::storage(&path, e)
        })?;
        Ok(path)
    }

    pub fn load_raw(&self, path: &Path) -> Option<Vec<u8>> {
        logged_load(path, "raw feed data", || {
            fs::read(path).map_err(|e| IngestError::storage(path, e))
        })
    }

    pub fn load_canonical(&self, path: &Path) -> Option<Snapshot> {
        logged_load(path, "parsed feed data", || read_json(path))
    }

    pub fn load_sample(&self, path: &Path) -> Option<SampleRecord> {
        logged_load(path, "sample data", || read_json(path))
    }

    /// File names per kind, sorted, filtered by the kind's extension.
    /// `None` lists every kind.
    pub fn list(&self, kind: Option<FileKind>) -> BTreeMap<FileKind, Vec<String>> {
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => FileKind::ALL.to_vec(),
        };

        kinds
            .into_iter()
            .map(|kind| {
                let mut names: Vec<String> = self
                    .entries(kind)
                    .into_iter()
                    .filter(|path| kind.has_extension(path))
                    .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
                    .collect();
                names.sort();
                (kind, names)
            })
            .collect()
    }

    /// Every file of `kind` whose name follows the naming convention.
    pub fn scan(&self, kind: FileKind) -> Vec<StoredFile> {
        self.entries(kind)
            .into_iter()
            .filter_map(|path| {
                let parsed = StoredFile::parse(kind, &path);
                if parsed.is_none() {
                    debug!(path = %path.display(), "Skipping file outside naming convention");
                }
                parsed
            })
            .collect()
    }

    /// Most recent file for `channel`, judged by the timestamp recorded in
    /// the file name. Ties go to the greater file name.
    pub fn latest(&self, channel: &str, kind: FileKind) -> Option<PathBuf> {
        self.scan(kind)
            .into_iter()
            .filter(|file| file.belongs_to(channel))
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.path.file_name().cmp(&b.path.file_name()))
            })
            .map(|file| file.path)
    }

    /// Loads the most recent canonical snapshot for `channel`.
    pub fn latest_snapshot(&self, channel: &str) -> Option<Snapshot> {
        let path = self.latest(channel, FileKind::Parsed)?;
        self.load_canonical(&path)
    }

    /// Paths directly inside the directory for `kind`. Listing failures are
    /// logged and yield nothing.
    fn entries(&self, kind: FileKind) -> Vec<PathBuf> {
        let dir = self.dir(kind);
        match fs::read_dir(&dir) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to list directory");
                Vec::new()
            }
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read(path).map_err(|e| IngestError::storage(path, e))?;
    Ok(serde_json::from_slice(&content)?)
}

fn logged_load<T>(path: &Path, what: &str, load: impl FnOnce() -> Result<T>) -> Option<T> {
    match load() {
        Ok(value) => {
            info!(path = %path.display(), "Loaded {what}");
            Some(value)
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Error loading {what}");
            None
        }
    }
}
