use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use super::{FileKind, SnapshotStore};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Overview of everything currently held in the store.
#[derive(Debug, Serialize)]
pub struct StoreSummary {
    pub directories: BTreeMap<FileKind, PathBuf>,
    pub file_counts: BTreeMap<FileKind, usize>,
    /// Rounded to two decimals.
    pub total_size_mb: f64,
    /// Distinct file name prefixes before the first `_`.
    pub channels: BTreeSet<String>,
}

impl SnapshotStore {
    pub fn summary(&self) -> StoreSummary {
        let mut directories = BTreeMap::new();
        let mut file_counts = BTreeMap::new();
        let mut total_bytes = 0u64;
        let mut channels = BTreeSet::new();

        for kind in FileKind::ALL {
            let entries = self.entries(kind);
            directories.insert(kind, self.dir(kind));
            file_counts.insert(kind, entries.len());

            for path in entries {
                match fs::metadata(&path) {
                    Ok(meta) => {
                        total_bytes += meta.len();
                        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                            if let Some(channel) = name.split('_').next() {
                                channels.insert(channel.to_string());
                            }
                        }
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "Error getting file size"),
                }
            }
        }

        StoreSummary {
            directories,
            file_counts,
            total_size_mb: (total_bytes as f64 / BYTES_PER_MIB * 100.0).round() / 100.0,
            channels,
        }
    }
}
