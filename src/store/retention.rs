use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tracing::{info, warn};

use super::{FileKind, SnapshotStore};

/// What a pruning pass did. Failures are per file and never abort the pass.
#[derive(Debug, Default, Serialize)]
pub struct PruneReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl SnapshotStore {
    /// Deletes every managed file last modified more than `max_age` ago.
    pub fn prune(&self, max_age: Duration) -> PruneReport {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        self.prune_before(cutoff)
    }

    /// Deletes every managed file whose modification time is strictly before
    /// `cutoff`. Files at or after the cutoff are kept.
    pub fn prune_before(&self, cutoff: SystemTime) -> PruneReport {
        let mut report = PruneReport::default();

        for kind in FileKind::ALL {
            for path in self.entries(kind) {
                let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
                    Ok(modified) => modified,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Error reading file age");
                        report.failed.push(path);
                        continue;
                    }
                };

                if modified >= cutoff {
                    continue;
                }

                match fs::remove_file(&path) {
                    Ok(()) => {
                        info!(path = %path.display(), "Removed old file");
                        report.removed.push(path);
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Error removing file");
                        report.failed.push(path);
                    }
                }
            }
        }

        report
    }
}
