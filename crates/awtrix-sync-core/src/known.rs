use crate::error::{Result, SyncError};
use crate::io::{atomic_write, read_optional};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Unit names that reached the display in the last committed cycle,
/// persisted as a JSON array of strings.
pub struct KnownUnitsStore {
    path: PathBuf,
}

impl KnownUnitsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or corrupt storage yields the empty set.
    pub fn load(&self) -> BTreeSet<String> {
        let data = match read_optional(&self.path) {
            Ok(Some(data)) => data,
            Ok(None) => return BTreeSet::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "known units unreadable; starting empty");
                return BTreeSet::new();
            }
        };
        match serde_json::from_str::<Vec<String>>(&data) {
            Ok(names) => names.into_iter().collect(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "known units corrupt; starting empty");
                BTreeSet::new()
            }
        }
    }

    /// Replace the snapshot atomically.
    pub fn save(&self, units: &BTreeSet<String>) -> Result<()> {
        let data = serde_json::to_string_pretty(units)?;
        atomic_write(&self.path, data.as_bytes()).map_err(|e| SyncError::Storage {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
