//! Durable retry buffer for slide sets the display did not accept.
//!
//! Entries are tagged with their unit name so a replay after restart goes to
//! the right endpoint. The file is a JSON array of [`PendingEntry`] and is
//! rewritten atomically on every change; an unreadable file is treated as an
//! empty buffer.

use crate::error::{Result, SyncError};
use crate::io::{atomic_write, read_optional};
use crate::slide::{Slide, SlideSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// PendingEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub id: Uuid,
    pub unit: String,
    pub slides: SlideSet,
    pub queued_at: DateTime<Utc>,
}

impl PendingEntry {
    pub fn new(unit: impl Into<String>, slides: SlideSet) -> Self {
        Self {
            id: Uuid::new_v4(),
            unit: unit.into(),
            slides,
            queued_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ReplayMode
// ---------------------------------------------------------------------------

/// How a drain reacts to a failed delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayMode {
    /// Stop replaying for this cycle at the first failure.
    #[default]
    StopAtFirstFailure,
    /// Attempt every entry once regardless of earlier failures.
    AttemptEach,
}

// ---------------------------------------------------------------------------
// DrainReport
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DrainReport {
    /// Entries accepted by the display, in buffer order.
    pub delivered: Vec<PendingEntry>,
    /// Entries still stored after the drain, in buffer order.
    pub remaining: Vec<PendingEntry>,
    /// `(unit, reason)` for every failed delivery attempt.
    pub failures: Vec<(String, String)>,
    /// Storage problems hit while removing delivered entries.
    pub storage_errors: Vec<SyncError>,
}

// ---------------------------------------------------------------------------
// PendingBuffer
// ---------------------------------------------------------------------------

pub struct PendingBuffer {
    path: PathBuf,
    // Serialises read-modify-write cycles on the file; never held across an await.
    lock: Mutex<()>,
}

impl PendingBuffer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current entries in FIFO order. Missing or unreadable storage is empty.
    pub fn load(&self) -> Vec<PendingEntry> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.read_entries()
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue `slides` for `unit` and persist before returning.
    pub fn append(&self, unit: &str, slides: SlideSet) -> Result<PendingEntry> {
        let entry = PendingEntry::new(unit, slides);
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_entries();
        entries.push(entry.clone());
        self.write_entries(&entries)?;
        tracing::info!(
            unit,
            queued = entries.len(),
            path = %self.path.display(),
            "payload stored for redelivery"
        );
        Ok(entry)
    }

    /// Try to deliver every stored entry once, oldest first.
    ///
    /// Each delivered entry is removed from storage immediately. Failed
    /// entries stay where they are. With [`ReplayMode::StopAtFirstFailure`]
    /// the entries after the first failure are not attempted.
    pub async fn drain_one_attempt_each<F, Fut, E>(
        &self,
        mode: ReplayMode,
        mut publish: F,
    ) -> DrainReport
    where
        F: FnMut(PendingEntry) -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Display,
    {
        let mut report = DrainReport::default();
        let entries = self.load();
        if entries.is_empty() {
            return report;
        }
        tracing::info!(count = entries.len(), "replaying pending payloads");

        let mut stopped = false;
        for entry in entries {
            if stopped {
                report.remaining.push(entry);
                continue;
            }
            match publish(entry.clone()).await {
                Ok(()) => {
                    if let Err(e) = self.remove(entry.id) {
                        tracing::error!(unit = %entry.unit, error = %e, "could not drop delivered payload from buffer");
                        report.storage_errors.push(e);
                    }
                    tracing::info!(unit = %entry.unit, "pending payload delivered");
                    report.delivered.push(entry);
                }
                Err(e) => {
                    tracing::error!(unit = %entry.unit, error = %e, "pending payload still undeliverable");
                    report.failures.push((entry.unit.clone(), e.to_string()));
                    report.remaining.push(entry);
                    stopped = mode == ReplayMode::StopAtFirstFailure;
                }
            }
        }
        report
    }

    fn remove(&self, id: Uuid) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_entries();
        entries.retain(|e| e.id != id);
        self.write_entries(&entries)
    }

    fn read_entries(&self) -> Vec<PendingEntry> {
        let data = match read_optional(&self.path) {
            Ok(Some(data)) => data,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "pending buffer unreadable; treating as empty");
                return Vec::new();
            }
        };
        if data.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str::<Vec<PendingEntry>>(&data) {
            Ok(entries) => entries,
            Err(e) => {
                if serde_json::from_str::<Vec<Slide>>(&data).is_ok() {
                    tracing::warn!(
                        path = %self.path.display(),
                        "pending buffer holds untagged slides with no unit name; discarding them"
                    );
                } else {
                    tracing::warn!(path = %self.path.display(), error = %e, "pending buffer corrupt; treating as empty");
                }
                Vec::new()
            }
        }
    }

    fn write_entries(&self, entries: &[PendingEntry]) -> Result<()> {
        let data = serde_json::to_string_pretty(entries)?;
        atomic_write(&self.path, data.as_bytes()).map_err(|e| SyncError::Storage {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
