use crate::error::SyncError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failure categories a cycle can absorb without aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Replay,
    Discovery,
    Invocation,
    Publish,
    Delete,
    Storage,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replay => "replay",
            Self::Discovery => "discovery",
            Self::Invocation => "invocation",
            Self::Publish => "publish",
            Self::Delete => "delete",
            Self::Storage => "storage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleFailure {
    pub kind: FailureKind,
    /// Unit name, or the producer label when the unit never reported a name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub message: String,
}

/// Outcome of one reconciliation cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Units whose buffered payload was delivered during replay.
    pub replayed: Vec<String>,
    /// Entries left in the pending buffer once the cycle finished.
    pub pending_remaining: usize,
    pub discovered: usize,
    pub published: Vec<String>,
    pub removed: Vec<String>,
    /// The known set as committed at the end of the cycle.
    pub known_units: Vec<String>,
    pub failures: Vec<CycleFailure>,
    pub warnings: Vec<String>,
}

impl CycleReport {
    pub(crate) fn begin() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            replayed: Vec::new(),
            pending_remaining: 0,
            discovered: 0,
            published: Vec::new(),
            removed: Vec::new(),
            known_units: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record a failure the cycle absorbed.
    pub(crate) fn record(&mut self, error: SyncError) {
        let (kind, unit) = match &error {
            SyncError::Replay { unit, .. } => (FailureKind::Replay, Some(unit.clone())),
            SyncError::Discovery(_) => (FailureKind::Discovery, None),
            SyncError::ProducerInvocation { unit, .. } => {
                (FailureKind::Invocation, Some(unit.clone()))
            }
            SyncError::InvalidSlide(_) | SyncError::InvalidColor(_) => {
                (FailureKind::Invocation, None)
            }
            SyncError::Publish { unit, .. } => (FailureKind::Publish, Some(unit.clone())),
            SyncError::Delete { unit, .. } => (FailureKind::Delete, Some(unit.clone())),
            SyncError::Storage { .. }
            | SyncError::Config(_)
            | SyncError::Io(_)
            | SyncError::Yaml(_)
            | SyncError::Json(_) => (FailureKind::Storage, None),
        };
        self.failures.push(CycleFailure {
            kind,
            unit,
            message: error.to_string(),
        });
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.warnings.is_empty()
    }

    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &CycleFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    pub fn log_summary(&self) {
        let elapsed_ms = (self.finished_at - self.started_at).num_milliseconds();
        if self.failures.is_empty() {
            tracing::info!(
                published = self.published.len(),
                removed = self.removed.len(),
                replayed = self.replayed.len(),
                pending = self.pending_remaining,
                elapsed_ms,
                "cycle complete"
            );
        } else {
            tracing::warn!(
                published = self.published.len(),
                removed = self.removed.len(),
                replayed = self.replayed.len(),
                pending = self.pending_remaining,
                failures = self.failures.len(),
                elapsed_ms,
                "cycle complete with failures"
            );
        }
    }
}
