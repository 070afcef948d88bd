//! The reconciliation engine.
//!
//! One cycle, in order:
//!
//! ```text
//! replay pending ─► discover ─► invoke + publish (per unit) ─► barrier
//!                                                                 │
//!                 commit known set ◄── delete removed units ◄─────┘
//! ```
//!
//! Every collaborator failure is caught at the narrowest scope and recorded
//! in the [`CycleReport`]; `run_cycle` never returns an error. The known set
//! is written last, so an interrupted cycle leaves the previous snapshot in
//! place.

use crate::display::DisplayClient;
use crate::error::{ProducerError, SyncError};
use crate::known::KnownUnitsStore;
use crate::paths::validate_unit_name;
use crate::pending::{PendingBuffer, ReplayMode};
use crate::producer::{Producer, ProducerRegistry};
use crate::report::CycleReport;
use futures::StreamExt;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// EngineOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Upper bound for a single producer invocation.
    pub producer_timeout: Duration,
    /// Units invoked and published at once. 1 keeps the sequential order.
    pub concurrency: usize,
    pub replay: ReplayMode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            producer_timeout: Duration::from_secs(10),
            concurrency: 1,
            replay: ReplayMode::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-unit outcome
// ---------------------------------------------------------------------------

enum UnitOutcome {
    Published { unit: String },
    PublishFailed { unit: String, reason: String },
    InvocationFailed { label: String, source: ProducerError },
}

// ---------------------------------------------------------------------------
// ReconciliationEngine
// ---------------------------------------------------------------------------

pub struct ReconciliationEngine {
    registry: Arc<dyn ProducerRegistry>,
    display: Arc<dyn DisplayClient>,
    pending: Arc<PendingBuffer>,
    known: KnownUnitsStore,
    options: EngineOptions,
    cycle: Mutex<()>,
}

impl ReconciliationEngine {
    pub fn new(
        registry: Arc<dyn ProducerRegistry>,
        display: Arc<dyn DisplayClient>,
        pending: PendingBuffer,
        known: KnownUnitsStore,
        options: EngineOptions,
    ) -> Self {
        Self {
            registry,
            display,
            pending: Arc::new(pending),
            known,
            options,
            cycle: Mutex::new(()),
        }
    }

    pub fn pending(&self) -> &PendingBuffer {
        &self.pending
    }

    pub fn known(&self) -> &KnownUnitsStore {
        &self.known
    }

    /// Run one cycle, waiting for any cycle already in flight to finish first.
    pub async fn run_cycle(&self) -> CycleReport {
        let _guard = self.cycle.lock().await;
        self.reconcile().await
    }

    /// Run one cycle unless another is in flight, in which case the trigger
    /// is dropped and `None` is returned.
    pub async fn try_run_cycle(&self) -> Option<CycleReport> {
        let Ok(_guard) = self.cycle.try_lock() else {
            tracing::warn!("cycle already in progress; trigger coalesced");
            return None;
        };
        Some(self.reconcile().await)
    }

    async fn reconcile(&self) -> CycleReport {
        tracing::info!("starting widget update cycle");
        let mut report = CycleReport::begin();

        self.replay_pending(&mut report).await;

        let producers = self.discover(&mut report).await;
        let seen = self.publish_units(producers, &mut report).await;

        self.remove_stale(&seen, &mut report).await;

        if let Err(e) = self.known.save(&seen) {
            tracing::error!(error = %e, "could not commit known units");
            report.record(e);
        }
        report.known_units = seen.into_iter().collect();
        report.pending_remaining = self.pending.len();

        let report = report.finish();
        report.log_summary();
        report
    }

    // -----------------------------------------------------------------------
    // Step 1: replay
    // -----------------------------------------------------------------------

    async fn replay_pending(&self, report: &mut CycleReport) {
        let display = Arc::clone(&self.display);
        let drained = self
            .pending
            .drain_one_attempt_each(self.options.replay, move |entry| {
                let display = Arc::clone(&display);
                async move { display.publish(&entry.unit, &entry.slides).await }
            })
            .await;

        report.replayed = drained.delivered.into_iter().map(|e| e.unit).collect();
        for (unit, reason) in drained.failures {
            report.record(SyncError::Replay { unit, reason });
        }
        for e in drained.storage_errors {
            report.record(e);
        }
    }

    // -----------------------------------------------------------------------
    // Step 2: discover
    // -----------------------------------------------------------------------

    async fn discover(&self, report: &mut CycleReport) -> Vec<Arc<dyn Producer>> {
        let producers = match self.registry.discover().await {
            Ok(producers) => producers,
            Err(e) => {
                tracing::error!(error = %e, "producer discovery failed; continuing with none");
                report.record(SyncError::Discovery(e));
                Vec::new()
            }
        };
        if producers.is_empty() {
            tracing::warn!("no producers found");
            report.warnings.push("no producers found".to_string());
        }
        report.discovered = producers.len();
        producers
    }

    // -----------------------------------------------------------------------
    // Step 3: invoke and publish
    // -----------------------------------------------------------------------

    /// Returns the names that reached the display. All units have resolved
    /// by the time this returns.
    async fn publish_units(
        &self,
        producers: Vec<Arc<dyn Producer>>,
        report: &mut CycleReport,
    ) -> BTreeSet<String> {
        let concurrency = self.options.concurrency.max(1);
        let worker = UnitWorker {
            display: Arc::clone(&self.display),
            pending: Arc::clone(&self.pending),
            timeout: self.options.producer_timeout,
        };
        // Owned futures keep the cycle future `Send` for `tokio::spawn`.
        let outcomes: Vec<UnitOutcome> = futures::stream::iter(producers)
            .map(move |producer| {
                let worker = worker.clone();
                async move { worker.process(producer).await }
            })
            .buffered(concurrency)
            .boxed()
            .collect()
            .await;

        // Last report of a name wins when a name shows up twice.
        let mut reached: HashMap<String, bool> = HashMap::new();
        for outcome in outcomes {
            let (unit, ok) = match outcome {
                UnitOutcome::Published { unit } => {
                    report.published.push(unit.clone());
                    (unit, true)
                }
                UnitOutcome::PublishFailed { unit, reason } => {
                    report.record(SyncError::Publish {
                        unit: unit.clone(),
                        reason,
                    });
                    (unit, false)
                }
                UnitOutcome::InvocationFailed { label, source } => {
                    report.record(SyncError::ProducerInvocation {
                        unit: label,
                        source,
                    });
                    continue;
                }
            };
            if reached.insert(unit.clone(), ok).is_some() {
                tracing::warn!(unit = %unit, "unit reported by more than one producer; last one wins");
                report
                    .warnings
                    .push(format!("unit '{unit}' reported more than once"));
            }
        }

        reached
            .into_iter()
            .filter_map(|(unit, ok)| ok.then_some(unit))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Step 4: diff and delete
    // -----------------------------------------------------------------------

    async fn remove_stale(&self, seen: &BTreeSet<String>, report: &mut CycleReport) {
        let mut stale = self.known.load();
        // A replayed payload is on the display even though its unit may not
        // have been rediscovered.
        stale.extend(report.replayed.iter().cloned());
        let removed: Vec<String> = stale.difference(seen).cloned().collect();

        for unit in removed {
            tracing::info!(unit = %unit, "unit disappeared; removing from display");
            match self.display.delete(&unit).await {
                Ok(()) => report.removed.push(unit),
                Err(e) => {
                    tracing::error!(unit = %unit, error = %e, "delete failed; not retried");
                    report.record(SyncError::Delete {
                        unit,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// UnitWorker
// ---------------------------------------------------------------------------

/// Invokes one producer and delivers its widget.
#[derive(Clone)]
struct UnitWorker {
    display: Arc<dyn DisplayClient>,
    pending: Arc<PendingBuffer>,
    timeout: Duration,
}

impl UnitWorker {
    async fn process(&self, producer: Arc<dyn Producer>) -> UnitOutcome {
        let timeout = self.timeout;
        let widget = match tokio::time::timeout(timeout, producer.get_slides()).await {
            Ok(result) => result,
            Err(_) => Err(ProducerError::Timeout(timeout.as_secs())),
        }
        .and_then(|widget| {
            validate_unit_name(&widget.name)?;
            Ok(widget)
        });

        let widget = match widget {
            Ok(widget) => widget,
            Err(e) => {
                let label = producer.label();
                tracing::error!(producer = %label, error = %e, "producer failed; skipping unit");
                return UnitOutcome::InvocationFailed { label, source: e };
            }
        };

        match self.display.publish(&widget.name, &widget.slides).await {
            Ok(()) => {
                tracing::info!(unit = %widget.name, slides = widget.slides.len(), "widget updated");
                UnitOutcome::Published { unit: widget.name }
            }
            Err(e) => {
                tracing::error!(unit = %widget.name, error = %e, "publish failed; buffering payload");
                let mut reason = e.to_string();
                if let Err(store_err) = self.pending.append(&widget.name, widget.slides) {
                    tracing::error!(unit = %widget.name, error = %store_err, "could not buffer payload");
                    reason = format!("{reason}; payload not buffered: {store_err}");
                }
                UnitOutcome::PublishFailed {
                    unit: widget.name,
                    reason,
                }
            }
        }
    }
}

