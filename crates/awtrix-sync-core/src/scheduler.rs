//! Periodic and manual cycle triggering.
//!
//! A single task owns the timer and the command receiver, so timer ticks and
//! manual updates are processed one after the other and never overlap.

use crate::engine::ReconciliationEngine;
use crate::report::CycleReport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run a cycle now.
    Update,
    /// Finish the in-flight cycle, if any, and stop.
    Shutdown,
}

pub struct Scheduler;

impl Scheduler {
    /// Spawn the scheduler task. One cycle runs immediately, then one per
    /// `interval` and one per [`Command::Update`].
    pub fn start(engine: Arc<ReconciliationEngine>, interval: Duration) -> SchedulerHandle {
        let (tx, mut rx) = mpsc::channel::<Command>(8);
        let (report_tx, report_rx) = mpsc::unbounded_channel::<CycleReport>();

        let task = tokio::spawn(async move {
            tracing::info!(interval_secs = interval.as_secs(), "scheduler started");
            let _ = report_tx.send(engine.run_cycle().await);

            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let report = tokio::select! {
                    biased;
                    cmd = rx.recv() => match cmd {
                        Some(Command::Update) => {
                            tracing::info!("manual update triggered");
                            engine.run_cycle().await
                        }
                        Some(Command::Shutdown) | None => break,
                    },
                    _ = ticker.tick() => engine.run_cycle().await,
                };
                let _ = report_tx.send(report);
            }
            tracing::info!("scheduler stopped");
        });

        SchedulerHandle {
            tx,
            reports: report_rx,
            task,
        }
    }
}

pub struct SchedulerHandle {
    tx: mpsc::Sender<Command>,
    reports: mpsc::UnboundedReceiver<CycleReport>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Request a manual cycle. Returns `false` once the scheduler has stopped.
    pub async fn trigger(&self) -> bool {
        self.tx.send(Command::Update).await.is_ok()
    }

    /// A cloneable sender for other tasks (e.g. a console reader).
    pub fn commands(&self) -> mpsc::Sender<Command> {
        self.tx.clone()
    }

    /// Next finished cycle report, or `None` after the scheduler stopped.
    pub async fn next_report(&mut self) -> Option<CycleReport> {
        self.reports.recv().await
    }

    /// Stop after the in-flight cycle and wait for the task to exit.
    pub async fn shutdown(self) {
        let _ = self.tx.send(Command::Shutdown).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "scheduler task ended abnormally");
        }
    }

    /// Wait for the scheduler to stop on its own (a `Shutdown` sent through
    /// [`commands`](Self::commands)).
    pub async fn join(self) {
        let Self { tx, task, .. } = self;
        drop(tx);
        if let Err(e) = task.await {
            tracing::error!(error = %e, "scheduler task ended abnormally");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
