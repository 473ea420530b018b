//! Daily attendance reconciliation trigger.
//!
//! [`Scheduler`] decides *whether* a run is due from a wall-clock reading;
//! [`run`] is the tokio loop that polls the engine's clock and performs the
//! runs until shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use residence_rules::{ReconcileReport, RulesEngine};
use tokio::sync::watch;

/// Once-per-day firing state.
///
/// A date is due once the local time reaches `reconcile_at` and that date
/// has not completed a run yet. Days the process was down for are not
/// back-filled.
#[derive(Debug, Clone)]
pub struct Scheduler {
    reconcile_at: NaiveTime,
    last_run: Option<NaiveDate>,
}

impl Scheduler {
    pub fn new(reconcile_at: NaiveTime) -> Self {
        Self {
            reconcile_at,
            last_run: None,
        }
    }

    pub fn reconcile_at(&self) -> NaiveTime {
        self.reconcile_at
    }

    /// Last date that completed a run.
    pub fn last_run(&self) -> Option<NaiveDate> {
        self.last_run
    }

    /// The date to reconcile at `now`, if any.
    pub fn due(&self, now: NaiveDateTime) -> Option<NaiveDate> {
        let today = now.date();
        if now.time() < self.reconcile_at {
            return None;
        }
        match self.last_run {
            Some(last) if last >= today => None,
            _ => Some(today),
        }
    }

    pub fn mark_ran(&mut self, date: NaiveDate) {
        self.last_run = Some(self.last_run.map_or(date, |last| last.max(date)));
    }
}

/// Poll the engine's clock every `poll_interval` and reconcile each due day
/// until `shutdown` flips to `true` (or its sender is dropped).
///
/// A run that could not fetch the roster, or left some residents
/// unmarked, is retried on the next poll; reconciliation is idempotent.
/// Returns the scheduler state at exit.
pub async fn run(
    engine: Arc<RulesEngine>,
    mut scheduler: Scheduler,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Scheduler {
    tracing::info!(
        reconcile_at = %scheduler.reconcile_at(),
        poll_interval_secs = poll_interval.as_secs(),
        "Attendance scheduler started"
    );

    loop {
        if *shutdown.borrow() {
            break;
        }

        if let Some(date) = scheduler.due(engine.clock().now()) {
            match reconcile_blocking(Arc::clone(&engine), date).await {
                Some(report) if report.is_complete() => scheduler.mark_ran(date),
                Some(report) => {
                    tracing::warn!(
                        date = %date,
                        failed = report.failed.len(),
                        "Reconcile incomplete, retrying on next poll"
                    );
                }
                None => {}
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!(last_run = ?scheduler.last_run(), "Attendance scheduler stopped");
    scheduler
}

/// Run one reconcile on the blocking pool. `None` when the run failed as a
/// whole; the error is logged here.
async fn reconcile_blocking(engine: Arc<RulesEngine>, date: NaiveDate) -> Option<ReconcileReport> {
    match tokio::task::spawn_blocking(move || engine.reconcile(date)).await {
        Ok(Ok(report)) => Some(report),
        Ok(Err(e)) => {
            tracing::error!(date = %date, code = e.code(), error = %e, "Reconcile failed");
            None
        }
        Err(e) => {
            tracing::error!(date = %date, error = %e, "Reconcile task panicked");
            None
        }
    }
}
