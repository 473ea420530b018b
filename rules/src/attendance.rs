//! Daily attendance reconciliation.
//!
//! Every active resident ends the day with exactly one attendance record.
//! Residents who checked in already have a `present` row; everyone else gets
//! an `absent` row. The absence write is the gateway's conditional insert,
//! so a check-in that lands mid-run is never overwritten and a second run for
//! the same day marks nobody.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::GatewayError;
use crate::gateway::PersistenceGateway;
use crate::model::ResidentId;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileReport {
    pub date: NaiveDate,
    /// Active residents considered.
    pub active_count: usize,
    /// Absent rows this pass actually inserted.
    pub marked_absent_count: usize,
    /// Residents whose insert failed; a later run picks them up.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<ResidentId>,
}

impl ReconcileReport {
    /// Residents that already had a record for the day.
    pub fn already_recorded_count(&self) -> usize {
        self.active_count - self.marked_absent_count - self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Mark every active resident without a record for `today` as absent.
///
/// Fails without writing anything if the active-resident list cannot be
/// read. Individual insert failures are logged and collected in
/// [`ReconcileReport::failed`] without stopping the pass.
pub fn reconcile<G>(gateway: &G, today: NaiveDate) -> Result<ReconcileReport, GatewayError>
where
    G: PersistenceGateway + ?Sized,
{
    let residents = gateway.fetch_active_resident_ids().map_err(|e| {
        tracing::error!(date = %today, error = %e, "reconcile: failed to load active residents");
        e
    })?;

    let mut marked_absent_count = 0;
    let mut failed = Vec::new();

    for resident_id in &residents {
        match gateway.insert_absent_if_missing(*resident_id, today) {
            Ok(true) => marked_absent_count += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(
                    %resident_id,
                    date = %today,
                    error = %e,
                    "reconcile: absence insert failed, will retry next run"
                );
                failed.push(*resident_id);
            }
        }
    }

    let report = ReconcileReport {
        date: today,
        active_count: residents.len(),
        marked_absent_count,
        failed,
    };

    tracing::info!(
        date = %today,
        active = report.active_count,
        marked_absent = report.marked_absent_count,
        already_recorded = report.already_recorded_count(),
        failed = report.failed.len(),
        "Attendance reconciled"
    );

    Ok(report)
}
