use std::sync::Arc;

use chrono::NaiveDate;

use crate::attendance::{self, ReconcileReport};
use crate::clearance;
use crate::clock::Clock;
use crate::errors::{ClearanceError, GatewayError, PermissionError};
use crate::gateway::PersistenceGateway;
use crate::model::{
    ClearanceRequest, Complaint, Notification, PermissionCandidate, PermissionRequest, ResidentId,
};
use crate::notification;
use crate::permission;

/// Entry point for the API layer and the scheduler.
///
/// Owns a gateway and a clock; every operation is one short
/// read/validate/write sequence, so the engine is freely shared behind an
/// `Arc` across request handlers and the scheduler task.
pub struct RulesEngine {
    gateway: Arc<dyn PersistenceGateway>,
    clock: Arc<dyn Clock>,
}

impl RulesEngine {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, clock: Arc<dyn Clock>) -> Self {
        Self { gateway, clock }
    }

    pub fn gateway(&self) -> &dyn PersistenceGateway {
        self.gateway.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Reconcile attendance for `date`.
    pub fn reconcile(&self, date: NaiveDate) -> Result<ReconcileReport, GatewayError> {
        attendance::reconcile(self.gateway.as_ref(), date)
    }

    /// Reconcile attendance for the clock's current date.
    pub fn reconcile_today(&self) -> Result<ReconcileReport, GatewayError> {
        self.reconcile(self.clock.today())
    }

    pub fn submit_permission(
        &self,
        candidate: PermissionCandidate,
    ) -> Result<PermissionRequest, PermissionError> {
        permission::submit(self.gateway.as_ref(), self.clock.as_ref(), candidate)
    }

    pub fn on_complaint_replied(
        &self,
        complaint: &Complaint,
        new_reply: Option<&str>,
    ) -> Result<Option<Notification>, GatewayError> {
        notification::on_complaint_replied(
            self.gateway.as_ref(),
            self.clock.as_ref(),
            complaint,
            new_reply,
        )
    }

    pub fn initiate_clearance(
        &self,
        resident_id: ResidentId,
    ) -> Result<ClearanceRequest, ClearanceError> {
        clearance::initiate(self.gateway.as_ref(), self.clock.as_ref(), resident_id)
    }
}
