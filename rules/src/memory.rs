//! In-memory [`PersistenceGateway`] for tests.
//!
//! Behaves like the SQLite store for the operations the engine uses and
//! adds the external mutations (check-in, staff decisions) plus fault
//! injection so failure paths can be driven deterministically.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::GatewayError;
use crate::gateway::PersistenceGateway;
use crate::model::{
    AttendanceRecord, AttendanceStatus, ClearanceId, ClearanceRequest, ClearanceStatus,
    NewNotification, NewPermission, Notification, NotificationId, PermissionId,
    PermissionRequest, PermissionStatus, Resident, ResidentId,
};

#[derive(Default)]
struct State {
    next_id: i64,
    residents: BTreeMap<ResidentId, Resident>,
    attendance: BTreeMap<(ResidentId, NaiveDate), AttendanceStatus>,
    permissions: Vec<PermissionRequest>,
    notifications: Vec<Notification>,
    clearances: Vec<ClearanceRequest>,
    faults: Faults,
}

#[derive(Default)]
struct Faults {
    resident_fetch: bool,
    attendance_writes: HashSet<ResidentId>,
    notification_writes: bool,
    clearance_conflict_once: bool,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── External mutations ───────────────────────────────────────────────

    pub fn add_resident(&self, suspended: bool) -> ResidentId {
        let mut state = self.lock();
        let id = ResidentId(state.next_id());
        state.residents.insert(id, Resident { id, suspended });
        id
    }

    pub fn set_suspended(&self, resident_id: ResidentId, suspended: bool) {
        if let Some(r) = self.lock().residents.get_mut(&resident_id) {
            r.suspended = suspended;
        }
    }

    /// Resident check-in; upgrades an earlier absent mark for the day.
    pub fn check_in(&self, resident_id: ResidentId, date: NaiveDate) {
        self.lock()
            .attendance
            .insert((resident_id, date), AttendanceStatus::Present);
    }

    pub fn decide_permission(&self, id: PermissionId, status: PermissionStatus) {
        if let Some(p) = self.lock().permissions.iter_mut().find(|p| p.id == id) {
            p.status = status;
        }
    }

    pub fn record_clearance_checks(
        &self,
        id: ClearanceId,
        room_check_passed: bool,
        keys_returned: bool,
    ) {
        if let Some(c) = self.lock().clearances.iter_mut().find(|c| c.id == id) {
            c.room_check_passed = room_check_passed;
            c.keys_returned = keys_returned;
            c.status = ClearanceStatus::for_checks(room_check_passed, keys_returned);
        }
    }

    // ── Inspection ───────────────────────────────────────────────────────

    pub fn attendance(&self, resident_id: ResidentId, date: NaiveDate) -> Option<AttendanceStatus> {
        self.lock().attendance.get(&(resident_id, date)).copied()
    }

    pub fn attendance_rows(&self) -> Vec<AttendanceRecord> {
        self.lock()
            .attendance
            .iter()
            .map(|(&(resident_id, date), &status)| AttendanceRecord {
                resident_id,
                date,
                status,
            })
            .collect()
    }

    pub fn permissions(&self) -> Vec<PermissionRequest> {
        self.lock().permissions.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    pub fn clearances(&self) -> Vec<ClearanceRequest> {
        self.lock().clearances.clone()
    }

    // ── Fault injection ──────────────────────────────────────────────────

    pub fn fail_resident_fetch(&self) {
        self.lock().faults.resident_fetch = true;
    }

    pub fn fail_attendance_writes_for(&self, resident_id: ResidentId) {
        self.lock().faults.attendance_writes.insert(resident_id);
    }

    pub fn fail_notification_writes(&self) {
        self.lock().faults.notification_writes = true;
    }

    /// Next `insert_clearance` reports a write conflict, as a racing
    /// initiate would against a store with a uniqueness index.
    pub fn conflict_on_next_clearance_insert(&self) {
        self.lock().faults.clearance_conflict_once = true;
    }

    pub fn clear_failures(&self) {
        self.lock().faults = Faults::default();
    }
}

impl PersistenceGateway for MemoryGateway {
    fn fetch_active_resident_ids(&self) -> Result<Vec<ResidentId>, GatewayError> {
        let state = self.lock();
        if state.faults.resident_fetch {
            return Err(GatewayError::storage("residents table unavailable"));
        }
        Ok(state
            .residents
            .values()
            .filter(|r| !r.suspended)
            .map(|r| r.id)
            .collect())
    }

    fn has_attendance_record(
        &self,
        resident_id: ResidentId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError> {
        Ok(self.lock().attendance.contains_key(&(resident_id, date)))
    }

    fn insert_absent_if_missing(
        &self,
        resident_id: ResidentId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError> {
        let mut state = self.lock();
        if state.faults.attendance_writes.contains(&resident_id) {
            return Err(GatewayError::storage(format!(
                "attendance write failed for resident {resident_id}"
            )));
        }
        if state.attendance.contains_key(&(resident_id, date)) {
            return Ok(false);
        }
        state
            .attendance
            .insert((resident_id, date), AttendanceStatus::Absent);
        Ok(true)
    }

    fn fetch_pending_permissions(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<PermissionRequest>, GatewayError> {
        Ok(self
            .lock()
            .permissions
            .iter()
            .filter(|p| p.resident_id == resident_id && p.status == PermissionStatus::Pending)
            .cloned()
            .collect())
    }

    fn insert_permission(&self, request: NewPermission) -> Result<PermissionRequest, GatewayError> {
        let mut state = self.lock();
        let row = PermissionRequest {
            id: PermissionId(state.next_id()),
            resident_id: request.resident_id,
            kind: request.kind,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason,
            status: request.status,
            created_at: request.created_at,
        };
        state.permissions.push(row.clone());
        Ok(row)
    }

    fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, GatewayError> {
        let mut state = self.lock();
        if state.faults.notification_writes {
            return Err(GatewayError::storage("notifications table unavailable"));
        }
        let row = Notification {
            id: NotificationId(state.next_id()),
            resident_id: notification.resident_id,
            title: notification.title,
            body: notification.body,
            complaint_id: notification.complaint_id,
            is_read: false,
            created_at: notification.created_at,
        };
        state.notifications.push(row.clone());
        Ok(row)
    }

    fn fetch_open_clearance(
        &self,
        resident_id: ResidentId,
    ) -> Result<Option<ClearanceRequest>, GatewayError> {
        Ok(self
            .lock()
            .clearances
            .iter()
            .find(|c| c.resident_id == resident_id && c.status == ClearanceStatus::Pending)
            .copied())
    }

    fn insert_clearance(
        &self,
        resident_id: ResidentId,
        initiated_at: NaiveDateTime,
    ) -> Result<ClearanceRequest, GatewayError> {
        let mut state = self.lock();
        if std::mem::take(&mut state.faults.clearance_conflict_once)
            || state
                .clearances
                .iter()
                .any(|c| c.resident_id == resident_id && c.status == ClearanceStatus::Pending)
        {
            return Err(GatewayError::conflict(format!(
                "open clearance exists for resident {resident_id}"
            )));
        }
        let row = ClearanceRequest {
            id: ClearanceId(state.next_id()),
            resident_id,
            status: ClearanceStatus::Pending,
            room_check_passed: false,
            keys_returned: false,
            initiated_at,
        };
        state.clearances.push(row);
        Ok(row)
    }
}
