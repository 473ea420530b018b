//! The persistence boundary of the rules engine.
//!
//! Each method is one statement against the store. Implementations must be
//! safe to share across threads; the engine holds no locks of its own.

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::GatewayError;
use crate::model::{
    ClearanceRequest, NewNotification, NewPermission, Notification, PermissionRequest, ResidentId,
};

pub trait PersistenceGateway: Send + Sync {
    /// Ids of residents that are not suspended.
    fn fetch_active_resident_ids(&self) -> Result<Vec<ResidentId>, GatewayError>;

    fn has_attendance_record(
        &self,
        resident_id: ResidentId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError>;

    /// Insert an `absent` record unless any record already exists for the
    /// pair. The existence check and the write are one atomic step.
    ///
    /// Returns `true` if a row was inserted.
    fn insert_absent_if_missing(
        &self,
        resident_id: ResidentId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError>;

    /// The resident's requests still in `pending` status.
    fn fetch_pending_permissions(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<PermissionRequest>, GatewayError>;

    fn insert_permission(&self, request: NewPermission) -> Result<PermissionRequest, GatewayError>;

    fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, GatewayError>;

    /// The resident's clearance request in `pending` status, if any.
    fn fetch_open_clearance(
        &self,
        resident_id: ResidentId,
    ) -> Result<Option<ClearanceRequest>, GatewayError>;

    /// Create a `pending` clearance with both checks unset.
    ///
    /// Stores that enforce open-request uniqueness report a clash as
    /// [`GatewayError::Conflict`].
    fn insert_clearance(
        &self,
        resident_id: ResidentId,
        initiated_at: NaiveDateTime,
    ) -> Result<ClearanceRequest, GatewayError>;
}

impl<G: PersistenceGateway + ?Sized> PersistenceGateway for std::sync::Arc<G> {
    fn fetch_active_resident_ids(&self) -> Result<Vec<ResidentId>, GatewayError> {
        (**self).fetch_active_resident_ids()
    }

    fn has_attendance_record(
        &self,
        resident_id: ResidentId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError> {
        (**self).has_attendance_record(resident_id, date)
    }

    fn insert_absent_if_missing(
        &self,
        resident_id: ResidentId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError> {
        (**self).insert_absent_if_missing(resident_id, date)
    }

    fn fetch_pending_permissions(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<PermissionRequest>, GatewayError> {
        (**self).fetch_pending_permissions(resident_id)
    }

    fn insert_permission(&self, request: NewPermission) -> Result<PermissionRequest, GatewayError> {
        (**self).insert_permission(request)
    }

    fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, GatewayError> {
        (**self).insert_notification(notification)
    }

    fn fetch_open_clearance(
        &self,
        resident_id: ResidentId,
    ) -> Result<Option<ClearanceRequest>, GatewayError> {
        (**self).fetch_open_clearance(resident_id)
    }

    fn insert_clearance(
        &self,
        resident_id: ResidentId,
        initiated_at: NaiveDateTime,
    ) -> Result<ClearanceRequest, GatewayError> {
        (**self).insert_clearance(resident_id, initiated_at)
    }
}
