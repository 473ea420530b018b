//! Residence records read and written by the rules engine.
//!
//! These are the rows the engine sees through the
//! [`PersistenceGateway`](crate::gateway::PersistenceGateway); the wider
//! profile/complaint subsystems own many more columns that never reach here.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Primary key of a resident profile.
    ResidentId
);
row_id!(PermissionId);
row_id!(ComplaintId);
row_id!(NotificationId);
row_id!(ClearanceId);

/// The slice of a resident profile the engine cares about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resident {
    pub id: ResidentId,
    pub suspended: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Attendance
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            _ => None,
        }
    }
}

/// One resident's attendance for one calendar day.
///
/// At most one record exists per `(resident_id, date)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub resident_id: ResidentId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

// ─────────────────────────────────────────────────────────────────────────────
// Permissions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    /// Returning after curfew on the given days.
    Late,
    /// Away from the residence overnight.
    Travel,
}

impl PermissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Late => "late",
            Self::Travel => "travel",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "late" => Some(Self::Late),
            "travel" => Some(Self::Travel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl PermissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// A persisted leave/travel permission request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionRequest {
    pub id: PermissionId,
    pub resident_id: ResidentId,
    pub kind: PermissionKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: PermissionStatus,
    pub created_at: NaiveDateTime,
}

impl PermissionRequest {
    /// Closed-interval intersection with `[start, end]`.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end_date && end >= self.start_date
    }
}

/// What a resident submits; validated before anything is written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionCandidate {
    pub resident_id: ResidentId,
    pub kind: PermissionKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

/// Insert payload for a permission row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPermission {
    pub resident_id: ResidentId,
    pub kind: PermissionKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: PermissionStatus,
    pub created_at: NaiveDateTime,
}

// ─────────────────────────────────────────────────────────────────────────────
// Complaints & notifications
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Complaint {
    pub id: ComplaintId,
    pub resident_id: ResidentId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_reply: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub resident_id: ResidentId,
    pub title: String,
    pub body: String,
    pub complaint_id: ComplaintId,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

/// Insert payload for a notification row. Always stored unread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub resident_id: ResidentId,
    pub title: String,
    pub body: String,
    pub complaint_id: ComplaintId,
    pub created_at: NaiveDateTime,
}

// ─────────────────────────────────────────────────────────────────────────────
// Clearance
// ─────────────────────────────────────────────────────────────────────────────

/// Checkout lifecycle. A resident with no row is in the implicit `absent` state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClearanceStatus {
    Pending,
    Completed,
}

impl ClearanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Status implied by the two staff checks: completed once both pass.
    pub fn for_checks(room_check_passed: bool, keys_returned: bool) -> Self {
        if room_check_passed && keys_returned {
            Self::Completed
        } else {
            Self::Pending
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClearanceRequest {
    pub id: ClearanceId,
    pub resident_id: ResidentId,
    pub status: ClearanceStatus,
    pub room_check_passed: bool,
    pub keys_returned: bool,
    pub initiated_at: NaiveDateTime,
}

impl ClearanceRequest {
    pub fn checks_complete(&self) -> bool {
        self.room_check_passed && self.keys_returned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        match NaiveDate::from_ymd_opt(y, m, d) {
            Some(d) => d,
            None => panic!("invalid test date {y}-{m}-{d}"),
        }
    }

    #[test]
    fn enums_serialize_snake_case() {
        let json = serde_json::json!({
            "id": 7,
            "resident_id": 3,
            "kind": "travel",
            "start_date": "2026-02-01",
            "end_date": "2026-02-05",
            "reason": "family visit",
            "status": "pending",
            "created_at": "2026-01-30T09:15:00"
        });

        let req: PermissionRequest = match serde_json::from_value(json) {
            Ok(req) => req,
            Err(err) => panic!("Failed to deserialize PermissionRequest JSON: {err}"),
        };
        assert_eq!(req.id, PermissionId(7));
        assert_eq!(req.kind, PermissionKind::Travel);
        assert_eq!(req.status, PermissionStatus::Pending);
    }

    #[test]
    fn status_strings_parse_back() {
        for status in [
            PermissionStatus::Pending,
            PermissionStatus::Approved,
            PermissionStatus::Rejected,
        ] {
            assert_eq!(PermissionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AttendanceStatus::parse("late"), None);
    }

    #[test]
    fn overlap_is_closed_interval() {
        let existing = PermissionRequest {
            id: PermissionId(1),
            resident_id: ResidentId(1),
            kind: PermissionKind::Late,
            start_date: date(2026, 2, 1),
            end_date: date(2026, 2, 5),
            reason: String::new(),
            status: PermissionStatus::Pending,
            created_at: date(2026, 1, 1).and_hms_opt(0, 0, 0).unwrap_or_default(),
        };

        assert!(existing.overlaps(date(2026, 2, 5), date(2026, 2, 6)));
        assert!(existing.overlaps(date(2026, 1, 20), date(2026, 2, 1)));
        assert!(!existing.overlaps(date(2026, 2, 6), date(2026, 2, 10)));
        assert!(!existing.overlaps(date(2026, 1, 20), date(2026, 1, 31)));
    }

    #[test]
    fn clearance_completes_only_when_both_checks_pass() {
        assert_eq!(ClearanceStatus::for_checks(true, false), ClearanceStatus::Pending);
        assert_eq!(ClearanceStatus::for_checks(false, true), ClearanceStatus::Pending);
        assert_eq!(ClearanceStatus::for_checks(true, true), ClearanceStatus::Completed);
        assert!(ClearanceStatus::Completed.is_terminal());
    }
}
