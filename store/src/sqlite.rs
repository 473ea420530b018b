//! SQLite-backed [`PersistenceGateway`].
//!
//! Every gateway call is a single statement on one connection guarded by a
//! mutex. Several `SqliteGateway`s may open the same file (e.g. the
//! scheduler process and an API worker); SQLite's own locking plus the
//! schema's unique keys keep the attendance and clearance invariants.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};

use residence_rules::errors::GatewayError;
use residence_rules::gateway::PersistenceGateway;
use residence_rules::model::{
    AttendanceRecord, AttendanceStatus, ClearanceId, ClearanceRequest, ClearanceStatus, Complaint,
    ComplaintId, NewNotification, NewPermission, Notification, NotificationId, PermissionId,
    PermissionKind, PermissionRequest, PermissionStatus, ResidentId,
};

/// Embedded schema, applied on open.
const SCHEMA_SQL: &str = include_str!("../RESIDENCE_SCHEMA.sql");

/// How long a statement waits on another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const PERMISSION_COLUMNS: &str =
    "id, resident_id, kind, start_date, end_date, reason, status, created_at";
const CLEARANCE_COLUMNS: &str =
    "id, resident_id, status, room_check_passed, keys_returned, initiated_at";
const NOTIFICATION_COLUMNS: &str =
    "id, resident_id, title, body, complaint_id, is_read, created_at";

pub struct SqliteGateway {
    conn: Mutex<Connection>,
}

impl SqliteGateway {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self, GatewayError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                GatewayError::storage_with_source(
                    format!("failed to create db directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            GatewayError::storage_with_source(format!("failed to open db at {}", path.display()), e)
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| GatewayError::storage_with_source("failed to set busy timeout", e))?;
        let mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| GatewayError::storage_with_source("failed to enable WAL", e))?;

        Self::init(&conn)?;

        tracing::debug!(path = %path.display(), journal_mode = %mode, "Residence store opened");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, GatewayError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| GatewayError::storage_with_source("failed to open in-memory db", e))?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init(conn: &Connection) -> Result<(), GatewayError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| GatewayError::storage_with_source("failed to enable foreign keys", e))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| GatewayError::storage_with_source("failed to apply schema", e))?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // The connection holds no half-written state across a panic; each
        // call is a single statement.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes owned by the API layer (profiles, check-in, staff tooling)
    // ─────────────────────────────────────────────────────────────────────────

    pub fn insert_resident(&self, name: &str, suspended: bool) -> Result<ResidentId, GatewayError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO residents (name, suspended) VALUES (?1, ?2)",
            params![name, suspended],
        )
        .map_err(|e| GatewayError::storage_with_source("failed to insert resident", e))?;
        Ok(ResidentId(conn.last_insert_rowid()))
    }

    pub fn set_suspended(&self, resident_id: ResidentId, suspended: bool) -> Result<(), GatewayError> {
        self.conn()
            .execute(
                "UPDATE residents SET suspended = ?2 WHERE id = ?1",
                params![resident_id.0, suspended],
            )
            .map_err(|e| GatewayError::storage_with_source("failed to update suspension", e))?;
        Ok(())
    }

    /// Record a check-in for `date`. A check-in after the day was already
    /// reconciled replaces the absent mark.
    pub fn record_check_in(&self, resident_id: ResidentId, date: NaiveDate) -> Result<(), GatewayError> {
        self.conn()
            .execute(
                r#"
                INSERT INTO attendance (resident_id, date, status)
                VALUES (?1, ?2, 'present')
                ON CONFLICT(resident_id, date) DO UPDATE SET status = 'present'
                "#,
                params![resident_id.0, date],
            )
            .map_err(|e| GatewayError::storage_with_source("failed to record check-in", e))?;
        Ok(())
    }

    /// All attendance rows for `date`, ordered by resident.
    pub fn attendance_for(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, GatewayError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT resident_id, date, status FROM attendance WHERE date = ?1 ORDER BY resident_id",
            )
            .map_err(|e| GatewayError::storage_with_source("failed to prepare attendance query", e))?;
        let rows = stmt
            .query_map(params![date], |row| {
                Ok(AttendanceRecord {
                    resident_id: ResidentId(row.get(0)?),
                    date: row.get(1)?,
                    status: parse_column(row, 2, AttendanceStatus::parse)?,
                })
            })
            .and_then(Iterator::collect)
            .map_err(|e| GatewayError::storage_with_source("failed to read attendance", e))?;
        Ok(rows)
    }

    /// Staff decision on a pending request. Returns `false` if the request
    /// does not exist or was already decided.
    pub fn decide_permission(
        &self,
        id: PermissionId,
        decision: PermissionStatus,
    ) -> Result<bool, GatewayError> {
        if decision == PermissionStatus::Pending {
            return Err(GatewayError::storage("a decision must be approved or rejected"));
        }
        let changed = self
            .conn()
            .execute(
                "UPDATE permission_requests SET status = ?2 WHERE id = ?1 AND status = 'pending'",
                params![id.0, decision.as_str()],
            )
            .map_err(|e| GatewayError::storage_with_source("failed to decide permission", e))?;
        Ok(changed == 1)
    }

    pub fn insert_complaint(&self, resident_id: ResidentId, title: &str) -> Result<Complaint, GatewayError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO complaints (resident_id, title) VALUES (?1, ?2)",
            params![resident_id.0, title],
        )
        .map_err(|e| GatewayError::storage_with_source("failed to insert complaint", e))?;
        Ok(Complaint {
            id: ComplaintId(conn.last_insert_rowid()),
            resident_id,
            title: title.to_string(),
            admin_reply: None,
        })
    }

    /// Store a staff reply (or clear it with `None`) and return the updated complaint.
    pub fn set_complaint_reply(
        &self,
        id: ComplaintId,
        reply: Option<&str>,
    ) -> Result<Option<Complaint>, GatewayError> {
        let conn = self.conn();
        conn.execute(
            "UPDATE complaints SET admin_reply = ?2 WHERE id = ?1",
            params![id.0, reply],
        )
        .map_err(|e| GatewayError::storage_with_source("failed to store complaint reply", e))?;
        conn.query_row(
            "SELECT id, resident_id, title, admin_reply FROM complaints WHERE id = ?1",
            params![id.0],
            |row| {
                Ok(Complaint {
                    id: ComplaintId(row.get(0)?),
                    resident_id: ResidentId(row.get(1)?),
                    title: row.get(2)?,
                    admin_reply: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(|e| GatewayError::storage_with_source("failed to read complaint", e))
    }

    /// A resident's notifications, newest first.
    pub fn notifications_for(&self, resident_id: ResidentId) -> Result<Vec<Notification>, GatewayError> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE resident_id = ?1 ORDER BY id DESC"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| GatewayError::storage_with_source("failed to prepare notification query", e))?;
        let rows = stmt
            .query_map(params![resident_id.0], notification_from_row)
            .and_then(Iterator::collect)
            .map_err(|e| GatewayError::storage_with_source("failed to read notifications", e))?;
        Ok(rows)
    }

    pub fn mark_notification_read(&self, id: NotificationId) -> Result<bool, GatewayError> {
        let changed = self
            .conn()
            .execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND is_read = 0",
                params![id.0],
            )
            .map_err(|e| GatewayError::storage_with_source("failed to mark notification read", e))?;
        Ok(changed == 1)
    }

    /// Staff-side clearance checks. The request moves to `completed` once
    /// both checks pass; completed requests are not reopened.
    pub fn record_clearance_checks(
        &self,
        id: ClearanceId,
        room_check_passed: bool,
        keys_returned: bool,
    ) -> Result<Option<ClearanceRequest>, GatewayError> {
        let status = ClearanceStatus::for_checks(room_check_passed, keys_returned);
        let conn = self.conn();
        conn.execute(
            r#"
            UPDATE clearance_requests
            SET room_check_passed = ?2, keys_returned = ?3, status = ?4
            WHERE id = ?1 AND status = 'pending'
            "#,
            params![id.0, room_check_passed, keys_returned, status.as_str()],
        )
        .map_err(|e| GatewayError::storage_with_source("failed to record clearance checks", e))?;

        let sql = format!("SELECT {CLEARANCE_COLUMNS} FROM clearance_requests WHERE id = ?1");
        conn.query_row(&sql, params![id.0], clearance_from_row)
            .optional()
            .map_err(|e| GatewayError::storage_with_source("failed to read clearance", e))
    }
}

impl PersistenceGateway for SqliteGateway {
    fn fetch_active_resident_ids(&self) -> Result<Vec<ResidentId>, GatewayError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id FROM residents WHERE suspended = 0 ORDER BY id")
            .map_err(|e| GatewayError::storage_with_source("failed to prepare resident query", e))?;
        let ids = stmt
            .query_map([], |row| Ok(ResidentId(row.get(0)?)))
            .and_then(Iterator::collect)
            .map_err(|e| GatewayError::storage_with_source("failed to read active residents", e))?;
        Ok(ids)
    }

    fn has_attendance_record(
        &self,
        resident_id: ResidentId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError> {
        self.conn()
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM attendance WHERE resident_id = ?1 AND date = ?2)",
                params![resident_id.0, date],
                |row| row.get(0),
            )
            .map_err(|e| GatewayError::storage_with_source("failed to check attendance", e))
    }

    fn insert_absent_if_missing(
        &self,
        resident_id: ResidentId,
        date: NaiveDate,
    ) -> Result<bool, GatewayError> {
        let inserted = self
            .conn()
            .execute(
                r#"
                INSERT INTO attendance (resident_id, date, status)
                VALUES (?1, ?2, 'absent')
                ON CONFLICT(resident_id, date) DO NOTHING
                "#,
                params![resident_id.0, date],
            )
            .map_err(|e| {
                GatewayError::storage_with_source(
                    format!("failed to insert absence for resident {resident_id}"),
                    e,
                )
            })?;
        Ok(inserted == 1)
    }

    fn fetch_pending_permissions(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<PermissionRequest>, GatewayError> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {PERMISSION_COLUMNS} FROM permission_requests \
             WHERE resident_id = ?1 AND status = 'pending' ORDER BY start_date, id"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| GatewayError::storage_with_source("failed to prepare permission query", e))?;
        let rows = stmt
            .query_map(params![resident_id.0], permission_from_row)
            .and_then(Iterator::collect)
            .map_err(|e| GatewayError::storage_with_source("failed to read pending permissions", e))?;
        Ok(rows)
    }

    fn insert_permission(&self, request: NewPermission) -> Result<PermissionRequest, GatewayError> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO permission_requests
                (resident_id, kind, start_date, end_date, reason, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                request.resident_id.0,
                request.kind.as_str(),
                request.start_date,
                request.end_date,
                request.reason,
                request.status.as_str(),
                request.created_at,
            ],
        )
        .map_err(|e| GatewayError::storage_with_source("failed to insert permission", e))?;

        Ok(PermissionRequest {
            id: PermissionId(conn.last_insert_rowid()),
            resident_id: request.resident_id,
            kind: request.kind,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason,
            status: request.status,
            created_at: request.created_at,
        })
    }

    fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, GatewayError> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO notifications (resident_id, title, body, complaint_id, is_read, created_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5)
            "#,
            params![
                notification.resident_id.0,
                notification.title,
                notification.body,
                notification.complaint_id.0,
                notification.created_at,
            ],
        )
        .map_err(|e| GatewayError::storage_with_source("failed to insert notification", e))?;

        Ok(Notification {
            id: NotificationId(conn.last_insert_rowid()),
            resident_id: notification.resident_id,
            title: notification.title,
            body: notification.body,
            complaint_id: notification.complaint_id,
            is_read: false,
            created_at: notification.created_at,
        })
    }

    fn fetch_open_clearance(
        &self,
        resident_id: ResidentId,
    ) -> Result<Option<ClearanceRequest>, GatewayError> {
        let sql = format!(
            "SELECT {CLEARANCE_COLUMNS} FROM clearance_requests \
             WHERE resident_id = ?1 AND status = 'pending'"
        );
        self.conn()
            .query_row(&sql, params![resident_id.0], clearance_from_row)
            .optional()
            .map_err(|e| GatewayError::storage_with_source("failed to read open clearance", e))
    }

    fn insert_clearance(
        &self,
        resident_id: ResidentId,
        initiated_at: NaiveDateTime,
    ) -> Result<ClearanceRequest, GatewayError> {
        let conn = self.conn();
        let result = conn.execute(
            r#"
            INSERT INTO clearance_requests
                (resident_id, status, room_check_passed, keys_returned, initiated_at)
            VALUES (?1, 'pending', 0, 0, ?2)
            "#,
            params![resident_id.0, initiated_at],
        );

        match result {
            Ok(_) => Ok(ClearanceRequest {
                id: ClearanceId(conn.last_insert_rowid()),
                resident_id,
                status: ClearanceStatus::Pending,
                room_check_passed: false,
                keys_returned: false,
                initiated_at,
            }),
            Err(e) if is_open_clearance_conflict(&e) => Err(GatewayError::conflict(format!(
                "open clearance exists for resident {resident_id}"
            ))),
            Err(e) => Err(GatewayError::storage_with_source("failed to insert clearance", e)),
        }
    }
}

fn is_open_clearance_conflict(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                && message
                    .as_deref()
                    .is_some_and(|m| m.contains("UNIQUE") && m.contains("clearance_requests"))
        }
        _ => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row mapping
// ─────────────────────────────────────────────────────────────────────────────

/// Read a TEXT enum column, failing the row on an unknown tag.
fn parse_column<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value {raw:?}").into(),
        )
    })
}

fn permission_from_row(row: &Row<'_>) -> rusqlite::Result<PermissionRequest> {
    Ok(PermissionRequest {
        id: PermissionId(row.get(0)?),
        resident_id: ResidentId(row.get(1)?),
        kind: parse_column(row, 2, PermissionKind::parse)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        reason: row.get(5)?,
        status: parse_column(row, 6, PermissionStatus::parse)?,
        created_at: row.get(7)?,
    })
}

fn clearance_from_row(row: &Row<'_>) -> rusqlite::Result<ClearanceRequest> {
    Ok(ClearanceRequest {
        id: ClearanceId(row.get(0)?),
        resident_id: ResidentId(row.get(1)?),
        status: parse_column(row, 2, ClearanceStatus::parse)?,
        room_check_passed: row.get(3)?,
        keys_returned: row.get(4)?,
        initiated_at: row.get(5)?,
    })
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: NotificationId(row.get(0)?),
        resident_id: ResidentId(row.get(1)?),
        title: row.get(2)?,
        body: row.get(3)?,
        complaint_id: ComplaintId(row.get(4)?),
        is_read: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn store() -> SqliteGateway {
        SqliteGateway::open_in_memory().unwrap()
    }

    #[test]
    fn active_residents_exclude_suspended() {
        let s = store();
        let a = s.insert_resident("Amara", false).unwrap();
        let b = s.insert_resident("Bilal", true).unwrap();
        let c = s.insert_resident("Chen", false).unwrap();

        assert_eq!(s.fetch_active_resident_ids().unwrap(), vec![a, c]);

        s.set_suspended(b, false).unwrap();
        s.set_suspended(c, true).unwrap();
        assert_eq!(s.fetch_active_resident_ids().unwrap(), vec![a, b]);
    }

    #[test]
    fn absent_insert_is_conditional() {
        let s = store();
        let r = s.insert_resident("Dana", false).unwrap();
        let day = d("2026-02-03");

        assert!(!s.has_attendance_record(r, day).unwrap());
        assert!(s.insert_absent_if_missing(r, day).unwrap());
        assert!(s.has_attendance_record(r, day).unwrap());
        assert!(!s.insert_absent_if_missing(r, day).unwrap());

        assert_eq!(s.attendance_for(day).unwrap().len(), 1);
    }

    #[test]
    fn absent_insert_never_overwrites_check_in() {
        let s = store();
        let r = s.insert_resident("Eli", false).unwrap();
        let day = d("2026-02-03");

        s.record_check_in(r, day).unwrap();
        assert!(!s.insert_absent_if_missing(r, day).unwrap());

        let rows = s.attendance_for(day).unwrap();
        assert_eq!(
            rows,
            vec![AttendanceRecord {
                resident_id: r,
                date: day,
                status: AttendanceStatus::Present,
            }]
        );
    }

    #[test]
    fn late_check_in_replaces_absent_mark() {
        let s = store();
        let r = s.insert_resident("Fatima", false).unwrap();
        let day = d("2026-02-03");

        s.insert_absent_if_missing(r, day).unwrap();
        s.record_check_in(r, day).unwrap();

        let rows = s.attendance_for(day).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, AttendanceStatus::Present);
    }

    #[test]
    fn permissions_roundtrip_and_filter_pending() {
        let s = store();
        let r = s.insert_resident("Goran", false).unwrap();

        let first = s
            .insert_permission(NewPermission {
                resident_id: r,
                kind: PermissionKind::Travel,
                start_date: d("2026-02-01"),
                end_date: d("2026-02-05"),
                reason: "family".to_string(),
                status: PermissionStatus::Pending,
                created_at: ts("2026-01-20 18:30:00"),
            })
            .unwrap();
        let second = s
            .insert_permission(NewPermission {
                resident_id: r,
                kind: PermissionKind::Late,
                start_date: d("2026-03-01"),
                end_date: d("2026-03-01"),
                reason: "concert".to_string(),
                status: PermissionStatus::Pending,
                created_at: ts("2026-01-21 09:00:00"),
            })
            .unwrap();

        assert_eq!(s.fetch_pending_permissions(r).unwrap(), vec![first.clone(), second.clone()]);

        assert!(s.decide_permission(first.id, PermissionStatus::Approved).unwrap());
        assert!(!s.decide_permission(first.id, PermissionStatus::Rejected).unwrap());
        assert_eq!(s.fetch_pending_permissions(r).unwrap(), vec![second]);
    }

    #[test]
    fn store_rejects_inverted_range() {
        let s = store();
        let r = s.insert_resident("Hana", false).unwrap();

        let result = s.insert_permission(NewPermission {
            resident_id: r,
            kind: PermissionKind::Travel,
            start_date: d("2026-02-05"),
            end_date: d("2026-02-01"),
            reason: String::new(),
            status: PermissionStatus::Pending,
            created_at: ts("2026-01-20 18:30:00"),
        });
        assert!(matches!(result, Err(GatewayError::Storage { .. })));
    }

    #[test]
    fn notifications_are_stored_unread() {
        let s = store();
        let r = s.insert_resident("Ivan", false).unwrap();
        let complaint = s.insert_complaint(r, "No hot water").unwrap();

        let n = s
            .insert_notification(NewNotification {
                resident_id: r,
                title: "New Reply".to_string(),
                body: "Staff replied".to_string(),
                complaint_id: complaint.id,
                created_at: ts("2026-02-10 14:05:00"),
            })
            .unwrap();
        assert!(!n.is_read);
        assert_eq!(s.notifications_for(r).unwrap(), vec![n.clone()]);

        assert!(s.mark_notification_read(n.id).unwrap());
        assert!(s.notifications_for(r).unwrap()[0].is_read);
        assert!(!s.mark_notification_read(n.id).unwrap());
    }

    #[test]
    fn complaint_reply_can_be_set_and_cleared() {
        let s = store();
        let r = s.insert_resident("Jonas", false).unwrap();
        let complaint = s.insert_complaint(r, "Window stuck").unwrap();

        let updated = s.set_complaint_reply(complaint.id, Some("Fixed")).unwrap().unwrap();
        assert_eq!(updated.admin_reply.as_deref(), Some("Fixed"));

        let cleared = s.set_complaint_reply(complaint.id, None).unwrap().unwrap();
        assert_eq!(cleared.admin_reply, None);

        assert_eq!(s.set_complaint_reply(ComplaintId(999), Some("x")).unwrap(), None);
    }

    #[test]
    fn second_open_clearance_is_a_conflict() {
        let s = store();
        let r = s.insert_resident("Kofi", false).unwrap();

        let first = s.insert_clearance(r, ts("2026-05-30 09:00:00")).unwrap();
        assert_eq!(s.fetch_open_clearance(r).unwrap(), Some(first));

        let second = s.insert_clearance(r, ts("2026-05-30 09:00:01"));
        assert!(matches!(second, Err(GatewayError::Conflict { .. })));
    }

    #[test]
    fn completed_clearance_frees_the_slot() {
        let s = store();
        let r = s.insert_resident("Lena", false).unwrap();
        let first = s.insert_clearance(r, ts("2026-05-30 09:00:00")).unwrap();

        let half = s.record_clearance_checks(first.id, false, true).unwrap().unwrap();
        assert_eq!(half.status, ClearanceStatus::Pending);

        let done = s.record_clearance_checks(first.id, true, true).unwrap().unwrap();
        assert_eq!(done.status, ClearanceStatus::Completed);
        assert!(done.checks_complete());
        assert_eq!(s.fetch_open_clearance(r).unwrap(), None);

        // Completed requests stay completed.
        let again = s.record_clearance_checks(first.id, false, false).unwrap().unwrap();
        assert_eq!(again.status, ClearanceStatus::Completed);

        assert!(s.insert_clearance(r, ts("2026-12-01 10:00:00")).is_ok());
    }

    #[test]
    fn open_on_disk_creates_parent_dirs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("residence.db");

        let s = SqliteGateway::open(&path).unwrap();
        s.insert_resident("Mia", false).unwrap();
        drop(s);

        let reopened = SqliteGateway::open(&path).unwrap();
        assert_eq!(reopened.fetch_active_resident_ids().unwrap().len(), 1);
    }
}
