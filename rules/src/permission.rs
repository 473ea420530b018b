//! Leave/travel permission validation.
//!
//! Two ordered checks, first failure wins:
//! 1. the range must not end before it starts
//! 2. it must not intersect (closed intervals) any pending request of the
//!    same resident
//!
//! Approved and rejected requests never block a new one.

use crate::clock::Clock;
use crate::errors::{PermissionError, PermissionRejection};
use crate::gateway::PersistenceGateway;
use crate::model::{NewPermission, PermissionCandidate, PermissionRequest, PermissionStatus};

/// Check `candidate` against the resident's pending requests.
///
/// Entries of `existing_pending` belonging to another resident or no longer
/// pending are ignored.
pub fn validate(
    candidate: &PermissionCandidate,
    existing_pending: &[PermissionRequest],
) -> Result<(), PermissionRejection> {
    if candidate.end_date < candidate.start_date {
        return Err(PermissionRejection::InvalidRange {
            start_date: candidate.start_date,
            end_date: candidate.end_date,
        });
    }

    let conflict = existing_pending.iter().find(|existing| {
        existing.resident_id == candidate.resident_id
            && existing.status == PermissionStatus::Pending
            && existing.overlaps(candidate.start_date, candidate.end_date)
    });

    match conflict {
        Some(existing) => Err(PermissionRejection::OverlappingRequest {
            conflicting: existing.id,
            start_date: existing.start_date,
            end_date: existing.end_date,
        }),
        None => Ok(()),
    }
}

/// Validate and persist a new request in `pending` status.
pub fn submit<G, C>(
    gateway: &G,
    clock: &C,
    candidate: PermissionCandidate,
) -> Result<PermissionRequest, PermissionError>
where
    G: PersistenceGateway + ?Sized,
    C: Clock + ?Sized,
{
    let resident_id = candidate.resident_id;
    let pending = gateway.fetch_pending_permissions(resident_id).map_err(|e| {
        tracing::error!(%resident_id, error = %e, "submit_permission: failed to load pending requests");
        e
    })?;

    if let Err(rejection) = validate(&candidate, &pending) {
        tracing::debug!(%resident_id, code = rejection.code(), "Permission request rejected");
        return Err(rejection.into());
    }

    let request = gateway
        .insert_permission(NewPermission {
            resident_id,
            kind: candidate.kind,
            start_date: candidate.start_date,
            end_date: candidate.end_date,
            reason: candidate.reason,
            status: PermissionStatus::Pending,
            created_at: clock.now(),
        })
        .map_err(|e| {
            tracing::error!(%resident_id, error = %e, "submit_permission: insert failed");
            e
        })?;

    tracing::info!(
        %resident_id,
        permission_id = %request.id,
        kind = request.kind.as_str(),
        start = %request.start_date,
        end = %request.end_date,
        "Permission request submitted"
    );

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PermissionId, PermissionKind, ResidentId};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn candidate(start: &str, end: &str) -> PermissionCandidate {
        PermissionCandidate {
            resident_id: ResidentId(1),
            kind: PermissionKind::Travel,
            start_date: d(start),
            end_date: d(end),
            reason: "home for the weekend".to_string(),
        }
    }

    fn existing(id: i64, start: &str, end: &str, status: PermissionStatus) -> PermissionRequest {
        PermissionRequest {
            id: PermissionId(id),
            resident_id: ResidentId(1),
            kind: PermissionKind::Travel,
            start_date: d(start),
            end_date: d(end),
            reason: "earlier trip".to_string(),
            status,
            created_at: d("2026-01-15").and_hms_opt(10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn end_before_start_is_invalid_range() {
        let result = validate(&candidate("2026-02-05", "2026-02-01"), &[]);
        assert_eq!(
            result,
            Err(PermissionRejection::InvalidRange {
                start_date: d("2026-02-05"),
                end_date: d("2026-02-01"),
            })
        );
    }

    #[test]
    fn range_check_runs_before_overlap_check() {
        let pending = [existing(1, "2026-02-01", "2026-02-05", PermissionStatus::Pending)];
        let result = validate(&candidate("2026-02-04", "2026-02-02"), &pending);
        assert!(matches!(result, Err(PermissionRejection::InvalidRange { .. })));
    }

    #[test]
    fn single_day_request_is_valid() {
        assert_eq!(validate(&candidate("2026-02-01", "2026-02-01"), &[]), Ok(()));
    }

    #[test]
    fn partial_overlap_is_rejected() {
        let pending = [existing(4, "2026-02-01", "2026-02-05", PermissionStatus::Pending)];
        let result = validate(&candidate("2026-02-03", "2026-02-10"), &pending);
        assert_eq!(
            result,
            Err(PermissionRejection::OverlappingRequest {
                conflicting: PermissionId(4),
                start_date: d("2026-02-01"),
                end_date: d("2026-02-05"),
            })
        );
    }

    #[test]
    fn day_after_existing_end_is_accepted() {
        let pending = [existing(4, "2026-02-01", "2026-02-05", PermissionStatus::Pending)];
        assert_eq!(validate(&candidate("2026-02-06", "2026-02-10"), &pending), Ok(()));
    }

    #[test]
    fn shared_boundary_day_overlaps() {
        let pending = [existing(4, "2026-02-01", "2026-02-05", PermissionStatus::Pending)];
        let result = validate(&candidate("2026-02-05", "2026-02-06"), &pending);
        assert!(matches!(result, Err(PermissionRejection::OverlappingRequest { .. })));

        let result = validate(&candidate("2026-01-28", "2026-02-01"), &pending);
        assert!(matches!(result, Err(PermissionRejection::OverlappingRequest { .. })));
    }

    #[test]
    fn exact_span_match_overlaps() {
        let pending = [existing(4, "2026-02-01", "2026-02-05", PermissionStatus::Pending)];
        let result = validate(&candidate("2026-02-01", "2026-02-05"), &pending);
        assert!(matches!(result, Err(PermissionRejection::OverlappingRequest { .. })));
    }

    #[test]
    fn short_request_inside_long_one_overlaps() {
        let pending = [existing(9, "2026-03-01", "2026-03-10", PermissionStatus::Pending)];
        let result = validate(&candidate("2026-03-04", "2026-03-06"), &pending);
        assert!(matches!(
            result,
            Err(PermissionRejection::OverlappingRequest {
                conflicting: PermissionId(9),
                ..
            })
        ));
    }

    #[test]
    fn decided_requests_do_not_block() {
        let decided = [
            existing(1, "2026-02-01", "2026-02-05", PermissionStatus::Approved),
            existing(2, "2026-02-01", "2026-02-05", PermissionStatus::Rejected),
        ];
        assert_eq!(validate(&candidate("2026-02-02", "2026-02-03"), &decided), Ok(()));
    }

    #[test]
    fn other_residents_requests_do_not_block() {
        let mut other = existing(1, "2026-02-01", "2026-02-05", PermissionStatus::Pending);
        other.resident_id = ResidentId(2);
        assert_eq!(validate(&candidate("2026-02-02", "2026-02-03"), &[other]), Ok(()));
    }

    #[test]
    fn first_conflict_in_list_is_reported() {
        let pending = [
            existing(1, "2026-01-01", "2026-01-03", PermissionStatus::Pending),
            existing(2, "2026-02-01", "2026-02-05", PermissionStatus::Pending),
            existing(3, "2026-02-04", "2026-02-08", PermissionStatus::Pending),
        ];
        let result = validate(&candidate("2026-02-04", "2026-02-04"), &pending);
        assert!(matches!(
            result,
            Err(PermissionRejection::OverlappingRequest {
                conflicting: PermissionId(2),
                ..
            })
        ));
    }
}
