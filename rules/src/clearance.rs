//! Checkout clearance lifecycle.
//!
//! ```text
//! absent ──initiate──▶ pending ──room check + keys returned──▶ completed
//! ```
//!
//! Only `initiate` lives here. The move to `completed` belongs to staff
//! tooling; whichever component performs it, a resident never has more than
//! one `pending` request.

use crate::clock::Clock;
use crate::errors::{ClearanceError, GatewayError};
use crate::gateway::PersistenceGateway;
use crate::model::{ClearanceRequest, ResidentId};

/// Open a clearance request for `resident_id`.
///
/// Fails with [`ClearanceError::AlreadyActive`] if one is already pending,
/// whether seen up front or reported by the store as a write conflict.
pub fn initiate<G, C>(
    gateway: &G,
    clock: &C,
    resident_id: ResidentId,
) -> Result<ClearanceRequest, ClearanceError>
where
    G: PersistenceGateway + ?Sized,
    C: Clock + ?Sized,
{
    if let Some(open) = gateway.fetch_open_clearance(resident_id)? {
        tracing::debug!(%resident_id, clearance_id = %open.id, "Clearance already pending");
        return Err(ClearanceError::AlreadyActive { resident_id });
    }

    match gateway.insert_clearance(resident_id, clock.now()) {
        Ok(request) => {
            tracing::info!(%resident_id, clearance_id = %request.id, "Clearance initiated");
            Ok(request)
        }
        Err(GatewayError::Conflict { message }) => {
            tracing::debug!(%resident_id, %message, "Concurrent clearance initiate lost");
            Err(ClearanceError::AlreadyActive { resident_id })
        }
        Err(e) => {
            tracing::error!(%resident_id, error = %e, "initiate_clearance: insert failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::memory::MemoryGateway;
    use crate::model::ClearanceStatus;
    use chrono::{Duration, NaiveDate};

    fn clock() -> ManualClock {
        ManualClock::new(
            NaiveDate::from_ymd_opt(2026, 5, 30)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .unwrap(),
        )
    }

    #[test]
    fn initiate_creates_pending_request() {
        let gw = MemoryGateway::new();
        let clock = clock();
        let r = gw.add_resident(false);

        let req = initiate(&gw, &clock, r).unwrap();
        assert_eq!(req.resident_id, r);
        assert_eq!(req.status, ClearanceStatus::Pending);
        assert!(!req.room_check_passed);
        assert!(!req.keys_returned);
        assert_eq!(req.initiated_at, clock.now());
    }

    #[test]
    fn second_initiate_while_pending_is_already_active() {
        let gw = MemoryGateway::new();
        let clock = clock();
        let r = gw.add_resident(false);

        initiate(&gw, &clock, r).unwrap();
        let second = initiate(&gw, &clock, r);
        assert!(matches!(
            second,
            Err(ClearanceError::AlreadyActive { resident_id }) if resident_id == r
        ));
    }

    #[test]
    fn initiate_after_completion_succeeds() {
        let gw = MemoryGateway::new();
        let clock = clock();
        let r = gw.add_resident(false);

        let first = initiate(&gw, &clock, r).unwrap();
        gw.record_clearance_checks(first.id, true, false);
        assert!(initiate(&gw, &clock, r).is_err());

        gw.record_clearance_checks(first.id, true, true);
        clock.advance(Duration::days(200));
        let second = initiate(&gw, &clock, r).unwrap();
        assert_ne!(second.id, first.id);
        assert_eq!(second.status, ClearanceStatus::Pending);
    }

    #[test]
    fn residents_are_independent() {
        let gw = MemoryGateway::new();
        let clock = clock();
        let a = gw.add_resident(false);
        let b = gw.add_resident(false);

        initiate(&gw, &clock, a).unwrap();
        assert!(initiate(&gw, &clock, b).is_ok());
    }

    #[test]
    fn write_conflict_maps_to_already_active() {
        let gw = MemoryGateway::new();
        let r = gw.add_resident(false);
        gw.conflict_on_next_clearance_insert();

        let result = initiate(&gw, &clock(), r);
        assert!(matches!(result, Err(ClearanceError::AlreadyActive { .. })));
    }
}
