//! Complaint-reply notifications.
//!
//! Called synchronously by the staff "reply to complaint" mutation. A
//! non-blank reply produces one unread notification for the complainant;
//! a blank or cleared reply produces nothing.

use crate::clock::Clock;
use crate::errors::GatewayError;
use crate::gateway::PersistenceGateway;
use crate::model::{Complaint, NewNotification, Notification};

pub const REPLY_NOTIFICATION_TITLE: &str = "New Reply";

pub fn reply_notification_body(complaint_title: &str) -> String {
    format!("Staff replied to your complaint \"{complaint_title}\"")
}

/// Create the resident's notification for a new reply on `complaint`.
///
/// Returns `Ok(None)` without touching the store when `new_reply` is absent
/// or whitespace-only. Store failures propagate; the caller decides whether
/// the reply itself is rolled back.
pub fn on_complaint_replied<G, C>(
    gateway: &G,
    clock: &C,
    complaint: &Complaint,
    new_reply: Option<&str>,
) -> Result<Option<Notification>, GatewayError>
where
    G: PersistenceGateway + ?Sized,
    C: Clock + ?Sized,
{
    let reply = new_reply.map(str::trim).unwrap_or_default();
    if reply.is_empty() {
        tracing::debug!(complaint_id = %complaint.id, "Blank reply, no notification");
        return Ok(None);
    }

    let notification = gateway
        .insert_notification(NewNotification {
            resident_id: complaint.resident_id,
            title: REPLY_NOTIFICATION_TITLE.to_string(),
            body: reply_notification_body(&complaint.title),
            complaint_id: complaint.id,
            created_at: clock.now(),
        })
        .map_err(|e| {
            tracing::error!(
                resident_id = %complaint.resident_id,
                complaint_id = %complaint.id,
                error = %e,
                "on_complaint_replied: notification insert failed"
            );
            e
        })?;

    tracing::info!(
        resident_id = %notification.resident_id,
        complaint_id = %complaint.id,
        notification_id = %notification.id,
        "Reply notification created"
    );

    Ok(Some(notification))
}
