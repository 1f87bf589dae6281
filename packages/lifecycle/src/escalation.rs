//! Manual escalation and the submission audit record.
//!
//! Escalating never moves the status. It leaves a note for whoever picks
//! the request up next, bumps the escalation counter and records a
//! `manual_escalation` event.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use citizen_services_request_models::{
    Actor, ActorRole, LifecycleEvent, LifecycleEventType, RecordEvent, ServiceRequest,
};
use thiserror::Error;

/// Level used when the caller names none.
pub const DEFAULT_ESCALATION_LEVEL: &str = "manager";

/// A rejected escalation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscalationError {
    /// Only staff (or the system) escalate.
    #[error("unauthorized_role: {role} cannot escalate requests")]
    UnauthorizedRole {
        /// Role of the actor that tried.
        role: ActorRole,
    },

    /// An escalation must say why.
    #[error("missing_reason: escalation of request {request_id} has no reason")]
    MissingReason {
        /// Request it tried to escalate.
        request_id: String,
    },
}

/// The result of [`escalate`].
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationOutcome {
    /// The updated request.
    pub request: ServiceRequest,
    /// The `manual_escalation` event to record.
    pub event: LifecycleEvent,
}

/// Escalates `request` to `level` on behalf of `by` at time `now`.
///
/// Appends `"[ESCALATED to <level>] <reason> - By: <id>"` to the internal
/// notes, increments `escalation_count` and sets `updated_at` (never
/// earlier than `created_at`). A blank `level` means
/// [`DEFAULT_ESCALATION_LEVEL`].
///
/// # Errors
///
/// * [`EscalationError::UnauthorizedRole`] unless `by` is staff or system.
/// * [`EscalationError::MissingReason`] if `reason` is blank.
pub fn escalate(
    request: &ServiceRequest,
    reason: &str,
    by: &Actor,
    level: &str,
    now: DateTime<Utc>,
) -> Result<EscalationOutcome, EscalationError> {
    if !matches!(by.role, ActorRole::Staff | ActorRole::System) {
        return Err(EscalationError::UnauthorizedRole { role: by.role });
    }

    let reason = reason.trim();
    if reason.is_empty() {
        return Err(EscalationError::MissingReason {
            request_id: request.id.clone(),
        });
    }

    let level = match level.trim() {
        "" => DEFAULT_ESCALATION_LEVEL,
        level => level,
    };
    let at = now.max(request.timestamps.created_at);

    let mut updated = request.clone();
    updated
        .internal_notes
        .push(format!("[ESCALATED to {level}] {reason} - By: {}", by.id));
    updated.escalation_count += 1;
    updated.timestamps.updated_at = at;

    log::info!(
        "Request {} escalated to {level} by {} (escalation #{})",
        request.id,
        by.id,
        updated.escalation_count
    );

    let event = LifecycleEvent {
        event_type: LifecycleEventType::Record(RecordEvent::ManualEscalation),
        by: by.clone(),
        at,
        notes: Some(reason.to_string()),
        meta: BTreeMap::from([
            ("reason".to_string(), reason.to_string()),
            ("escalation_level".to_string(), level.to_string()),
        ]),
    };

    Ok(EscalationOutcome {
        request: updated,
        event,
    })
}

/// The `created` event recorded when `request` is submitted through
/// `channel` (e.g. `web`, `mobile`).
#[must_use]
pub fn creation_event(request: &ServiceRequest, by: &Actor, channel: &str) -> LifecycleEvent {
    LifecycleEvent {
        event_type: LifecycleEventType::Record(RecordEvent::Created),
        by: by.clone(),
        at: request.timestamps.created_at,
        notes: None,
        meta: BTreeMap::from([
            ("channel".to_string(), channel.to_string()),
            ("category".to_string(), request.category.clone()),
        ]),
    }
}
