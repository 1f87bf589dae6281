//! The status transition table and the functions that enforce it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use citizen_services_request_models::{
    Actor, ActorRole, LifecycleEvent, LifecycleEventType, RequestStatus, ServiceRequest,
};

use crate::{TransitionError, TransitionErrorKind};

/// One legal edge of the workflow graph and the roles allowed to take it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    /// Source status.
    pub from: RequestStatus,
    /// Target status.
    pub to: RequestStatus,
    /// Roles allowed to take this edge.
    pub roles: &'static [ActorRole],
}

impl TransitionRule {
    /// Whether `role` may take this edge.
    #[must_use]
    pub fn permits(&self, role: ActorRole) -> bool {
        self.roles.contains(&role)
    }
}

const OFFICE: &[ActorRole] = &[ActorRole::Staff, ActorRole::System];
const FIELD: &[ActorRole] = &[ActorRole::Agent, ActorRole::Staff, ActorRole::System];
const STAFF_ONLY: &[ActorRole] = &[ActorRole::Staff];

/// Every legal status change.
///
/// Anything absent is `invalid_transition`. Nothing leaves `closed` and
/// nothing re-enters `new`, so resolved work cannot be re-opened.
pub const TRANSITIONS: &[TransitionRule] = &[
    // Backbone.
    rule(RequestStatus::New, RequestStatus::Pending, OFFICE),
    rule(RequestStatus::Pending, RequestStatus::Triaged, OFFICE),
    rule(RequestStatus::Triaged, RequestStatus::Assigned, OFFICE),
    rule(RequestStatus::Assigned, RequestStatus::InProgress, FIELD),
    rule(RequestStatus::InProgress, RequestStatus::Resolved, FIELD),
    rule(RequestStatus::Resolved, RequestStatus::Closed, OFFICE),
    // Quick fixes resolved without a separate start.
    rule(RequestStatus::Assigned, RequestStatus::Resolved, FIELD),
    // Staff corrections from the request detail screen.
    rule(RequestStatus::Pending, RequestStatus::InProgress, STAFF_ONLY),
    rule(RequestStatus::InProgress, RequestStatus::Pending, STAFF_ONLY),
    // Rejections (duplicates, out of scope) before work is assigned.
    rule(RequestStatus::New, RequestStatus::Closed, OFFICE),
    rule(RequestStatus::Triaged, RequestStatus::Closed, OFFICE),
];

/// Targets an agent may only reach on requests assigned to them.
const OWNERSHIP_GUARDED: &[RequestStatus] = &[
    RequestStatus::Assigned,
    RequestStatus::InProgress,
    RequestStatus::Resolved,
];

const fn rule(
    from: RequestStatus,
    to: RequestStatus,
    roles: &'static [ActorRole],
) -> TransitionRule {
    TransitionRule { from, to, roles }
}

/// Looks up the table entry for `from -> to`.
#[must_use]
pub fn find_rule(from: RequestStatus, to: RequestStatus) -> Option<&'static TransitionRule> {
    TRANSITIONS.iter().find(|r| r.from == from && r.to == to)
}

/// Whether `role` may move a request from `current` to `target`.
///
/// Staying in the current status is always allowed. Ownership is not
/// checked here since no request is given; [`apply_transition`] checks it.
#[must_use]
pub fn can_transition(current: RequestStatus, target: RequestStatus, role: ActorRole) -> bool {
    current == target || find_rule(current, target).is_some_and(|r| r.permits(role))
}

/// Statuses `role` can reach from `current` in one step, in table order.
#[must_use]
pub fn allowed_next(current: RequestStatus, role: ActorRole) -> Vec<RequestStatus> {
    TRANSITIONS
        .iter()
        .filter(|r| r.from == current && r.permits(role))
        .map(|r| r.to)
        .collect()
}

/// Moves `request` to `target` on behalf of `actor`, stamped with the
/// current time.
///
/// # Errors
///
/// See [`apply_transition_at`].
pub fn apply_transition(
    request: &ServiceRequest,
    target: RequestStatus,
    actor: &Actor,
) -> Result<ServiceRequest, TransitionError> {
    apply_transition_at(request, target, actor, Utc::now())
}

/// Moves `request` to `target` on behalf of `actor` at time `now`.
///
/// Returns an updated copy; `request` itself is never modified. A
/// transition to the current status succeeds and returns an identical
/// copy without touching timestamps. Every other accepted transition sets
/// `updated_at`, plus the per-status stamp (`triaged_at`, `assigned_at`,
/// `resolved_at`, `closed_at`). Stamps are never earlier than
/// `created_at`, even if `now` is.
///
/// # Errors
///
/// * [`TransitionErrorKind::InvalidTransition`] if the table has no such edge.
/// * [`TransitionErrorKind::UnauthorizedRole`] if the edge exists but not
///   for the actor's role.
/// * [`TransitionErrorKind::NotOwner`] if an agent targets `assigned`,
///   `in_progress` or `resolved` on a request not assigned to them.
pub fn apply_transition_at(
    request: &ServiceRequest,
    target: RequestStatus,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<ServiceRequest, TransitionError> {
    if request.status == target {
        log::trace!("Request {} already {target}; nothing to do", request.id);
        return Ok(request.clone());
    }

    check(request, target, actor).inspect_err(|e| {
        log::debug!("Rejected transition on request {}: {e}", request.id);
    })?;

    let at = now.max(request.timestamps.created_at);
    let mut updated = request.clone();
    updated.status = target;
    updated.timestamps.updated_at = at;

    let stamp = match target {
        RequestStatus::Triaged => Some(&mut updated.timestamps.triaged_at),
        RequestStatus::Assigned => Some(&mut updated.timestamps.assigned_at),
        RequestStatus::Resolved => Some(&mut updated.timestamps.resolved_at),
        RequestStatus::Closed => Some(&mut updated.timestamps.closed_at),
        RequestStatus::New | RequestStatus::Pending | RequestStatus::InProgress => None,
    };
    if let Some(stamp) = stamp {
        *stamp = Some(at);
    }

    log::debug!(
        "Request {} moved {} -> {target} by {} {}",
        request.id,
        request.status,
        actor.role,
        actor.id
    );

    Ok(updated)
}

fn check(
    request: &ServiceRequest,
    target: RequestStatus,
    actor: &Actor,
) -> Result<(), TransitionError> {
    let reject = |reason| TransitionError {
        from: request.status,
        to: target,
        role: actor.role,
        reason,
    };

    let rule = find_rule(request.status, target)
        .ok_or_else(|| reject(TransitionErrorKind::InvalidTransition))?;

    if !rule.permits(actor.role) {
        return Err(reject(TransitionErrorKind::UnauthorizedRole));
    }

    if actor.role == ActorRole::Agent
        && OWNERSHIP_GUARDED.contains(&target)
        && !request.is_assigned_to(&actor.id)
    {
        return Err(reject(TransitionErrorKind::NotOwner));
    }

    Ok(())
}

/// Builds the audit event recording a transition into `target`.
#[must_use]
pub fn transition_event(
    actor: &Actor,
    target: RequestStatus,
    at: DateTime<Utc>,
    notes: Option<&str>,
) -> LifecycleEvent {
    LifecycleEvent {
        event_type: LifecycleEventType::Transition(target),
        by: actor.clone(),
        at,
        notes: notes.filter(|n| !n.is_empty()).map(str::to_string),
        meta: BTreeMap::new(),
    }
}

/// The result of [`apply_transition_with_note`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    /// The updated request.
    pub request: ServiceRequest,
    /// The audit event, or `None` when the request was already in the
    /// target status.
    pub event: Option<LifecycleEvent>,
}

/// Like [`apply_transition_at`], but also appends `"[status] note"` to the
/// request's internal notes and returns the audit event to log.
///
/// # Errors
///
/// See [`apply_transition_at`].
pub fn apply_transition_with_note(
    request: &ServiceRequest,
    target: RequestStatus,
    actor: &Actor,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, TransitionError> {
    if request.status == target {
        return Ok(TransitionOutcome {
            request: request.clone(),
            event: None,
        });
    }

    let mut updated = apply_transition_at(request, target, actor, now)?;

    if let Some(note) = notes.filter(|n| !n.is_empty()) {
        updated.internal_notes.push(format!("[{target}] {note}"));
    }

    let event = transition_event(actor, target, updated.timestamps.updated_at, notes);

    Ok(TransitionOutcome {
        request: updated,
        event: Some(event),
    })
}
