//! Agent-reported field-work milestones.
//!
//! A milestone (arrived, work started, resolved on site) is an audit event
//! only. The formal status still moves through [`crate::apply_transition`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use citizen_services_request_models::{
    Actor, ActorRole, LifecycleEvent, LifecycleEventType, Milestone, RequestStatus, ServiceRequest,
};
use thiserror::Error;

/// A rejected milestone post.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MilestoneError {
    /// Only field agents report milestones.
    #[error("unauthorized_role: {role} cannot post milestones")]
    UnauthorizedRole {
        /// Role of the actor that tried.
        role: ActorRole,
    },

    /// The agent is not assigned to the request.
    #[error("not_owner: agent {agent_id} is not assigned to request {request_id}")]
    NotOwner {
        /// Agent that tried.
        agent_id: String,
        /// Request it tried to update.
        request_id: String,
    },

    /// The request is not being worked.
    #[error("inactive_request: request {request_id} is {status}")]
    InactiveRequest {
        /// Request it tried to update.
        request_id: String,
        /// Its current status.
        status: RequestStatus,
    },
}

/// Validates a milestone post and returns the event to record, stamped
/// with the current time.
///
/// # Errors
///
/// See [`record_milestone_at`].
pub fn record_milestone(
    request: &ServiceRequest,
    milestone: Milestone,
    actor: &Actor,
) -> Result<LifecycleEvent, MilestoneError> {
    record_milestone_at(request, milestone, actor, Utc::now())
}

/// Validates a milestone post and returns the event to record at `at`.
///
/// # Errors
///
/// Fails if the actor is not an agent, is not the assigned agent, or the
/// request is neither `assigned` nor `in_progress`.
pub fn record_milestone_at(
    request: &ServiceRequest,
    milestone: Milestone,
    actor: &Actor,
    at: DateTime<Utc>,
) -> Result<LifecycleEvent, MilestoneError> {
    if actor.role != ActorRole::Agent {
        return Err(MilestoneError::UnauthorizedRole { role: actor.role });
    }

    if !request.is_assigned_to(&actor.id) {
        return Err(MilestoneError::NotOwner {
            agent_id: actor.id.clone(),
            request_id: request.id.clone(),
        });
    }

    if !matches!(
        request.status,
        RequestStatus::Assigned | RequestStatus::InProgress
    ) {
        return Err(MilestoneError::InactiveRequest {
            request_id: request.id.clone(),
            status: request.status,
        });
    }

    log::debug!(
        "Agent {} reported {milestone} on request {}",
        actor.id,
        request.id
    );

    Ok(LifecycleEvent {
        event_type: LifecycleEventType::Milestone(milestone),
        by: actor.clone(),
        at,
        notes: None,
        meta: BTreeMap::new(),
    })
}
