#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Service request workflow rules.
//!
//! The legal status graph is the [`transitions::TRANSITIONS`] table. Every
//! status change goes through [`apply_transition`], which checks the table,
//! the actor's role and (for agents) request ownership, then returns an
//! updated copy of the request. Rejected transitions return a
//! [`TransitionError`] and leave the request untouched.
//!
//! Field agents also report [`Milestone`](citizen_services_request_models::Milestone)s,
//! which are audited but never move the status; see [`milestones`]. Staff
//! can [`escalate`] a request without changing its status.
//!
//! Nothing here performs I/O. Credentials reach the workflow through the
//! [`credentials::CredentialProvider`] trait rather than global storage.

pub mod credentials;
pub mod escalation;
pub mod milestones;
pub mod transitions;

use citizen_services_request_models::{ActorRole, RequestStatus};
use serde::Serialize;
use thiserror::Error;

pub use escalation::{
    DEFAULT_ESCALATION_LEVEL, EscalationError, EscalationOutcome, creation_event, escalate,
};
pub use milestones::{MilestoneError, record_milestone, record_milestone_at};
pub use transitions::{
    TRANSITIONS, TransitionOutcome, TransitionRule, allowed_next, apply_transition,
    apply_transition_at, apply_transition_with_note, can_transition, find_rule, transition_event,
};

/// Why a transition was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionErrorKind {
    /// The target is not reachable from the current status for any role.
    InvalidTransition,
    /// An agent tried to act on a request not assigned to them.
    NotOwner,
    /// The role may never perform this transition.
    UnauthorizedRole,
}

impl TransitionErrorKind {
    /// Returns the wire code (`"invalid_transition"`, ...).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidTransition => "invalid_transition",
            Self::NotOwner => "not_owner",
            Self::UnauthorizedRole => "unauthorized_role",
        }
    }
}

impl std::fmt::Display for TransitionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A rejected status change.
///
/// Carries the attempted transition so the caller can explain the refusal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{reason}: cannot move request from '{from}' to '{to}' as {role}")]
pub struct TransitionError {
    /// Status the request was in.
    pub from: RequestStatus,
    /// Status that was requested.
    pub to: RequestStatus,
    /// Role of the actor that asked.
    pub role: ActorRole,
    /// Why it was refused.
    pub reason: TransitionErrorKind,
}
