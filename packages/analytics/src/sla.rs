//! SLA policy lookup and breach checks.

use chrono::{DateTime, Utc};
use citizen_services_analytics_models::{EscalationStep, SlaPolicy, SlaState};
use citizen_services_request_models::{Priority, ServiceRequest};

/// `(category, priority, policy_id, target_hours, breach_threshold_hours)`.
const POLICIES: &[(&str, Priority, &str, u32, u32)] = &[
    ("pothole", Priority::P1, "SLA-ROAD-P1", 48, 60),
    ("pothole", Priority::P2, "SLA-ROAD-P2", 72, 96),
    ("water_leak", Priority::P1, "SLA-WATER-P1", 24, 36),
    ("streetlight", Priority::P2, "SLA-LIGHT-P2", 120, 144),
];

const DEFAULT_POLICY: (&str, u32, u32) = ("SLA-DEFAULT", 96, 120);

/// Returns the SLA policy for a category and priority.
///
/// The category is compared lower-cased; pairs not in the table get
/// `SLA-DEFAULT`. Every policy escalates to the dispatcher at three
/// quarters of the target and to the manager at the breach threshold.
#[must_use]
pub fn sla_policy(category: &str, priority: Priority) -> SlaPolicy {
    let category = category.to_lowercase();
    let (policy_id, target_hours, breach_threshold_hours) = POLICIES
        .iter()
        .find(|(c, p, ..)| *c == category && *p == priority)
        .map_or(DEFAULT_POLICY, |&(_, _, id, target, breach)| {
            (id, target, breach)
        });

    SlaPolicy {
        policy_id: policy_id.to_string(),
        target_hours,
        breach_threshold_hours,
        escalation_steps: vec![
            EscalationStep {
                after_hours: target_hours * 3 / 4,
                action: "notify_dispatcher".to_string(),
            },
            EscalationStep {
                after_hours: breach_threshold_hours,
                action: "notify_manager".to_string(),
            },
        ],
    }
}

#[allow(clippy::cast_precision_loss)]
fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

/// Hours from creation to resolution, if the request has been resolved.
#[must_use]
pub fn resolution_hours(request: &ServiceRequest) -> Option<f64> {
    request
        .timestamps
        .resolved_at
        .map(|resolved| hours_between(request.timestamps.created_at, resolved))
}

/// Whether the request was resolved later than the policy's breach
/// threshold. Unresolved requests are never counted as breached.
#[must_use]
pub fn is_breached(request: &ServiceRequest, policy: &SlaPolicy) -> bool {
    resolution_hours(request).is_some_and(|hours| hours > f64::from(policy.breach_threshold_hours))
}

/// Where an open request stands against its policy at `now`.
///
/// Resolved requests are judged on their resolution time instead.
#[must_use]
pub fn sla_state(request: &ServiceRequest, policy: &SlaPolicy, now: DateTime<Utc>) -> SlaState {
    let hours = resolution_hours(request)
        .unwrap_or_else(|| hours_between(request.timestamps.created_at, now));

    if hours > f64::from(policy.breach_threshold_hours) {
        SlaState::Breached
    } else if hours > f64::from(policy.target_hours) {
        SlaState::AtRisk
    } else {
        SlaState::OnTrack
    }
}
