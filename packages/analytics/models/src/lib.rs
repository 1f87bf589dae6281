#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! SLA policy, KPI, heat-map and report types for the dashboards.

use std::collections::BTreeMap;

use citizen_services_citizen_models::VerificationState;
use citizen_services_request_models::{Priority, RequestStatus};
use serde::{Deserialize, Serialize};

/// An automatic escalation that fires once a request has been open for
/// `after_hours`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationStep {
    /// Hours after creation.
    pub after_hours: u32,
    /// What happens (e.g. `"notify_dispatcher"`).
    pub action: String,
}

/// Resolution-time target for a category and priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaPolicy {
    /// Policy identifier (e.g. `"SLA-ROAD-P1"`).
    pub policy_id: String,
    /// Hours within which the request should be resolved.
    pub target_hours: u32,
    /// Hours after which the request counts as breached.
    pub breach_threshold_hours: u32,
    /// Escalations, in firing order.
    pub escalation_steps: Vec<EscalationStep>,
}

/// How an open request stands against its SLA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaState {
    /// Within target.
    OnTrack,
    /// Past target, not yet breached.
    AtRisk,
    /// Past the breach threshold.
    Breached,
}

/// Headline dashboard numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    /// Request count per status.
    pub backlog: BTreeMap<RequestStatus, u64>,
    /// Mean hours from creation to resolution over resolved/closed requests.
    pub avg_resolution_hours: Option<f64>,
    /// Share of requests resolved later than their breach threshold.
    pub sla_breach_rate: Option<f64>,
}

/// One open request on the live map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatFeature {
    /// Request document id.
    pub request_id: String,
    /// Category name.
    pub category: String,
    /// Priority.
    pub priority: Priority,
    /// Status.
    pub status: RequestStatus,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Priority weight scaled by age, rounded to 3 decimals.
    pub weight: f64,
    /// Hours since creation, rounded to 2 decimals.
    pub age_hours: f64,
}

/// Heat points sharing a 0.01 degree grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatBucket {
    /// Latitude of the first point seen in the cell.
    pub lat: f64,
    /// Longitude of the first point seen in the cell.
    pub lng: f64,
    /// Sum of member weights.
    pub weight: f64,
    /// Member request ids, in input order.
    pub request_ids: Vec<String>,
}

/// Requests created in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// Calendar year.
    pub year: i32,
    /// Month, 1 to 12.
    pub month: u32,
    /// Requests created that month.
    pub count: u64,
    /// How many of them are resolved or closed.
    pub resolved: u64,
}

/// Request volume in one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneHotspot {
    /// Zone id; `None` groups requests without one.
    pub zone_id: Option<String>,
    /// Requests in the zone.
    pub count: u64,
}

/// Cohort analysis: monthly volume plus the busiest zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortReport {
    /// Oldest month first.
    pub time_series: Vec<MonthlyCount>,
    /// Busiest first, at most ten.
    pub hotspots: Vec<ZoneHotspot>,
}

/// Open and finished work of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProductivity {
    /// Agent id.
    pub agent_id: String,
    /// Agent name, or `"Unknown"` for an unregistered id.
    pub agent_name: String,
    /// Assigned requests still open.
    pub open: u64,
    /// Assigned requests resolved or closed.
    pub resolved: u64,
}

/// Request history of one citizen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitizenStatistics {
    /// Citizen id.
    pub citizen_id: String,
    /// Display name.
    pub citizen_name: String,
    /// Requests the citizen submitted.
    pub total_requests: u64,
    /// Those requests per status.
    pub status_breakdown: BTreeMap<RequestStatus, u64>,
    /// Identity verification.
    pub verification_state: VerificationState,
    /// Average rating the citizen gave.
    pub avg_rating: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backlog_serializes_with_status_keys() {
        let summary = KpiSummary {
            backlog: BTreeMap::from([(RequestStatus::InProgress, 3), (RequestStatus::New, 1)]),
            avg_resolution_hours: None,
            sla_breach_rate: Some(0.25),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["backlog"]["in_progress"], 3);
        assert_eq!(json["backlog"]["new"], 1);
        assert!(json["avg_resolution_hours"].is_null());
    }

    #[test]
    fn hotspot_without_zone_is_null() {
        let json = serde_json::to_value(ZoneHotspot {
            zone_id: None,
            count: 4,
        })
        .unwrap();
        assert!(json["zone_id"].is_null());
        assert_eq!(json["count"], 4);
    }

    #[test]
    fn sla_state_literals() {
        assert_eq!(
            serde_json::to_string(&SlaState::AtRisk).unwrap(),
            "\"at_risk\""
        );
    }
}
