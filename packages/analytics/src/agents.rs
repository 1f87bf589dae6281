//! Per-agent productivity.

use std::collections::BTreeMap;

use citizen_services_agent::ServiceAgent;
use citizen_services_analytics_models::AgentProductivity;
use citizen_services_request_models::{RequestStatus, ServiceRequest};

/// Name reported for an assigned id missing from the agent list.
pub const UNKNOWN_AGENT: &str = "Unknown";

/// Counts open and resolved requests per assigned agent.
///
/// Unassigned requests are ignored. Names come from `agents`. The result
/// is sorted by open count, highest first, then by agent id.
#[must_use]
pub fn agent_productivity(
    requests: &[ServiceRequest],
    agents: &[ServiceAgent],
) -> Vec<AgentProductivity> {
    let mut counts: BTreeMap<&str, (u64, u64)> = BTreeMap::new();

    for request in requests {
        let Some(agent_id) = request.assigned_agent_id.as_deref() else {
            continue;
        };
        let (open, resolved) = counts.entry(agent_id).or_insert((0, 0));
        if request.status.is_open() {
            *open += 1;
        } else if matches!(request.status, RequestStatus::Resolved | RequestStatus::Closed) {
            *resolved += 1;
        }
    }

    let mut rows: Vec<AgentProductivity> = counts
        .into_iter()
        .map(|(agent_id, (open, resolved))| {
            let agent_name = agents.iter().find(|a| a.id == agent_id).map_or_else(
                || {
                    log::warn!("Requests assigned to unregistered agent {agent_id}");
                    UNKNOWN_AGENT.to_string()
                },
                |a| a.name.clone(),
            );
            AgentProductivity {
                agent_id: agent_id.to_string(),
                agent_name,
                open,
                resolved,
            }
        })
        .collect();
    // Ties stay in id order.
    rows.sort_by(|a, b| b.open.cmp(&a.open));
    rows
}
