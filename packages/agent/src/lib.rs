#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Field agents: registration, coverage zones and workload.
//!
//! Agents are registered from a form whose skills and coverage zones are
//! comma-separated text. When an agent has a base location, the zone that
//! location resolves to is always part of its coverage.

use citizen_services_geo_models::Location;
use citizen_services_request_models::{RequestStatus, ServiceRequest};
use citizen_services_zone::ZoneResolver;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while registering an agent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    /// The form had no name.
    #[error("agent name is required")]
    MissingName,
}

/// A registered field agent or team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAgent {
    /// Backend document id (`_id` in stored documents).
    #[serde(alias = "_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// `"agent"` for individuals, `"team"` for crews.
    #[serde(rename = "type", default = "default_agent_type")]
    pub agent_type: String,
    /// Skills (e.g. `"asphalt"`, `"electrical"`).
    #[serde(default)]
    pub skills: Vec<String>,
    /// Zones this agent serves.
    #[serde(default)]
    pub coverage_zones: Vec<String>,
    /// Depot or home base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_location: Option<Location>,
    /// Whether the agent takes new work.
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_agent_type() -> String {
    "agent".to_string()
}

const fn default_true() -> bool {
    true
}

impl ServiceAgent {
    /// Whether the agent serves `zone_id`.
    #[must_use]
    pub fn covers_zone(&self, zone_id: &str) -> bool {
        self.coverage_zones.iter().any(|z| z == zone_id)
    }

    /// Whether the agent has `skill`, ignoring case.
    #[must_use]
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s.eq_ignore_ascii_case(skill))
    }
}

/// Raw agent registration form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentDraft {
    /// Display name.
    pub name: String,
    /// `"agent"` or `"team"`; empty means `"agent"`.
    #[serde(default)]
    pub agent_type: String,
    /// Comma-separated skills.
    #[serde(default)]
    pub skills: String,
    /// Comma-separated coverage zones.
    #[serde(default)]
    pub coverage_zones: String,
    /// Depot or home base.
    #[serde(default)]
    pub base_location: Option<Location>,
}

impl AgentDraft {
    /// Validates the form and builds the agent record.
    ///
    /// The base location, if any, is resolved with `zones`; its zone is
    /// stored on the location and appended to the coverage zones when not
    /// already listed.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MissingName`] if the name is blank.
    pub fn into_agent(
        self,
        id: impl Into<String>,
        zones: &ZoneResolver,
    ) -> Result<ServiceAgent, AgentError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AgentError::MissingName);
        }

        let mut coverage_zones = split_list(&self.coverage_zones);
        let base_location = self.base_location.map(|location| {
            let zone = zones.resolve_zone(location.coordinate).to_string();
            merge_zone(&mut coverage_zones, &zone);
            location.with_zone(zone)
        });

        let agent_type = if self.agent_type.trim().is_empty() {
            default_agent_type()
        } else {
            self.agent_type.trim().to_string()
        };

        let agent = ServiceAgent {
            id: id.into(),
            name: name.to_string(),
            agent_type,
            skills: split_list(&self.skills),
            coverage_zones,
            base_location,
            active: true,
        };

        log::debug!(
            "Registered agent {} covering {:?}",
            agent.name,
            agent.coverage_zones
        );

        Ok(agent)
    }
}

/// Splits comma-separated form text, trimming entries and dropping blanks.
#[must_use]
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Appends `zone_id` to `zones` unless already present.
pub fn merge_zone(zones: &mut Vec<String>, zone_id: &str) {
    if !zones.iter().any(|z| z == zone_id) {
        zones.push(zone_id.to_string());
    }
}

/// Number of requests the agent is actively working.
///
/// Counts requests assigned to `agent_id` that are `assigned` or
/// `in_progress`.
#[must_use]
pub fn workload(agent_id: &str, requests: &[ServiceRequest]) -> usize {
    requests
        .iter()
        .filter(|r| r.is_assigned_to(agent_id))
        .filter(|r| matches!(r.status, RequestStatus::Assigned | RequestStatus::InProgress))
        .count()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use citizen_services_geo_models::Coordinate;

    use super::*;

    #[test]
    fn stored_agent_document_loads() {
        let agent: ServiceAgent = serde_json::from_str(
            r#"{"_id": "65a1f0c2e4b0a1b2c3d4e111", "name": "Road Crew 2", "type": "team",
                "skills": ["asphalt"], "coverage_zones": ["ZONE-DT-01"]}"#,
        )
        .unwrap();
        assert_eq!(agent.id, "65a1f0c2e4b0a1b2c3d4e111");
        assert!(agent.active);
        assert!(agent.covers_zone("ZONE-DT-01"));
    }

    #[test]
    fn split_list_trims_and_drops_blanks() {
        assert_eq!(
            split_list(" ZONE-DT-01, ZONE-N-03,, ,"),
            vec!["ZONE-DT-01", "ZONE-N-03"]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn base_location_zone_joins_coverage() {
        let draft = AgentDraft {
            name: "Crew 4".to_string(),
            agent_type: "team".to_string(),
            skills: "asphalt, signage".to_string(),
            coverage_zones: "ZONE-W-02".to_string(),
            base_location: Some(Location::new(Coordinate::new(31.9539, 35.9106))),
        };
        let agent = draft.into_agent("a-1", &ZoneResolver::builtin()).unwrap();
        assert_eq!(agent.coverage_zones, vec!["ZONE-W-02", "ZONE-DT-01"]);
        assert_eq!(
            agent.base_location.unwrap().zone_id.as_deref(),
            Some("ZONE-DT-01")
        );
        assert_eq!(agent.skills, vec!["asphalt", "signage"]);
        assert_eq!(agent.agent_type, "team");
        assert!(agent.active);
    }

    #[test]
    fn base_location_zone_is_not_duplicated() {
        let draft = AgentDraft {
            name: "Rami".to_string(),
            coverage_zones: "ZONE-DT-01".to_string(),
            base_location: Some(Location::new(Coordinate::new(31.95, 35.92))),
            ..AgentDraft::default()
        };
        let agent = draft.into_agent("a-2", &ZoneResolver::builtin()).unwrap();
        assert_eq!(agent.coverage_zones, vec!["ZONE-DT-01"]);
        assert_eq!(agent.agent_type, "agent");
    }

    #[test]
    fn blank_name_is_rejected() {
        let draft = AgentDraft {
            name: "   ".to_string(),
            ..AgentDraft::default()
        };
        assert_eq!(
            draft.into_agent("a-3", &ZoneResolver::builtin()),
            Err(AgentError::MissingName)
        );
    }

    #[test]
    fn coverage_and_skill_lookup() {
        let agent = AgentDraft {
            name: "Noor".to_string(),
            skills: "Electrical".to_string(),
            coverage_zones: "ZONE-N-03".to_string(),
            ..AgentDraft::default()
        }
        .into_agent("a-4", &ZoneResolver::builtin())
        .unwrap();
        assert!(agent.covers_zone("ZONE-N-03"));
        assert!(!agent.covers_zone("ZONE-DT-01"));
        assert!(agent.has_skill("electrical"));
    }

    #[test]
    fn workload_counts_active_assignments_only() {
        let now = Utc::now();
        let mut requests = Vec::new();
        for (status, agent) in [
            (RequestStatus::Assigned, Some("a-1")),
            (RequestStatus::InProgress, Some("a-1")),
            (RequestStatus::Resolved, Some("a-1")),
            (RequestStatus::Assigned, Some("a-2")),
            (RequestStatus::Triaged, None),
        ] {
            let mut request = ServiceRequest::new(format!("r-{}", requests.len()), "t", "c", now);
            request.status = status;
            request.assigned_agent_id = agent.map(str::to_string);
            requests.push(request);
        }
        assert_eq!(workload("a-1", &requests), 2);
        assert_eq!(workload("a-2", &requests), 1);
        assert_eq!(workload("a-9", &requests), 0);
    }
}
