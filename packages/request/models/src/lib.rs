#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Service request, status, actor and lifecycle event types.
//!
//! [`RequestStatus`] is the single canonical status vocabulary. Its
//! serialized form is the exact snake_case literal the REST backend
//! accepts. Older screens used a smaller `pending/in_progress/resolved`
//! set with display-only labels such as `"IN PROGRESS"`; those map onto the
//! canonical set through [`RequestStatus::from_legacy_label`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use citizen_services_geo_models::Location;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Workflow status of a service request.
///
/// Declaration order follows the lifecycle backbone, so `Ord` sorts
/// statuses from intake to closure.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    /// Just submitted by a citizen.
    New,
    /// Acknowledged and waiting for triage.
    Pending,
    /// Categorized and prioritized by staff.
    Triaged,
    /// Handed to a field agent.
    Assigned,
    /// Field work under way.
    InProgress,
    /// Work complete; awaiting closure.
    Resolved,
    /// Terminal.
    Closed,
}

impl RequestStatus {
    /// Returns all variants of this enum in lifecycle order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::New,
            Self::Pending,
            Self::Triaged,
            Self::Assigned,
            Self::InProgress,
            Self::Resolved,
            Self::Closed,
        ]
    }

    /// Whether the request still needs work (shown on the live map).
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Resolved | Self::Closed)
    }

    /// Whether no further transition can leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Maps a label from any screen onto the canonical status.
    ///
    /// Accepts the backend literals (`"in_progress"`), the upper-cased
    /// display labels (`"IN PROGRESS"`) and hyphenated variants, ignoring
    /// case and surrounding whitespace. Returns `None` for anything else.
    #[must_use]
    pub fn from_legacy_label(label: &str) -> Option<Self> {
        let normalized = label
            .trim()
            .to_ascii_lowercase()
            .replace([' ', '-'], "_");
        normalized.parse().ok()
    }

    /// Returns the label shown on status badges (e.g. `"IN PROGRESS"`).
    #[must_use]
    pub fn display_label(self) -> String {
        self.as_ref().replace('_', " ").to_ascii_uppercase()
    }
}

/// Request priority, `P0` being the most urgent.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Priority {
    /// Emergency.
    P0,
    /// High.
    P1,
    /// Normal.
    #[default]
    P2,
    /// Low.
    P3,
}

/// The capability class of whoever performs an operation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActorRole {
    /// May comment, rate and attach evidence; never changes status.
    Citizen,
    /// Field agent; acts only on requests assigned to them.
    Agent,
    /// Municipal staff; may triage, assign and correct.
    Staff,
    /// Automated processes (auto-assignment, SLA jobs).
    System,
}

impl ActorRole {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Citizen, Self::Agent, Self::Staff, Self::System]
    }
}

/// A role plus an opaque identity (agent id, staff key holder, citizen id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// Capability class.
    #[serde(rename = "actor_type")]
    pub role: ActorRole,
    /// Opaque identifier.
    #[serde(rename = "actor_id")]
    pub id: String,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub fn new(role: ActorRole, id: impl Into<String>) -> Self {
        Self {
            role,
            id: id.into(),
        }
    }

    /// A citizen actor.
    #[must_use]
    pub fn citizen(id: impl Into<String>) -> Self {
        Self::new(ActorRole::Citizen, id)
    }

    /// A field agent actor.
    #[must_use]
    pub fn agent(id: impl Into<String>) -> Self {
        Self::new(ActorRole::Agent, id)
    }

    /// A staff actor.
    #[must_use]
    pub fn staff(id: impl Into<String>) -> Self {
        Self::new(ActorRole::Staff, id)
    }

    /// The automated system actor.
    #[must_use]
    pub fn system() -> Self {
        Self::new(ActorRole::System, "system")
    }
}

/// A field-work event reported by an agent.
///
/// Milestones are recorded alongside the status; posting one never moves
/// the request through the workflow.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Milestone {
    /// Agent reached the site.
    Arrived,
    /// Agent started the repair.
    WorkStarted,
    /// Agent finished on site.
    Resolved,
}

/// Lifecycle timestamps of a request.
///
/// The backend writes naive UTC datetimes (`2026-01-23T10:15:00.123456`);
/// those are read as UTC. Output is always RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// When the request was submitted.
    #[serde(deserialize_with = "backend_time::deserialize")]
    pub created_at: DateTime<Utc>,
    /// Last accepted change.
    #[serde(deserialize_with = "backend_time::deserialize")]
    pub updated_at: DateTime<Utc>,
    /// When the request entered `triaged`.
    #[serde(default, deserialize_with = "backend_time::deserialize_option")]
    pub triaged_at: Option<DateTime<Utc>>,
    /// When the request entered `assigned`.
    #[serde(default, deserialize_with = "backend_time::deserialize_option")]
    pub assigned_at: Option<DateTime<Utc>>,
    /// When the request entered `resolved`. Drives SLA reporting.
    #[serde(default, deserialize_with = "backend_time::deserialize_option")]
    pub resolved_at: Option<DateTime<Utc>>,
    /// When the request entered `closed`.
    #[serde(default, deserialize_with = "backend_time::deserialize_option")]
    pub closed_at: Option<DateTime<Utc>>,
}

/// Datetime parsing for backend documents.
pub mod backend_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, de::Error as _};

    /// Parses RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.fff]` datetime as
    /// UTC.
    ///
    /// # Errors
    ///
    /// Returns the last parser error if no format matches.
    pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
            .map(|dt| dt.and_utc())
    }

    /// `deserialize_with` adapter for required datetimes.
    ///
    /// # Errors
    ///
    /// Fails on anything [`parse`] rejects.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(d)?;
        parse(&s).map_err(|e| D::Error::custom(format!("invalid datetime '{s}': {e}")))
    }

    /// `deserialize_with` adapter for optional datetimes; `null` is `None`.
    ///
    /// # Errors
    ///
    /// Fails on anything [`parse`] rejects.
    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|s| parse(&s).map_err(|e| D::Error::custom(format!("invalid datetime '{s}': {e}"))))
            .transpose()
    }
}

impl Timestamps {
    /// Timestamps for a request created at `at`.
    #[must_use]
    pub const fn created(at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            updated_at: at,
            triaged_at: None,
            assigned_at: None,
            resolved_at: None,
            closed_at: None,
        }
    }
}

/// A citizen service request.
///
/// Reads backend documents as stored: the id may arrive as `_id`, the
/// agent under `assignment.assigned_agent_id` and the submitter under
/// `citizen_ref.citizen_id`. Writes the flat form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RequestDocument")]
pub struct ServiceRequest {
    /// Backend document id.
    pub id: String,
    /// Human-facing reference (e.g. `"CST-2026-20260114"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Short summary.
    pub title: String,
    /// Category name (e.g. `"pothole"`).
    pub category: String,
    /// Priority.
    #[serde(default)]
    pub priority: Priority,
    /// Current workflow status.
    pub status: RequestStatus,
    /// Where the issue is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Agent currently responsible, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_agent_id: Option<String>,
    /// Submitting citizen, if not anonymous.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citizen_id: Option<String>,
    /// Lifecycle timestamps.
    pub timestamps: Timestamps,
    /// Staff-only notes, prefixed with the state they were written in.
    #[serde(default)]
    pub internal_notes: Vec<String>,
    /// Manual escalations so far.
    #[serde(default)]
    pub escalation_count: u32,
}

#[derive(Deserialize)]
struct RequestDocument {
    #[serde(alias = "_id")]
    id: String,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    title: String,
    category: String,
    #[serde(default)]
    priority: Priority,
    status: RequestStatus,
    #[serde(default)]
    location: Option<Location>,
    #[serde(default)]
    assigned_agent_id: Option<String>,
    #[serde(default)]
    assignment: Option<AssignmentDocument>,
    #[serde(default)]
    citizen_id: Option<String>,
    #[serde(default)]
    citizen_ref: Option<CitizenRefDocument>,
    timestamps: Timestamps,
    #[serde(default)]
    internal_notes: Vec<String>,
    #[serde(default)]
    escalation_count: u32,
}

#[derive(Deserialize)]
struct AssignmentDocument {
    #[serde(default)]
    assigned_agent_id: Option<String>,
}

#[derive(Deserialize)]
struct CitizenRefDocument {
    #[serde(default)]
    citizen_id: Option<String>,
}

impl From<RequestDocument> for ServiceRequest {
    fn from(doc: RequestDocument) -> Self {
        Self {
            id: doc.id,
            request_id: doc.request_id,
            title: doc.title,
            category: doc.category,
            priority: doc.priority,
            status: doc.status,
            location: doc.location,
            assigned_agent_id: doc
                .assigned_agent_id
                .or_else(|| doc.assignment.and_then(|a| a.assigned_agent_id)),
            citizen_id: doc
                .citizen_id
                .or_else(|| doc.citizen_ref.and_then(|c| c.citizen_id)),
            timestamps: doc.timestamps,
            internal_notes: doc.internal_notes,
            escalation_count: doc.escalation_count,
        }
    }
}

impl ServiceRequest {
    /// Creates a `new` request.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            request_id: None,
            title: title.into(),
            category: category.into(),
            priority: Priority::default(),
            status: RequestStatus::New,
            location: None,
            assigned_agent_id: None,
            citizen_id: None,
            timestamps: Timestamps::created(created_at),
            internal_notes: Vec::new(),
            escalation_count: 0,
        }
    }

    /// Zone of the request's location, if resolved.
    #[must_use]
    pub fn zone_id(&self) -> Option<&str> {
        self.location.as_ref()?.zone_id.as_deref()
    }

    /// Whether `agent_id` is the assigned agent.
    #[must_use]
    pub fn is_assigned_to(&self, agent_id: &str) -> bool {
        self.assigned_agent_id.as_deref() == Some(agent_id)
    }
}

/// Events about the request record rather than its status or field work.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordEvent {
    /// The request was submitted.
    Created,
    /// Staff escalated the request by hand.
    ManualEscalation,
}

/// What a [`LifecycleEvent`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LifecycleEventType {
    /// A status transition into this status.
    Transition(RequestStatus),
    /// A field-work milestone.
    Milestone(Milestone),
    /// A record event.
    Record(RecordEvent),
}

/// An entry in a request's audit event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// What happened.
    #[serde(rename = "type")]
    pub event_type: LifecycleEventType,
    /// Who did it.
    pub by: Actor,
    /// When.
    pub at: DateTime<Utc>,
    /// Optional free text supplied with the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Extra details (e.g. `escalation_level`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn status_literals_match_backend_vocabulary() {
        let literals: Vec<&str> = RequestStatus::all().iter().map(AsRef::as_ref).collect();
        assert_eq!(
            literals,
            vec![
                "new",
                "pending",
                "triaged",
                "assigned",
                "in_progress",
                "resolved",
                "closed"
            ]
        );
        for status in RequestStatus::all() {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_ref()));
            assert_eq!(RequestStatus::from_str(status.as_ref()).unwrap(), *status);
        }
    }

    #[test]
    fn legacy_labels_map_to_canonical_statuses() {
        assert_eq!(
            RequestStatus::from_legacy_label("IN PROGRESS"),
            Some(RequestStatus::InProgress)
        );
        assert_eq!(
            RequestStatus::from_legacy_label(" in-progress "),
            Some(RequestStatus::InProgress)
        );
        assert_eq!(
            RequestStatus::from_legacy_label("Pending"),
            Some(RequestStatus::Pending)
        );
        assert_eq!(
            RequestStatus::from_legacy_label("RESOLVED"),
            Some(RequestStatus::Resolved)
        );
        assert_eq!(RequestStatus::from_legacy_label("reopened"), None);
        assert_eq!(RequestStatus::from_legacy_label(""), None);
    }

    #[test]
    fn display_label_matches_badges() {
        assert_eq!(RequestStatus::InProgress.display_label(), "IN PROGRESS");
        assert_eq!(RequestStatus::New.display_label(), "NEW");
    }

    #[test]
    fn open_statuses_exclude_resolved_and_closed() {
        let open: Vec<RequestStatus> = RequestStatus::all()
            .iter()
            .copied()
            .filter(|s| s.is_open())
            .collect();
        assert_eq!(open.len(), 5);
        assert!(!RequestStatus::Resolved.is_open());
        assert!(RequestStatus::Closed.is_terminal());
    }

    #[test]
    fn actor_serializes_with_backend_field_names() {
        let json = serde_json::to_value(Actor::agent("agent-7")).unwrap();
        assert_eq!(json["actor_type"], "agent");
        assert_eq!(json["actor_id"], "agent-7");
    }

    #[test]
    fn event_type_serializes_as_plain_literal() {
        let transition =
            serde_json::to_string(&LifecycleEventType::Transition(RequestStatus::Triaged)).unwrap();
        let milestone =
            serde_json::to_string(&LifecycleEventType::Milestone(Milestone::WorkStarted)).unwrap();
        assert_eq!(transition, "\"triaged\"");
        assert_eq!(milestone, "\"work_started\"");
    }

    #[test]
    fn record_events_use_backend_literals() {
        let created: LifecycleEventType = serde_json::from_str("\"created\"").unwrap();
        assert_eq!(created, LifecycleEventType::Record(RecordEvent::Created));
        assert_eq!(
            serde_json::to_string(&LifecycleEventType::Record(RecordEvent::ManualEscalation))
                .unwrap(),
            "\"manual_escalation\""
        );
    }

    const SEEDED_REQUEST: &str = r#"{
        "_id": "65a1f0c2e4b0a1b2c3d4e5f6",
        "request_id": "CST-2026-0002",
        "citizen_ref": {"citizen_id": "65a1f0c2e4b0a1b2c3d4e000", "anonymous": false},
        "category": "water_leak",
        "sub_category": "main_pipe",
        "title": "Water Main Break at Intersection",
        "status": "in_progress",
        "priority": "P1",
        "workflow": {"current_state": "in_progress", "transition_rules_version": "v1.2"},
        "sla_policy": {"policy_id": "SLA-WATER-P1", "target_hours": 24},
        "timestamps": {
            "created_at": "2026-01-22T08:00:00.123456",
            "triaged_at": "2026-01-22T08:15:00",
            "assigned_at": "2026-01-22T09:15:00",
            "resolved_at": null,
            "closed_at": null,
            "updated_at": "2026-01-22T09:15:00"
        },
        "location": {
            "type": "Point",
            "coordinates": [35.9106, 31.9539],
            "address_hint": "Rainbow St",
            "zone_id": "ZONE-DT-01"
        },
        "assignment": {"assigned_agent_id": "agent-7", "assignment_policy": "zone+skill+workload"},
        "internal_notes": ["[assigned] Crew dispatched"]
    }"#;

    #[test]
    fn reads_backend_request_document() {
        use chrono::TimeZone as _;

        let request: ServiceRequest = serde_json::from_str(SEEDED_REQUEST).unwrap();
        assert_eq!(request.id, "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(request.request_id.as_deref(), Some("CST-2026-0002"));
        assert_eq!(request.status, RequestStatus::InProgress);
        assert_eq!(request.priority, Priority::P1);
        assert_eq!(request.assigned_agent_id.as_deref(), Some("agent-7"));
        assert_eq!(request.citizen_id.as_deref(), Some("65a1f0c2e4b0a1b2c3d4e000"));
        assert_eq!(request.zone_id(), Some("ZONE-DT-01"));
        assert_eq!(
            request.location.as_ref().unwrap().coordinate.to_lng_lat(),
            [35.9106, 31.9539]
        );
        assert_eq!(
            request.timestamps.triaged_at,
            Some(Utc.with_ymd_and_hms(2026, 1, 22, 8, 15, 0).unwrap())
        );
        assert!(request.timestamps.resolved_at.is_none());
        assert_eq!(request.escalation_count, 0);
    }

    #[test]
    fn backend_document_survives_a_write_and_read() {
        let request: ServiceRequest = serde_json::from_str(SEEDED_REQUEST).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["id"], "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(json["location"]["type"], "Point");
        assert_eq!(json["assigned_agent_id"], "agent-7");
        let again: ServiceRequest = serde_json::from_value(json).unwrap();
        assert_eq!(again, request);
    }

    #[test]
    fn bad_timestamp_is_an_error() {
        let broken = SEEDED_REQUEST.replace("2026-01-22T08:15:00\"", "yesterday\"");
        let err = serde_json::from_str::<ServiceRequest>(&broken).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn request_defaults_to_new_p2() {
        let request = ServiceRequest::new("r1", "Pothole on Rainbow St", "pothole", Utc::now());
        assert_eq!(request.status, RequestStatus::New);
        assert_eq!(request.priority, Priority::P2);
        assert_eq!(request.timestamps.created_at, request.timestamps.updated_at);
        assert!(request.zone_id().is_none());
    }
}
