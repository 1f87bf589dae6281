#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Citizen profile and verification types.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Whether a citizen's identity has been confirmed.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum VerificationState {
    /// Identity confirmed with a verification code.
    Verified,
    /// A verification code was sent and not yet confirmed.
    Pending,
    /// Not yet confirmed.
    #[default]
    Unverified,
}

/// A registered citizen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitizenProfile {
    /// Backend document id.
    pub id: String,
    /// Display name.
    pub full_name: String,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Neighborhood name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    /// City name (e.g. `"Amman"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Service zone the citizen lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    /// Identity verification.
    #[serde(default)]
    pub verification_state: VerificationState,
    /// Average rating the citizen gave on closed requests.
    #[serde(default)]
    pub avg_rating: f64,
    /// Number of requests submitted.
    #[serde(default)]
    pub total_requests: u32,
}

impl CitizenProfile {
    /// A freshly registered, unverified citizen.
    #[must_use]
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            email: None,
            phone: None,
            neighborhood: None,
            city: None,
            zone_id: None,
            verification_state: VerificationState::Unverified,
            avg_rating: 0.0,
            total_requests: 0,
        }
    }

    /// Returns this profile with its city set.
    #[must_use]
    pub fn in_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Returns this profile with its verification state set.
    #[must_use]
    pub fn with_verification(mut self, state: VerificationState) -> Self {
        self.verification_state = state;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_backend_defaults() {
        let citizen: CitizenProfile =
            serde_json::from_str(r#"{"id": "c-1", "full_name": "Lina Haddad"}"#).unwrap();
        assert_eq!(citizen.verification_state, VerificationState::Unverified);
        assert!(citizen.city.is_none());
        assert_eq!(citizen.total_requests, 0);
    }

    #[test]
    fn list_with_pending_verification_loads() {
        let citizens: Vec<CitizenProfile> = serde_json::from_str(
            r#"[
                {"id": "c-1", "full_name": "Lina", "verification_state": "verified"},
                {"id": "c-2", "full_name": "Omar", "verification_state": "pending"}
            ]"#,
        )
        .unwrap();
        assert_eq!(citizens[1].verification_state, VerificationState::Pending);
    }

    #[test]
    fn verification_state_uses_backend_literals() {
        assert_eq!(VerificationState::Verified.as_ref(), "verified");
        assert_eq!(
            "unverified".parse::<VerificationState>().unwrap(),
            VerificationState::Unverified
        );
    }
}
