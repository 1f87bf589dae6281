//! Caller identity for outgoing API calls.
//!
//! The staff admin key and the agent id are supplied by whoever hosts the
//! workflow (a browser store, a CLI flag, a test) through
//! [`CredentialProvider`]. Nothing in this crate reads storage itself.

use citizen_services_request_models::Actor;

/// Header carrying the staff admin key.
pub const STAFF_KEY_HEADER: &str = "X-Staff-Key";

/// Header carrying the acting agent's id.
pub const AGENT_ID_HEADER: &str = "X-Agent-Id";

/// Identity used when no credential is present.
pub const ANONYMOUS_ID: &str = "anonymous";

/// Supplies the credentials of the current operator.
pub trait CredentialProvider {
    /// Staff admin key, if the operator is staff.
    fn staff_key(&self) -> Option<&str>;

    /// Agent identifier, if the operator is a field agent.
    fn agent_id(&self) -> Option<&str>;
}

/// Credentials fixed at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCredentials {
    /// Staff admin key.
    pub staff_key: Option<String>,
    /// Agent identifier.
    pub agent_id: Option<String>,
}

impl StaticCredentials {
    /// Staff credentials.
    #[must_use]
    pub fn staff(key: impl Into<String>) -> Self {
        Self {
            staff_key: Some(key.into()),
            agent_id: None,
        }
    }

    /// Agent credentials.
    #[must_use]
    pub fn agent(id: impl Into<String>) -> Self {
        Self {
            staff_key: None,
            agent_id: Some(id.into()),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn staff_key(&self) -> Option<&str> {
        self.staff_key.as_deref().filter(|k| !k.is_empty())
    }

    fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Derives the acting [`Actor`] from a credential provider.
///
/// A staff key wins over an agent id; with neither the operator is an
/// anonymous citizen.
#[must_use]
pub fn actor_from_credentials(credentials: &impl CredentialProvider) -> Actor {
    if let Some(key) = credentials.staff_key() {
        return Actor::staff(key);
    }
    credentials
        .agent_id()
        .map_or_else(|| Actor::citizen(ANONYMOUS_ID), Actor::agent)
}

/// Header pairs to attach to an outgoing API call.
#[must_use]
pub fn auth_headers(credentials: &impl CredentialProvider) -> Vec<(&'static str, String)> {
    let mut headers = Vec::with_capacity(2);
    if let Some(key) = credentials.staff_key() {
        headers.push((STAFF_KEY_HEADER, key.to_string()));
    }
    if let Some(id) = credentials.agent_id() {
        headers.push((AGENT_ID_HEADER, id.to_string()));
    }
    headers
}

#[cfg(test)]
mod tests {
    use citizen_services_request_models::ActorRole;

    use super::*;

    #[test]
    fn staff_key_takes_precedence() {
        let creds = StaticCredentials {
            staff_key: Some("s3cret".to_string()),
            agent_id: Some("agent-a".to_string()),
        };
        assert_eq!(actor_from_credentials(&creds).role, ActorRole::Staff);
        assert_eq!(
            auth_headers(&creds),
            vec![
                (STAFF_KEY_HEADER, "s3cret".to_string()),
                (AGENT_ID_HEADER, "agent-a".to_string())
            ]
        );
    }

    #[test]
    fn agent_id_yields_agent_actor() {
        let actor = actor_from_credentials(&StaticCredentials::agent("agent-a"));
        assert_eq!(actor, Actor::agent("agent-a"));
    }

    #[test]
    fn empty_credentials_are_anonymous() {
        let creds = StaticCredentials {
            staff_key: Some(String::new()),
            agent_id: None,
        };
        assert_eq!(actor_from_credentials(&creds), Actor::citizen(ANONYMOUS_ID));
        assert!(auth_headers(&creds).is_empty());
    }
}
