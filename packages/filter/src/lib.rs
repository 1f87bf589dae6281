#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Client-side filtering of already-fetched lists.
//!
//! The backend filters too, but a list on screen can be stale relative to
//! the filter controls. Re-applying the same [`Filter`] locally gives the
//! same answer no matter when the list was fetched. Filters are plain
//! values: build one per interaction, apply it, drop it.
//!
//! Every filter field is optional and an unset field matches everything,
//! so `Default::default()` is the identity filter.

use citizen_services_citizen_models::{CitizenProfile, VerificationState};
use citizen_services_request_models::{Priority, RequestStatus, ServiceRequest};
use serde::{Deserialize, Serialize};

/// A predicate over items of type `T`.
pub trait Filter<T> {
    /// Whether `item` passes.
    fn matches(&self, item: &T) -> bool;

    /// Combines two filters; an item must pass both.
    fn and<O>(self, other: O) -> And<Self, O>
    where
        Self: Sized,
        O: Filter<T>,
    {
        And(self, other)
    }
}

/// Both filters must match. Built by [`Filter::and`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct And<A, B>(A, B);

impl<T, A: Filter<T>, B: Filter<T>> Filter<T> for And<A, B> {
    fn matches(&self, item: &T) -> bool {
        self.0.matches(item) && self.1.matches(item)
    }
}

/// Returns the items that pass `filter`, in their original order.
///
/// The input slice is not modified. Applying the same filter to the output
/// again returns the same list.
#[must_use]
pub fn apply_filter<T: Clone, F: Filter<T> + ?Sized>(items: &[T], filter: &F) -> Vec<T> {
    let kept: Vec<T> = items
        .iter()
        .filter(|item| filter.matches(item))
        .cloned()
        .collect();
    log::trace!("Filter kept {} of {} items", kept.len(), items.len());
    kept
}

/// Citizen list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenFilter {
    /// Exact verification state.
    #[serde(default)]
    pub verification_state: Option<VerificationState>,
    /// Case-insensitive substring of the citizen's city.
    #[serde(default)]
    pub city_substring: Option<String>,
}

impl CitizenFilter {
    /// Builds a filter from raw form values, where an empty string means
    /// "All".
    ///
    /// An unrecognized verification value is ignored (treated as "All").
    #[must_use]
    pub fn from_form(verification_state: &str, city: &str) -> Self {
        let verification_state = if verification_state.is_empty() {
            None
        } else {
            let parsed = verification_state.parse().ok();
            if parsed.is_none() {
                log::warn!("Ignoring unknown verification state {verification_state:?}");
            }
            parsed
        };

        Self {
            verification_state,
            city_substring: Some(city.to_string()).filter(|c| !c.is_empty()),
        }
    }

    /// Whether no predicate is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.verification_state.is_none() && self.active_city().is_none()
    }

    fn active_city(&self) -> Option<&str> {
        self.city_substring.as_deref().filter(|c| !c.is_empty())
    }
}

impl Filter<CitizenProfile> for CitizenFilter {
    fn matches(&self, citizen: &CitizenProfile) -> bool {
        if let Some(state) = self.verification_state
            && citizen.verification_state != state
        {
            return false;
        }

        if let Some(needle) = self.active_city() {
            return citizen
                .city
                .as_deref()
                .is_some_and(|city| contains_ignore_case(city, needle));
        }

        true
    }
}

/// Request list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFilter {
    /// Exact status.
    #[serde(default)]
    pub status: Option<RequestStatus>,
    /// Category name, compared case-insensitively.
    #[serde(default)]
    pub category: Option<String>,
    /// Exact priority.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Exact zone of the request's location.
    #[serde(default)]
    pub zone_id: Option<String>,
}

impl Filter<ServiceRequest> for RequestFilter {
    fn matches(&self, request: &ServiceRequest) -> bool {
        if self.status.is_some_and(|s| s != request.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != request.priority) {
            return false;
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty())
            && !request.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(zone) = self.zone_id.as_deref().filter(|z| !z.is_empty())
            && request.zone_id() != Some(zone)
        {
            return false;
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
