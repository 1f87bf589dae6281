#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Dashboard analytics over fetched service requests.
//!
//! Everything here is computed in memory from a request list: SLA policy
//! lookup, the KPI summary, the live heat-map feed, and the cohort, agent
//! and citizen reports. A
//! [`DashboardQuery`] narrows the list the same way the dashboard's
//! filter bar does before any of these run.

pub mod agents;
pub mod citizens;
pub mod cohorts;
pub mod heatmap;
pub mod kpis;
pub mod sla;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use citizen_services_filter::{Filter, RequestFilter, apply_filter};
use citizen_services_request_models::ServiceRequest;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use agents::agent_productivity;
pub use citizens::citizen_statistics;
pub use cohorts::cohorts;
pub use heatmap::{bucket_points, feature_collection, heatmap};
pub use kpis::kpis;
pub use sla::{is_breached, resolution_hours, sla_policy, sla_state};

/// Errors that can occur while building a dashboard query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// A date parameter could not be parsed.
    #[error("Invalid date '{value}': {message}. Expected format: YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS")]
    InvalidDate {
        /// The rejected input.
        value: String,
        /// Parser message.
        message: String,
    },
}

/// Parses a dashboard date parameter as UTC.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` datetime, or a bare
/// `YYYY-MM-DD` date (midnight).
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidDate`] if none of the formats match.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, AnalyticsError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
        .map_err(|e| AnalyticsError::InvalidDate {
            value: s.to_string(),
            message: e.to_string(),
        })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// The dashboard filter bar: request fields plus a creation-time window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardQuery {
    /// Field filters.
    #[serde(flatten)]
    pub filter: RequestFilter,
    /// Inclusive lower bound on `created_at`.
    #[serde(default)]
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    #[serde(default)]
    pub created_to: Option<DateTime<Utc>>,
}

impl DashboardQuery {
    /// Builds a query from raw parameters; empty strings mean "any".
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidDate`] if a date bound is malformed.
    pub fn from_params(
        category: Option<&str>,
        zone_id: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Self, AnalyticsError> {
        Ok(Self {
            filter: RequestFilter {
                category: non_empty(category).map(str::to_string),
                zone_id: non_empty(zone_id).map(str::to_string),
                ..RequestFilter::default()
            },
            created_from: non_empty(start_date).map(parse_date).transpose()?,
            created_to: non_empty(end_date).map(parse_date).transpose()?,
        })
    }

    /// Requests this query selects, in input order.
    #[must_use]
    pub fn select(&self, requests: &[ServiceRequest]) -> Vec<ServiceRequest> {
        apply_filter(requests, self)
    }
}

impl Filter<ServiceRequest> for DashboardQuery {
    fn matches(&self, request: &ServiceRequest) -> bool {
        let created = request.timestamps.created_at;
        if self.created_from.is_some_and(|from| created < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| created > to) {
            return false;
        }
        self.filter.matches(request)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parse_date_accepts_three_formats() {
        let midnight = Utc.with_ymd_and_hms(2026, 1, 23, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2026-01-23").unwrap(), midnight);
        assert_eq!(parse_date("2026-01-23T00:00:00").unwrap(), midnight);
        assert_eq!(parse_date("2026-01-23T02:00:00+02:00").unwrap(), midnight);
    }

    #[test]
    fn parse_date_rejects_garbage() {
        let err = parse_date("23/01/2026").unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidDate { ref value, .. } if value == "23/01/2026"));
    }

    #[test]
    fn empty_params_build_the_identity_query() {
        let query = DashboardQuery::from_params(Some(""), None, Some(""), None).unwrap();
        assert_eq!(query, DashboardQuery::default());
    }

    #[test]
    fn blank_params_are_unset_and_dates_still_parse() {
        let query = DashboardQuery::from_params(None, Some("ZONE-DT-01"), Some("2026-01-02"), Some(""))
            .unwrap();
        assert_eq!(query.filter.zone_id.as_deref(), Some("ZONE-DT-01"));
        assert!(query.filter.category.is_none());
        assert_eq!(
            query.created_from,
            Some(Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap())
        );
        assert!(query.created_to.is_none());
    }

    #[test]
    fn date_window_is_inclusive() {
        let at = |day| Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0).unwrap();
        let requests: Vec<ServiceRequest> = (1..=5)
            .map(|day| ServiceRequest::new(format!("r-{day}"), "t", "pothole", at(day)))
            .collect();

        let query =
            DashboardQuery::from_params(Some("Pothole"), None, Some("2026-01-02"), Some("2026-01-04"))
                .unwrap();
        let ids: Vec<String> = query.select(&requests).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["r-2", "r-3", "r-4"]);
    }
}
