//! Request statistics for one citizen.

use std::collections::BTreeMap;

use citizen_services_analytics_models::CitizenStatistics;
use citizen_services_citizen_models::CitizenProfile;
use citizen_services_request_models::ServiceRequest;

/// Summarizes the requests `citizen` submitted.
///
/// A request belongs to the citizen when its `citizen_id` matches the
/// profile id. Statuses with no requests are absent from the breakdown.
#[must_use]
pub fn citizen_statistics(
    citizen: &CitizenProfile,
    requests: &[ServiceRequest],
) -> CitizenStatistics {
    let mut status_breakdown = BTreeMap::new();
    let mut total_requests = 0;

    for request in requests
        .iter()
        .filter(|r| r.citizen_id.as_deref() == Some(citizen.id.as_str()))
    {
        *status_breakdown.entry(request.status).or_insert(0) += 1;
        total_requests += 1;
    }

    CitizenStatistics {
        citizen_id: citizen.id.clone(),
        citizen_name: citizen.full_name.clone(),
        total_requests,
        status_breakdown,
        verification_state: citizen.verification_state,
        avg_rating: citizen.avg_rating,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use citizen_services_citizen_models::VerificationState;
    use citizen_services_request_models::RequestStatus;

    use super::*;

    fn request(id: &str, status: RequestStatus, citizen: Option<&str>) -> ServiceRequest {
        let created = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let mut request = ServiceRequest::new(id, "t", "pothole", created);
        request.status = status;
        request.citizen_id = citizen.map(str::to_string);
        request
    }

    #[test]
    fn only_the_citizens_requests_are_counted() {
        let mut citizen = CitizenProfile::new("c-1", "Lina Haddad");
        citizen.verification_state = VerificationState::Verified;
        citizen.avg_rating = 4.5;
        let requests = vec![
            request("r-1", RequestStatus::New, Some("c-1")),
            request("r-2", RequestStatus::Closed, Some("c-1")),
            request("r-3", RequestStatus::New, Some("c-1")),
            request("r-4", RequestStatus::New, Some("c-2")),
            request("r-5", RequestStatus::New, None),
        ];

        let stats = citizen_statistics(&citizen, &requests);
        assert_eq!(stats.total_requests, 3);
        assert_eq!(
            stats.status_breakdown,
            BTreeMap::from([(RequestStatus::New, 2), (RequestStatus::Closed, 1)])
        );
        assert_eq!(stats.citizen_name, "Lina Haddad");
        assert_eq!(stats.verification_state, VerificationState::Verified);
        assert!((stats.avg_rating - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn citizen_without_requests_has_empty_breakdown() {
        let stats = citizen_statistics(&CitizenProfile::new("c-9", "New Citizen"), &[]);
        assert_eq!(stats.total_requests, 0);
        assert!(stats.status_breakdown.is_empty());
    }
}
