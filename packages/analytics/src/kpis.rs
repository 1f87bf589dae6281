//! Headline dashboard KPIs.

use std::collections::BTreeMap;

use citizen_services_analytics_models::KpiSummary;
use citizen_services_request_models::{RequestStatus, ServiceRequest};

use crate::sla::{is_breached, resolution_hours, sla_policy};

/// Computes backlog, average resolution time and SLA breach rate.
///
/// * `backlog` counts requests per status; statuses with no requests are
///   absent.
/// * `avg_resolution_hours` averages over `resolved`/`closed` requests that
///   carry a `resolved_at`; `None` when there are none.
/// * `sla_breach_rate` is breached requests over all requests, each judged
///   against the policy for its category and priority; `None` for an empty
///   list.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn kpis(requests: &[ServiceRequest]) -> KpiSummary {
    let mut backlog = BTreeMap::new();
    let mut resolution_total = 0.0;
    let mut resolution_count = 0_u64;
    let mut breached = 0_u64;

    for request in requests {
        *backlog.entry(request.status).or_insert(0) += 1;

        if matches!(request.status, RequestStatus::Resolved | RequestStatus::Closed)
            && let Some(hours) = resolution_hours(request)
        {
            resolution_total += hours;
            resolution_count += 1;
        }

        if is_breached(request, &sla_policy(&request.category, request.priority)) {
            breached += 1;
        }
    }

    let summary = KpiSummary {
        backlog,
        avg_resolution_hours: (resolution_count > 0)
            .then(|| resolution_total / resolution_count as f64),
        sla_breach_rate: (!requests.is_empty()).then(|| breached as f64 / requests.len() as f64),
    };

    log::debug!(
        "KPIs over {} requests: {resolution_count} resolved, {breached} breached",
        requests.len()
    );

    summary
}
