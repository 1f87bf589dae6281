//! Cohort analysis: monthly request volume and the busiest zones.

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike as _;
use citizen_services_analytics_models::{CohortReport, MonthlyCount, ZoneHotspot};
use citizen_services_request_models::{RequestStatus, ServiceRequest};

/// Number of zones listed in [`CohortReport::hotspots`].
pub const HOTSPOT_LIMIT: usize = 10;

/// Groups `requests` by creation month and by zone.
///
/// Months come out oldest first, counting how many of each month's requests
/// are now resolved or closed. Hotspots are the [`HOTSPOT_LIMIT`] zones with
/// the most requests, busiest first and ties by zone id. Requests without a
/// zone form their own `None` group.
#[must_use]
pub fn cohorts(requests: &[ServiceRequest]) -> CohortReport {
    let mut months: BTreeMap<(i32, u32), MonthlyCount> = BTreeMap::new();
    let mut zones: HashMap<Option<&str>, u64> = HashMap::new();

    for request in requests {
        let created = request.timestamps.created_at;
        let month = months
            .entry((created.year(), created.month()))
            .or_insert_with(|| MonthlyCount {
                year: created.year(),
                month: created.month(),
                count: 0,
                resolved: 0,
            });
        month.count += 1;
        if matches!(request.status, RequestStatus::Resolved | RequestStatus::Closed) {
            month.resolved += 1;
        }

        *zones.entry(request.zone_id()).or_insert(0) += 1;
    }

    let mut hotspots: Vec<ZoneHotspot> = zones
        .into_iter()
        .map(|(zone_id, count)| ZoneHotspot {
            zone_id: zone_id.map(str::to_string),
            count,
        })
        .collect();
    hotspots.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.zone_id.cmp(&b.zone_id)));
    hotspots.truncate(HOTSPOT_LIMIT);

    log::debug!(
        "Cohorts over {} requests: {} months, {} hotspots",
        requests.len(),
        months.len(),
        hotspots.len()
    );

    CohortReport {
        time_series: months.into_values().collect(),
        hotspots,
    }
}
