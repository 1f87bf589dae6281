//! Live heat-map feed of open requests.
//!
//! Each open request with coordinates becomes one weighted point. Urgent
//! and long-waiting requests glow hotter: the weight is the priority weight
//! scaled by `1 + sqrt(age_hours)`. Points can be grouped into 0.01 degree
//! cells for the map layer, and exported as a `GeoJSON` feature collection.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use citizen_services_analytics_models::{HeatBucket, HeatFeature};
use citizen_services_request_models::{Priority, ServiceRequest};
use geojson::{Feature, FeatureCollection, Geometry, Value};

const fn priority_weight(priority: Priority) -> f64 {
    match priority {
        Priority::P0 => 4.0,
        Priority::P1 => 3.0,
        Priority::P2 => 2.0,
        Priority::P3 => 1.0,
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10_f64.powi(places);
    (value * scale).round() / scale
}

/// Builds heat points for the open requests in `requests` as of `now`.
///
/// Resolved and closed requests are skipped, as are requests without a
/// location. A request created after `now` has age zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn heatmap(requests: &[ServiceRequest], now: DateTime<Utc>) -> Vec<HeatFeature> {
    let mut features = Vec::new();

    for request in requests.iter().filter(|r| r.status.is_open()) {
        let Some(location) = &request.location else {
            log::warn!("Request {} has no coordinates, leaving it off the heat map", request.id);
            continue;
        };

        let age_hours = ((now - request.timestamps.created_at).num_milliseconds() as f64
            / 3_600_000.0)
            .max(0.0);
        let weight = priority_weight(request.priority) * (1.0 + age_hours.sqrt());

        features.push(HeatFeature {
            request_id: request.id.clone(),
            category: request.category.clone(),
            priority: request.priority,
            status: request.status,
            lat: location.coordinate.lat,
            lng: location.coordinate.lng,
            weight: round_to(weight, 3),
            age_hours: round_to(age_hours, 2),
        });
    }

    log::debug!("Heat map: {} of {} requests plotted", features.len(), requests.len());

    features
}

/// Groups heat points into 0.01 degree cells.
///
/// Cells are keyed on both coordinates formatted to two decimals. A cell
/// takes the position of its first point, sums the weights, and lists its
/// members in input order. Cells come out in first-seen order.
#[must_use]
pub fn bucket_points(features: &[HeatFeature]) -> Vec<HeatBucket> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<HeatBucket> = Vec::new();

    for feature in features {
        let key = format!("{:.2}|{:.2}", feature.lat, feature.lng);
        if let Some(&i) = index.get(&key) {
            let bucket = &mut buckets[i];
            bucket.weight += feature.weight;
            bucket.request_ids.push(feature.request_id.clone());
        } else {
            index.insert(key, buckets.len());
            buckets.push(HeatBucket {
                lat: feature.lat,
                lng: feature.lng,
                weight: feature.weight,
                request_ids: vec![feature.request_id.clone()],
            });
        }
    }

    buckets
}

/// Exports heat points as a `GeoJSON` `FeatureCollection` of `Point`s.
#[must_use]
pub fn feature_collection(features: &[HeatFeature]) -> FeatureCollection {
    features
        .iter()
        .map(|f| {
            let mut feature = Feature::from(Geometry::new(Value::Point(vec![f.lng, f.lat])));
            feature.set_property("request_id", f.request_id.as_str());
            feature.set_property("category", f.category.as_str());
            feature.set_property("priority", f.priority.to_string());
            feature.set_property("status", f.status.to_string());
            feature.set_property("weight", f.weight);
            feature.set_property("age_hours", f.age_hours);
            feature
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use citizen_services_geo_models::{Coordinate, Location};
    use citizen_services_request_models::RequestStatus;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap()
    }

    fn request(
        id: &str,
        priority: Priority,
        status: RequestStatus,
        age_hours: i64,
        at: Option<(f64, f64)>,
    ) -> ServiceRequest {
        let mut request =
            ServiceRequest::new(id, "t", "pothole", now() - Duration::hours(age_hours));
        request.priority = priority;
        request.status = status;
        request.location = at.map(|(lat, lng)| Location::new(Coordinate::new(lat, lng)));
        request
    }

    #[test]
    fn weight_scales_priority_by_age() {
        let requests = vec![
            request("r-1", Priority::P0, RequestStatus::New, 4, Some((31.95, 35.91))),
            request("r-2", Priority::P3, RequestStatus::Assigned, 0, Some((31.95, 35.91))),
        ];
        let features = heatmap(&requests, now());
        // 4 * (1 + 2) and 1 * (1 + 0)
        assert_eq!(features[0].weight, 12.0);
        assert_eq!(features[0].age_hours, 4.0);
        assert_eq!(features[1].weight, 1.0);
    }

    #[test]
    fn weight_and_age_are_rounded() {
        let mut r = request("r-1", Priority::P2, RequestStatus::Pending, 0, Some((31.95, 35.91)));
        r.timestamps.created_at = now() - Duration::minutes(20);
        let feature = &heatmap(&[r], now())[0];
        assert_eq!(feature.age_hours, 0.33);
        // 2 * (1 + sqrt(1/3)) = 3.1547...
        assert_eq!(feature.weight, 3.155);
    }

    #[test]
    fn closed_and_unlocated_requests_are_skipped() {
        let requests = vec![
            request("r-1", Priority::P1, RequestStatus::Resolved, 1, Some((31.95, 35.91))),
            request("r-2", Priority::P1, RequestStatus::Closed, 1, Some((31.95, 35.91))),
            request("r-3", Priority::P1, RequestStatus::InProgress, 1, None),
            request("r-4", Priority::P1, RequestStatus::Triaged, 1, Some((31.95, 35.91))),
        ];
        let ids: Vec<String> = heatmap(&requests, now())
            .into_iter()
            .map(|f| f.request_id)
            .collect();
        assert_eq!(ids, vec!["r-4"]);
    }

    #[test]
    fn future_creation_has_zero_age() {
        let r = request("r-1", Priority::P1, RequestStatus::New, -5, Some((31.95, 35.91)));
        let feature = &heatmap(&[r], now())[0];
        assert_eq!(feature.age_hours, 0.0);
        assert_eq!(feature.weight, 3.0);
    }

    #[test]
    fn buckets_group_by_two_decimals_in_first_seen_order() {
        let requests = vec![
            request("r-1", Priority::P3, RequestStatus::New, 0, Some((31.9512, 35.9101))),
            request("r-2", Priority::P3, RequestStatus::New, 0, Some((31.9800, 35.9500))),
            request("r-3", Priority::P2, RequestStatus::New, 0, Some((31.9509, 35.9098))),
        ];
        let buckets = bucket_points(&heatmap(&requests, now()));

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].request_ids, vec!["r-1", "r-3"]);
        assert_eq!(buckets[0].weight, 3.0);
        assert_eq!((buckets[0].lat, buckets[0].lng), (31.9512, 35.9101));
        assert_eq!(buckets[1].request_ids, vec!["r-2"]);
    }

    #[test]
    fn feature_collection_uses_lng_lat_order() {
        let requests = vec![request("r-1", Priority::P1, RequestStatus::New, 0, Some((31.95, 35.91)))];
        let collection = feature_collection(&heatmap(&requests, now()));

        assert_eq!(collection.features.len(), 1);
        let feature = &collection.features[0];
        assert_eq!(
            feature.geometry.as_ref().map(|g| &g.value),
            Some(&Value::Point(vec![35.91, 31.95]))
        );
        assert_eq!(
            feature.property("status").and_then(|v| v.as_str()),
            Some("new")
        );
        assert_eq!(
            feature.property("priority").and_then(|v| v.as_str()),
            Some("P1")
        );
    }
}
