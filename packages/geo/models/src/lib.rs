#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Coordinate, location and zone rule types.
//!
//! These are plain data types shared by the zone resolver, the request
//! model and the analytics feeds. Zone rules are configuration: they are
//! deserialized from TOML and never constructed from hardcoded logic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A WGS84 coordinate in decimal degrees.
///
/// No range validation is performed. Out-of-range or NaN values are valid
/// inputs; they simply never match a zone rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

impl Coordinate {
    /// Creates a coordinate from a latitude/longitude pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Creates a coordinate from `GeoJSON` position order (`[lng, lat]`).
    #[must_use]
    pub const fn from_lng_lat([lng, lat]: [f64; 2]) -> Self {
        Self { lat, lng }
    }

    /// Returns the coordinate in `GeoJSON` position order (`[lng, lat]`).
    #[must_use]
    pub const fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// A single rectangular zone rule.
///
/// Bounds are inclusive. A missing bound leaves that side of the box open,
/// so `lat_min = 31.96` with no `lat_max` covers every latitude at or above
/// 31.96.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRule {
    /// Zone identifier emitted when this rule matches (e.g. `"ZONE-DT-01"`).
    pub zone_id: String,
    /// Inclusive southern bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat_min: Option<f64>,
    /// Inclusive northern bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat_max: Option<f64>,
    /// Inclusive western bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng_min: Option<f64>,
    /// Inclusive eastern bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng_max: Option<f64>,
}

impl ZoneRule {
    /// Creates a fully bounded rule.
    #[must_use]
    pub fn bounded(
        zone_id: impl Into<String>,
        (lat_min, lat_max): (f64, f64),
        (lng_min, lng_max): (f64, f64),
    ) -> Self {
        Self {
            zone_id: zone_id.into(),
            lat_min: Some(lat_min),
            lat_max: Some(lat_max),
            lng_min: Some(lng_min),
            lng_max: Some(lng_max),
        }
    }
}

/// An ordered zone rule set with its fallback zone.
///
/// Rule order is significant: when boxes overlap, the earliest rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Zone id returned when no rule matches.
    pub default_zone: String,
    /// Rules in declaration order.
    #[serde(default, rename = "rule")]
    pub rules: Vec<ZoneRule>,
}

/// Errors raised while reading a location document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The geometry was not a `Point`.
    #[error("expected a Point location, got '{0}'")]
    NotAPoint(String),
}

/// Where a service request (or an agent's base) is located.
///
/// Serialized as the backend stores it: a `GeoJSON` `Point` with
/// `coordinates: [lng, lat]` plus the optional address hint and zone id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "PointDocument", try_from = "PointDocument")]
pub struct Location {
    /// The picked point.
    pub coordinate: Coordinate,
    /// Free-text address hint captured alongside the point.
    pub address_hint: Option<String>,
    /// Zone the point resolved to, once resolved.
    pub zone_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct PointDocument {
    #[serde(rename = "type", default = "point_type")]
    kind: String,
    coordinates: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    zone_id: Option<String>,
}

fn point_type() -> String {
    "Point".to_string()
}

impl From<Location> for PointDocument {
    fn from(location: Location) -> Self {
        Self {
            kind: point_type(),
            coordinates: location.coordinate.to_lng_lat(),
            address_hint: location.address_hint,
            zone_id: location.zone_id,
        }
    }
}

impl TryFrom<PointDocument> for Location {
    type Error = LocationError;

    fn try_from(document: PointDocument) -> Result<Self, Self::Error> {
        if document.kind != "Point" {
            return Err(LocationError::NotAPoint(document.kind));
        }
        Ok(Self {
            coordinate: Coordinate::from_lng_lat(document.coordinates),
            address_hint: document.address_hint,
            zone_id: document.zone_id,
        })
    }
}

impl Location {
    /// Creates an unresolved location for a coordinate.
    #[must_use]
    pub const fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            address_hint: None,
            zone_id: None,
        }
    }

    /// Returns this location with its zone id set.
    #[must_use]
    pub fn with_zone(mut self, zone_id: impl Into<String>) -> Self {
        self.zone_id = Some(zone_id.into());
        self
    }
}
