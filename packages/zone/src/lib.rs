#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Coordinate to service zone resolution.
//!
//! A [`ZoneResolver`] holds an ordered list of rectangular zone rules and a
//! default zone. Resolution walks the rules in declaration order and returns
//! the first box containing the point, so overlapping boxes resolve by
//! order rather than by area or specificity. Points matching nothing
//! (including NaN and out-of-range input) resolve to the default zone.
//!
//! Rule sets are data. The built-in sets live in `zones/*.toml` and are
//! embedded by [`registry`]; callers may also load their own at runtime.

pub mod registry;

use std::path::Path;

use citizen_services_geo_models::{Coordinate, ZoneConfig, ZoneRule};
use geo::{Coord, Intersects, Rect};
use thiserror::Error;

/// Errors raised while loading or validating a zone configuration.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration was not valid TOML for a [`ZoneConfig`].
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The default zone id was empty.
    #[error("default zone id must not be empty")]
    EmptyDefaultZone,

    /// A rule had an empty zone id.
    #[error("rule #{index} has an empty zone id")]
    EmptyZoneId {
        /// Position of the offending rule.
        index: usize,
    },

    /// A rule had a NaN bound or a minimum above its maximum.
    #[error("rule {zone_id} has invalid {axis} bounds: min={min:?} max={max:?}")]
    InvalidBounds {
        /// Zone id of the offending rule.
        zone_id: String,
        /// `"lat"` or `"lng"`.
        axis: &'static str,
        /// Configured minimum, if any.
        min: Option<f64>,
        /// Configured maximum, if any.
        max: Option<f64>,
    },
}

/// A validated rule with its bounding box precomputed.
#[derive(Debug, Clone)]
struct CompiledRule {
    rule: ZoneRule,
    bounds: Rect<f64>,
}

/// Resolves coordinates to zone ids using ordered first-match-wins rules.
///
/// Immutable once built. Share one instance across every caller.
#[derive(Debug, Clone)]
pub struct ZoneResolver {
    default_zone: String,
    rules: Vec<CompiledRule>,
}

impl ZoneResolver {
    /// Builds a resolver from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the default zone or any rule's zone id is empty,
    /// or if any rule has a NaN bound or a minimum greater than its maximum.
    pub fn new(config: ZoneConfig) -> Result<Self, ZoneError> {
        if config.default_zone.is_empty() {
            return Err(ZoneError::EmptyDefaultZone);
        }

        let rules = config
            .rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| compile_rule(index, rule))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "Built zone resolver with {} rules (default {})",
            rules.len(),
            config.default_zone
        );

        Ok(Self {
            default_zone: config.default_zone,
            rules,
        })
    }

    /// Parses and validates a TOML zone configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self, ZoneError> {
        let config: ZoneConfig = toml::de::from_str(toml_str)?;
        Self::new(config)
    }

    /// Reads, parses and validates a TOML zone configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or fails
    /// validation.
    pub fn from_file(path: &Path) -> Result<Self, ZoneError> {
        let contents = std::fs::read_to_string(path)?;
        let resolver = Self::from_toml(&contents)?;
        log::info!(
            "Loaded {} zone rules from {}",
            resolver.rules.len(),
            path.display()
        );
        Ok(resolver)
    }

    /// Returns a resolver for the built-in Amman zone set.
    ///
    /// # Panics
    ///
    /// Panics if the embedded configuration is invalid, which the registry
    /// tests rule out.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(registry::config(registry::DEFAULT_CONFIG).unwrap_or_else(|| {
            panic!("Missing built-in zone config '{}'", registry::DEFAULT_CONFIG)
        }))
        .unwrap_or_else(|e| panic!("Invalid built-in zone config: {e}"))
    }

    /// Resolves a coordinate to a zone id.
    ///
    /// Returns the zone of the first rule (in declaration order) whose box
    /// contains the point, bounds inclusive. Returns the default zone when
    /// nothing matches. Never fails.
    #[must_use]
    pub fn resolve_zone(&self, coordinate: Coordinate) -> &str {
        let point = Coord {
            x: coordinate.lng,
            y: coordinate.lat,
        };

        let zone = self
            .rules
            .iter()
            .find(|compiled| compiled.bounds.intersects(&point))
            .map_or(self.default_zone.as_str(), |compiled| {
                compiled.rule.zone_id.as_str()
            });

        log::trace!(
            "Resolved ({}, {}) to {zone}",
            coordinate.lat,
            coordinate.lng
        );

        zone
    }

    /// Returns the fallback zone id.
    #[must_use]
    pub fn default_zone(&self) -> &str {
        &self.default_zone
    }

    /// Returns the rules in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = &ZoneRule> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }

    /// Returns every zone id this resolver can produce, rules first and the
    /// default last, without duplicates.
    #[must_use]
    pub fn zone_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::with_capacity(self.rules.len() + 1);
        for id in self
            .rules()
            .map(|rule| rule.zone_id.as_str())
            .chain(std::iter::once(self.default_zone.as_str()))
        {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

fn compile_rule(index: usize, rule: ZoneRule) -> Result<CompiledRule, ZoneError> {
    if rule.zone_id.is_empty() {
        return Err(ZoneError::EmptyZoneId { index });
    }

    let (lat_min, lat_max) = axis_bounds(&rule.zone_id, "lat", rule.lat_min, rule.lat_max)?;
    let (lng_min, lng_max) = axis_bounds(&rule.zone_id, "lng", rule.lng_min, rule.lng_max)?;

    let bounds = Rect::new(
        Coord {
            x: lng_min,
            y: lat_min,
        },
        Coord {
            x: lng_max,
            y: lat_max,
        },
    );

    Ok(CompiledRule { rule, bounds })
}

/// Validates one axis and fills open sides with infinities.
fn axis_bounds(
    zone_id: &str,
    axis: &'static str,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(f64, f64), ZoneError> {
    let lo = min.unwrap_or(f64::NEG_INFINITY);
    let hi = max.unwrap_or(f64::INFINITY);

    if lo.is_nan() || hi.is_nan() || lo > hi {
        return Err(ZoneError::InvalidBounds {
            zone_id: zone_id.to_string(),
            axis,
            min,
            max,
        });
    }

    Ok((lo, hi))
}
