//! Compile-time registry of zone rule sets.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Adding a city means adding a TOML file under `zones/` and an entry here.

use citizen_services_geo_models::ZoneConfig;

/// Name of the rule set used by [`crate::ZoneResolver::builtin`].
pub const DEFAULT_CONFIG: &str = "amman";

/// Number of registered rule sets. Enforced by a test.
#[cfg(test)]
const EXPECTED_CONFIG_COUNT: usize = 1;

/// Embedded TOML zone configurations.
const ZONE_TOMLS: &[(&str, &str)] = &[("amman", include_str!("../zones/amman.toml"))];

/// Returns every registered zone configuration with its name.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. These are compile-time
/// constants, so a failure is a development error caught by the tests.
#[must_use]
pub fn all_configs() -> Vec<(&'static str, ZoneConfig)> {
    ZONE_TOMLS
        .iter()
        .map(|(name, toml_str)| (*name, parse(name, toml_str)))
        .collect()
}

/// Returns the registered configuration with the given name.
///
/// # Panics
///
/// Panics if the matching embedded TOML file fails to parse.
#[must_use]
pub fn config(name: &str) -> Option<ZoneConfig> {
    ZONE_TOMLS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(name, toml_str)| parse(name, toml_str))
}

/// Returns the names of every registered configuration.
#[must_use]
pub fn config_names() -> Vec<&'static str> {
    ZONE_TOMLS.iter().map(|(name, _)| *name).collect()
}

fn parse(name: &str, toml_str: &str) -> ZoneConfig {
    toml::de::from_str(toml_str)
        .unwrap_or_else(|e| panic!("Failed to parse zone config '{name}': {e}"))
}
