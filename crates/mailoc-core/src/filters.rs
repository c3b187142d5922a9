//! Request-parameter resolution for the location archive.
//!
//! Recognized query-string keys are fixed per install: the static scalar keys
//! plus one underscore-prefixed list key per registered taxonomy. Anything
//! else in the request is ignored. Values never error; malformed input
//! degrades to empty/zero.

use crate::app_config::AppConfig;
use crate::geo::DistanceUnit;
use crate::taxonomies::TaxonomyConfig;

/// A default (and therefore the declared type) of one recognized filter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Terms(Vec<String>),
}

/// The full recognized key set with its per-key defaults, built once per
/// request from configuration and the taxonomy registry and passed down the
/// call chain explicitly.
#[derive(Debug, Clone)]
pub struct FilterDefaults {
    entries: Vec<(String, FilterValue)>,
    default_distance: u32,
    default_unit: DistanceUnit,
}

impl FilterDefaults {
    /// Build the default key set: scalar keys, then one list key per
    /// registered taxonomy.
    #[must_use]
    pub fn build(config: &AppConfig, taxonomies: &[TaxonomyConfig]) -> Self {
        let default_distance = config.default_distance();
        let default_unit = config.default_unit();

        let mut entries: Vec<(String, FilterValue)> = vec![
            ("address".to_string(), FilterValue::Text(String::new())),
            ("lat".to_string(), FilterValue::Text(String::new())),
            ("lng".to_string(), FilterValue::Text(String::new())),
            ("state".to_string(), FilterValue::Text(String::new())),
            ("province".to_string(), FilterValue::Text(String::new())),
            (
                "distance".to_string(),
                FilterValue::Text(default_distance.to_string()),
            ),
            (
                "unit".to_string(),
                FilterValue::Text(default_unit.as_str().to_string()),
            ),
        ];

        for taxonomy in taxonomies {
            entries.push((taxonomy.param_key(), FilterValue::Terms(Vec::new())));
        }

        Self {
            entries,
            default_distance,
            default_unit,
        }
    }

    /// Add or replace a recognized key. Extension point for deployments that
    /// filter on additional attributes.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: FilterValue) -> Self {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// The distance threshold applied when the request carries none.
    #[must_use]
    pub fn default_distance(&self) -> u32 {
        self.default_distance
    }

    /// The unit applied when the request carries none.
    #[must_use]
    pub fn default_unit(&self) -> DistanceUnit {
        self.default_unit
    }
}

/// The recognized parameters actually present on one request.
///
/// Only keys that exist in the defaults map are retained; callers merge with
/// [`FilterDefaults`] for anything absent. The filtered-state flag is fixed
/// at construction for the remainder of the request.
#[derive(Debug, Clone)]
pub struct FilterParams {
    values: Vec<(String, FilterValue)>,
    filtered: bool,
}

impl FilterParams {
    /// Resolve raw query-string pairs against the recognized key set.
    ///
    /// Keys absent from the defaults are dropped. A key whose default is
    /// list-typed is comma-split (empty segments discarded); scalar keys are
    /// kept verbatim. The last occurrence of a repeated key wins.
    #[must_use]
    pub fn from_pairs(defaults: &FilterDefaults, pairs: &[(String, String)]) -> Self {
        let mut values: Vec<(String, FilterValue)> = Vec::new();

        for (key, raw) in pairs {
            let Some(default) = defaults.get(key) else {
                continue;
            };

            let value = match default {
                FilterValue::Terms(_) => FilterValue::Terms(
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(ToOwned::to_owned)
                        .collect(),
                ),
                FilterValue::Text(_) => FilterValue::Text(raw.clone()),
            };

            if let Some(slot) = values.iter_mut().find(|(k, _)| k == key) {
                slot.1 = value;
            } else {
                values.push((key.clone(), value));
            }
        }

        let filtered = values
            .iter()
            .any(|(k, _)| k == "lat" || k == "lng" || k.starts_with('_'));

        Self { values, filtered }
    }

    /// Whether this request is a filtered view: it carried `lat`, `lng`, or
    /// any taxonomy term list.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(FilterValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// True when the request carried both coordinates with non-empty values.
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.text("lat").is_some_and(|s| !s.trim().is_empty())
            && self.text("lng").is_some_and(|s| !s.trim().is_empty())
    }

    /// Requested latitude; missing or malformed values degrade to `0.0`.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.text("lat")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    /// Requested longitude; missing or malformed values degrade to `0.0`.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.text("lng")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    /// Requested distance threshold, if the request carried one. A present
    /// but malformed value degrades to `0` (threshold disabled).
    #[must_use]
    pub fn distance(&self) -> Option<u32> {
        self.text("distance")
            .map(|s| s.trim().parse::<u32>().unwrap_or(0))
    }

    /// Requested unit, if the request carried one. Unrecognized unit strings
    /// fall back to miles.
    #[must_use]
    pub fn unit(&self) -> Option<DistanceUnit> {
        self.text("unit").map(DistanceUnit::parse_lenient)
    }

    /// Per-taxonomy term selections present on this request, keyed by the
    /// taxonomy slug (prefix stripped). Empty selections are skipped.
    #[must_use]
    pub fn term_filters(&self) -> Vec<(String, Vec<String>)> {
        self.values
            .iter()
            .filter_map(|(key, value)| match value {
                FilterValue::Terms(terms) if !terms.is_empty() => key
                    .strip_prefix('_')
                    .map(|slug| (slug.to_string(), terms.clone())),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::path::PathBuf;

    use crate::app_config::Environment;

    fn test_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://example".to_string(),
            env: Environment::Test,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
            log_level: "info".to_string(),
            taxonomies_path: PathBuf::from("./config/taxonomies.yaml"),
            db_max_connections: 10,
            db_min_connections: 1,
            db_acquire_timeout_secs: 10,
            distance_options: vec![25, 50, 100, 200],
            unit_options: vec![DistanceUnit::Miles, DistanceUnit::Kilometers],
            default_limit: 50,
        }
    }

    fn test_taxonomies() -> Vec<TaxonomyConfig> {
        vec![
            TaxonomyConfig {
                slug: "category".to_string(),
                label: "Categories".to_string(),
                terms: Vec::new(),
            },
            TaxonomyConfig {
                slug: "amenity".to_string(),
                label: "Amenities".to_string(),
                terms: Vec::new(),
            },
        ]
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn defaults_contain_static_and_taxonomy_keys() {
        let defaults = FilterDefaults::build(&test_config(), &test_taxonomies());
        let keys: Vec<&str> = defaults.keys().collect();
        assert_eq!(
            keys,
            vec![
                "address",
                "lat",
                "lng",
                "state",
                "province",
                "distance",
                "unit",
                "_category",
                "_amenity"
            ]
        );
    }

    #[test]
    fn defaults_use_first_configured_options() {
        let defaults = FilterDefaults::build(&test_config(), &test_taxonomies());
        assert_eq!(
            defaults.get("distance"),
            Some(&FilterValue::Text("25".to_string()))
        );
        assert_eq!(
            defaults.get("unit"),
            Some(&FilterValue::Text("mi".to_string()))
        );
        assert_eq!(defaults.default_distance(), 25);
        assert_eq!(defaults.default_unit(), DistanceUnit::Miles);
    }

    #[test]
    fn with_entry_extends_the_recognized_set() {
        let defaults = FilterDefaults::build(&test_config(), &test_taxonomies())
            .with_entry("open_now", FilterValue::Text(String::new()));
        assert!(defaults.get("open_now").is_some());

        let params =
            FilterParams::from_pairs(&defaults, &pairs(&[("open_now", "1"), ("bogus", "x")]));
        assert!(params.get("open_now").is_some());
        assert!(params.get("bogus").is_none());
    }

    #[test]
    fn unknown_request_keys_are_dropped() {
        let defaults = FilterDefaults::build(&test_config(), &test_taxonomies());
        let params = FilterParams::from_pairs(&defaults, &pairs(&[("foo", "bar")]));
        assert!(params.get("foo").is_none());
        assert!(!params.is_filtered());
    }

    #[test]
    fn absent_keys_are_omitted_not_defaulted() {
        let defaults = FilterDefaults::build(&test_config(), &test_taxonomies());
        let params = FilterParams::from_pairs(&defaults, &pairs(&[("lat", "38.5")]));
        assert!(params.get("lat").is_some());
        assert!(params.get("lng").is_none());
        assert!(params.get("distance").is_none());
    }

    #[test]
    fn taxonomy_values_are_comma_split() {
        let defaults = FilterDefaults::build(&test_config(), &test_taxonomies());
        let params =
            FilterParams::from_pairs(&defaults, &pairs(&[("_category", "cafes, bakeries,,")]));
        assert_eq!(
            params.get("_category"),
            Some(&FilterValue::Terms(vec![
                "cafes".to_string(),
                "bakeries".to_string()
            ]))
        );
    }

    #[test]
    fn is_filtered_truth_table() {
        let defaults = FilterDefaults::build(&test_config(), &test_taxonomies());

        let empty = FilterParams::from_pairs(&defaults, &[]);
        assert!(!empty.is_filtered());

        let unrelated = FilterParams::from_pairs(&defaults, &pairs(&[("utm_source", "mail")]));
        assert!(!unrelated.is_filtered());

        let address_only = FilterParams::from_pairs(&defaults, &pairs(&[("address", "Wichita")]));
        assert!(!address_only.is_filtered());

        let lat_only = FilterParams::from_pairs(&defaults, &pairs(&[("lat", "38.5")]));
        assert!(lat_only.is_filtered());

        let lng_only = FilterParams::from_pairs(&defaults, &pairs(&[("lng", "-98.0")]));
        assert!(lng_only.is_filtered());

        let tax_only = FilterParams::from_pairs(&defaults, &pairs(&[("_category", "cafes")]));
        assert!(tax_only.is_filtered());
    }

    #[test]
    fn has_coordinates_requires_both_non_empty() {
        let defaults = FilterDefaults::build(&test_config(), &test_taxonomies());

        let both = FilterParams::from_pairs(&defaults, &pairs(&[("lat", "38.5"), ("lng", "-98")]));
        assert!(both.has_coordinates());

        let one = FilterParams::from_pairs(&defaults, &pairs(&[("lat", "38.5")]));
        assert!(!one.has_coordinates());

        let empty_lng =
            FilterParams::from_pairs(&defaults, &pairs(&[("lat", "38.5"), ("lng", "")]));
        assert!(!empty_lng.has_coordinates());
        // Present-but-empty coordinates still mark the view as filtered.
        assert!(empty_lng.is_filtered());
    }

    #[test]
    fn malformed_numbers_degrade_to_zero() {
        let defaults = FilterDefaults::build(&test_config(), &test_taxonomies());
        let params = FilterParams::from_pairs(
            &defaults,
            &pairs(&[("lat", "north"), ("lng", "-98.0"), ("distance", "far")]),
        );
        assert!((params.latitude() - 0.0).abs() < f64::EPSILON);
        assert!((params.longitude() + 98.0).abs() < f64::EPSILON);
        assert_eq!(params.distance(), Some(0));
    }

    #[test]
    fn unit_falls_back_to_miles() {
        let defaults = FilterDefaults::build(&test_config(), &test_taxonomies());
        let params = FilterParams::from_pairs(&defaults, &pairs(&[("unit", "leagues")]));
        assert_eq!(params.unit(), Some(DistanceUnit::Miles));

        let none = FilterParams::from_pairs(&defaults, &[]);
        assert_eq!(none.unit(), None);
    }

    #[test]
    fn term_filters_strip_prefix_and_skip_empty() {
        let defaults = FilterDefaults::build(&test_config(), &test_taxonomies());
        let params = FilterParams::from_pairs(
            &defaults,
            &pairs(&[("_category", "cafes,bakeries"), ("_amenity", "")]),
        );
        assert_eq!(
            params.term_filters(),
            vec![(
                "category".to_string(),
                vec!["cafes".to_string(), "bakeries".to_string()]
            )]
        );
    }

    #[test]
    fn repeated_keys_last_occurrence_wins() {
        let defaults = FilterDefaults::build(&test_config(), &test_taxonomies());
        let params =
            FilterParams::from_pairs(&defaults, &pairs(&[("lat", "1.0"), ("lat", "38.5")]));
        assert!((params.latitude() - 38.5).abs() < f64::EPSILON);
    }
}
