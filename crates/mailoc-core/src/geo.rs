//! Distance units and great-circle math shared by the SQL builder, the CLI,
//! and tests.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in miles, as used by the distance computation.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Miles,
    Kilometers,
}

impl DistanceUnit {
    /// Parse a request-supplied unit string.
    ///
    /// `km` and `kilometers` select kilometers; every other value, including
    /// the empty string, falls back to miles. Request input never errors.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "km" | "kilometers" => DistanceUnit::Kilometers,
            _ => DistanceUnit::Miles,
        }
    }

    /// Earth radius in this unit; the multiplier of the great-circle formula.
    #[must_use]
    pub fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Miles => EARTH_RADIUS_MILES,
            DistanceUnit::Kilometers => EARTH_RADIUS_KM,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DistanceUnit::Miles => "mi",
            DistanceUnit::Kilometers => "km",
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = ();

    /// Strict parsing for configuration values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mi" | "miles" => Ok(DistanceUnit::Miles),
            "km" | "kilometers" => Ok(DistanceUnit::Kilometers),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Great-circle distance between two points, in the given unit.
///
/// Mirrors the spherical-law-of-cosines expression the SQL builder emits, so
/// in-process results agree with database-computed ones.
#[must_use]
pub fn haversine_distance(
    lat1: f64,
    lng1: f64,
    lat2: f64,
    lng2: f64,
    unit: DistanceUnit,
) -> f64 {
    let operand = lat1.to_radians().cos()
        * lat2.to_radians().cos()
        * (lng2 - lng1).to_radians().cos()
        + lat1.to_radians().sin() * lat2.to_radians().sin();
    // Float rounding can push identical points fractionally past 1.0, where
    // acos is undefined.
    unit.earth_radius() * operand.clamp(-1.0, 1.0).acos()
}
