// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Length units for metadata columns and axis parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A linear length unit.
///
/// Conversions are a single multiplication by an exact factor.
///
/// # Example
///
/// ```rust
/// use geostyle_geo::LengthUnit;
///
/// assert_eq!(LengthUnit::Kilometers.to_meters(1.5), 1500.0);
/// assert_eq!("nmi".parse::<LengthUnit>().unwrap(), LengthUnit::NauticalMiles);
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    /// Meters.
    #[default]
    Meters,
    /// Kilometers.
    Kilometers,
    /// International feet.
    Feet,
    /// International yards.
    Yards,
    /// Statute miles.
    Miles,
    /// International nautical miles.
    NauticalMiles,
}

impl LengthUnit {
    /// Every unit, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Meters,
        Self::Kilometers,
        Self::Feet,
        Self::Yards,
        Self::Miles,
        Self::NauticalMiles,
    ];

    /// Returns the number of meters in one of this unit.
    #[must_use]
    pub const fn meters_per_unit(self) -> f64 {
        match self {
            Self::Meters => 1.0,
            Self::Kilometers => 1000.0,
            Self::Feet => 0.3048,
            Self::Yards => 0.9144,
            Self::Miles => 1609.344,
            Self::NauticalMiles => 1852.0,
        }
    }

    /// Converts `value` in this unit to meters.
    #[must_use]
    #[inline]
    pub fn to_meters(self, value: f64) -> f64 {
        value * self.meters_per_unit()
    }

    /// Converts `meters` to this unit.
    #[must_use]
    #[inline]
    pub fn from_meters(self, meters: f64) -> f64 {
        meters / self.meters_per_unit()
    }

    /// Returns the canonical tag used in enum parameters.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Meters => "m",
            Self::Kilometers => "km",
            Self::Feet => "ft",
            Self::Yards => "yd",
            Self::Miles => "mi",
            Self::NauticalMiles => "nmi",
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when a unit tag is not recognized.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown length unit: {0}")]
pub struct UnknownUnit(pub String);

impl FromStr for LengthUnit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.trim().to_ascii_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => Self::Meters,
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => Self::Kilometers,
            "ft" | "foot" | "feet" => Self::Feet,
            "yd" | "yard" | "yards" => Self::Yards,
            "mi" | "mile" | "miles" => Self::Miles,
            "nmi" | "nm" | "nautical_miles" | "nautical miles" => Self::NauticalMiles,
            _ => return Err(UnknownUnit(s.to_owned())),
        };
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_meters() {
        for unit in LengthUnit::ALL {
            let meters = unit.to_meters(12.5);
            assert!((unit.from_meters(meters) - 12.5).abs() < 1e-12, "{unit}");
        }
    }

    #[test]
    fn tags_parse_back() {
        for unit in LengthUnit::ALL {
            assert_eq!(unit.tag().parse::<LengthUnit>(), Ok(unit));
        }
        assert_eq!(" Kilometres ".parse::<LengthUnit>(), Ok(LengthUnit::Kilometers));
        assert!("furlong".parse::<LengthUnit>().is_err());
    }

    #[test]
    fn deserializes_snake_case() {
        let unit: LengthUnit = serde_json::from_str("\"nautical_miles\"").unwrap();
        assert_eq!(unit, LengthUnit::NauticalMiles);
    }
}
