// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vertical placement of features.
//!
//! Every geometry-producing style places its feature with [`resolve`]: pick a
//! reference level from the style's [`ReferenceMode`], then add the metadata
//! or raw altitude, the selection adjustment, and the style's lift.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::units::LengthUnit;

/// The vertical datum an altitude is measured against.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceLevel {
    /// Height above the rendered terrain.
    #[default]
    Terrain,
    /// Height above the ellipsoid.
    Ellipsoid,
    /// Height above the model origin.
    Origin,
    /// Pinned to the rendered surface.
    Surface,
}

/// How a style chooses the reference level of its features.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMode {
    /// Terrain for terrain-following features, else the feature's own level.
    #[default]
    Automatic,
    /// Always [`ReferenceLevel::Surface`].
    Surface,
    /// Always [`ReferenceLevel::Origin`].
    Origin,
    /// Always [`ReferenceLevel::Ellipsoid`].
    Ellipsoid,
    /// Always [`ReferenceLevel::Terrain`].
    Terrain,
}

impl ReferenceMode {
    /// Chooses the reference level for a feature.
    #[must_use]
    pub fn level(self, intrinsic: ReferenceLevel, follows_terrain: bool) -> ReferenceLevel {
        match self {
            Self::Automatic if follows_terrain => ReferenceLevel::Terrain,
            Self::Automatic => intrinsic,
            Self::Surface => ReferenceLevel::Surface,
            Self::Origin => ReferenceLevel::Origin,
            Self::Ellipsoid => ReferenceLevel::Ellipsoid,
            Self::Terrain => ReferenceLevel::Terrain,
        }
    }

    /// Returns the tag used in enum parameters.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Surface => "surface",
            Self::Origin => "origin",
            Self::Ellipsoid => "ellipsoid",
            Self::Terrain => "terrain",
        }
    }

    /// Parses a tag produced by [`tag`](Self::tag).
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        [
            Self::Automatic,
            Self::Surface,
            Self::Origin,
            Self::Ellipsoid,
            Self::Terrain,
        ]
        .into_iter()
        .find(|m| m.tag() == tag)
    }
}

/// Everything [`resolve`] needs to place one feature.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AltitudeInput {
    /// The style's reference mode.
    pub mode: ReferenceMode,
    /// The feature's own reference level.
    pub intrinsic_level: ReferenceLevel,
    /// Whether the feature is flagged as following terrain.
    pub follows_terrain: bool,
    /// The feature's own altitude in meters.
    pub raw_altitude_m: f64,
    /// Altitude read from a metadata column, already in meters.
    pub metadata_override_m: Option<f64>,
    /// Whether the style uses the metadata altitude at all.
    pub use_altitude: bool,
    /// Whether the metadata value is a depth (positive down).
    pub is_depth: bool,
    /// Extra offset applied to selected features.
    pub selection_adjust_m: f64,
    /// The style's lift.
    pub lift_m: f64,
}

impl AltitudeInput {
    /// Creates an input with only a raw altitude; everything else neutral.
    #[must_use]
    pub fn new(raw_altitude_m: f64) -> Self {
        Self {
            mode: ReferenceMode::Automatic,
            intrinsic_level: ReferenceLevel::Terrain,
            follows_terrain: false,
            raw_altitude_m,
            metadata_override_m: None,
            use_altitude: false,
            is_depth: false,
            selection_adjust_m: 0.0,
            lift_m: 0.0,
        }
    }
}

/// A resolved vertical placement.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResolvedAltitude {
    /// Effective altitude in meters.
    pub altitude_m: f64,
    /// The datum `altitude_m` is measured against.
    pub reference: ReferenceLevel,
}

/// Resolves a feature's effective altitude and reference level.
///
/// # Example
///
/// ```rust
/// use geostyle_geo::altitude::{AltitudeInput, ReferenceLevel, ReferenceMode, resolve};
///
/// let input = AltitudeInput {
///     follows_terrain: true,
///     lift_m: 5.0,
///     ..AltitudeInput::new(10.0)
/// };
/// let resolved = resolve(&input);
/// assert_eq!(resolved.altitude_m, 15.0);
/// assert_eq!(resolved.reference, ReferenceLevel::Terrain);
/// ```
#[must_use]
pub fn resolve(input: &AltitudeInput) -> ResolvedAltitude {
    let base = match input.metadata_override_m {
        Some(meters) if input.use_altitude => {
            if input.is_depth {
                -meters
            } else {
                meters
            }
        }
        _ => input.raw_altitude_m,
    };
    ResolvedAltitude {
        altitude_m: base + input.selection_adjust_m + input.lift_m,
        reference: input
            .mode
            .level(input.intrinsic_level, input.follows_terrain),
    }
}

/// Converts a metadata column altitude to meters.
#[must_use]
#[inline]
pub fn column_altitude_m(value: f64, unit: LengthUnit) -> f64 {
    unit.to_meters(value)
}

/// A placed feature location.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Position {
    /// Latitude in degrees.
    pub lat_deg: f64,
    /// Longitude in degrees.
    pub lon_deg: f64,
    /// Altitude in meters.
    pub altitude_m: f64,
    /// The datum of `altitude_m`.
    pub reference: ReferenceLevel,
}

/// Resolves a new position for a feature, reusing `existing` when nothing moved.
///
/// The horizontal location is taken from `existing`. If the resolved altitude
/// and reference level equal the existing ones, the same `Arc` is returned.
#[must_use]
pub fn resolve_position(existing: &Arc<Position>, input: &AltitudeInput) -> Arc<Position> {
    let resolved = resolve(input);
    if resolved.altitude_m == existing.altitude_m && resolved.reference == existing.reference {
        return Arc::clone(existing);
    }
    Arc::new(Position {
        altitude_m: resolved.altitude_m,
        reference: resolved.reference,
        ..**existing
    })
}
