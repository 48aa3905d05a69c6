// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geostyle Geo: placement math shared by every geometry-producing style.
//!
//! - [`altitude`]: reference level selection and effective altitude.
//! - [`axis`]: great-circle axis lengths and ellipse / ellipsoid / frustum shapes.
//! - [`fill`]: base color precedence and rim-fade fill colors.
//! - [`units`]: length units for metadata columns.
//!
//! Everything here is pure and allocation-free apart from
//! [`resolve_position`](altitude::resolve_position).
//!
//! ```rust
//! use geostyle_geo::{AltitudeInput, ReferenceLevel, resolve};
//!
//! let placed = resolve(&AltitudeInput { follows_terrain: true, lift_m: 5.0, ..AltitudeInput::new(10.0) });
//! assert_eq!((placed.altitude_m, placed.reference), (15.0, ReferenceLevel::Terrain));
//! ```

pub mod altitude;
pub mod axis;
pub mod fill;
pub mod units;

pub use altitude::{
    AltitudeInput, Position, ReferenceLevel, ReferenceMode, ResolvedAltitude, column_altitude_m,
    resolve, resolve_position,
};
pub use axis::{
    EARTH_MEAN_RADIUS_M, Ellipsoid, EllipseAxes, Frustum, LatLon, axis_length_to_angular_distance,
};
pub use fill::{FillStyle, UnknownFillStyle, VisualState, clamp_rim_fade, fill_colors};
pub use units::{LengthUnit, UnknownUnit};
