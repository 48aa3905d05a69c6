// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis geometry: metric axis lengths to angular extents, and the ellipse,
//! ellipsoid and frustum shapes built from them.
//!
//! Distances are measured on a sphere of [`EARTH_MEAN_RADIUS_M`]. Bearings are
//! degrees clockwise from north.

use kurbo::{Ellipse, Vec2};

/// Mean Earth radius (IUGG), in meters.
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_008.8;

/// A geographic location in degrees.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LatLon {
    /// Latitude in degrees, positive north.
    pub lat_deg: f64,
    /// Longitude in degrees, positive east.
    pub lon_deg: f64,
}

impl LatLon {
    /// Creates a location.
    #[must_use]
    pub const fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }

    /// Returns the point reached by travelling `distance_m` along the great
    /// circle starting at `bearing_deg`.
    #[must_use]
    pub fn destination(self, bearing_deg: f64, distance_m: f64) -> Self {
        let delta = distance_m / EARTH_MEAN_RADIUS_M;
        let theta = bearing_deg.to_radians();
        let phi1 = self.lat_deg.to_radians();
        let lambda1 = self.lon_deg.to_radians();

        let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos();
        let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();
        let lambda2 = lambda1
            + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);

        Self {
            lat_deg: phi2.to_degrees(),
            lon_deg: wrap_longitude(lambda2.to_degrees()),
        }
    }
}

/// Wraps a longitude (or longitude delta) into `[-180, 180]`.
#[must_use]
pub fn wrap_longitude(deg: f64) -> f64 {
    if (-180.0..=180.0).contains(&deg) {
        return deg;
    }
    let wrapped = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && deg > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Converts a metric axis length into an angular distance in degrees.
///
/// The far end of the axis is found by great-circle destination from `center`
/// along `orientation_deg`; the result is the length of the (lat, lon) offset
/// between the two, with the longitude delta wrapped.
///
/// # Example
///
/// ```rust
/// use geostyle_geo::axis::{LatLon, axis_length_to_angular_distance};
///
/// let deg = axis_length_to_angular_distance(LatLon::new(0.0, 0.0), 90.0, 111_190.0);
/// assert!((deg - 1.0).abs() < 1e-3);
/// ```
#[must_use]
pub fn axis_length_to_angular_distance(center: LatLon, orientation_deg: f64, length_m: f64) -> f64 {
    let end = center.destination(orientation_deg, length_m);
    let dlat = end.lat_deg - center.lat_deg;
    let dlon = wrap_longitude(end.lon_deg - center.lon_deg);
    dlat.hypot(dlon)
}

/// The two horizontal semi-axes and vertical extent of an ellipse-like feature.
///
/// Constructed values are normalized: lengths are non-negative, the major axis
/// is never shorter than the minor one, and the orientation is in `[0, 360)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EllipseAxes {
    semi_major_m: f64,
    semi_minor_m: f64,
    vertical_m: f64,
    orientation_deg: f64,
}

impl EllipseAxes {
    /// Creates axes from semi-axis lengths and the bearing of the major axis.
    ///
    /// The vertical semi-axis defaults to the minor one.
    #[must_use]
    pub fn new(semi_major_m: f64, semi_minor_m: f64, orientation_deg: f64) -> Self {
        let (mut major, mut minor) = (semi_major_m.abs(), semi_minor_m.abs());
        let mut orientation = orientation_deg;
        if minor > major {
            core::mem::swap(&mut major, &mut minor);
            orientation += 90.0;
        }
        Self {
            semi_major_m: major,
            semi_minor_m: minor,
            vertical_m: minor,
            orientation_deg: orientation.rem_euclid(360.0),
        }
    }

    /// Creates circular axes.
    #[must_use]
    pub fn circle(radius_m: f64) -> Self {
        Self::new(radius_m, radius_m, 0.0)
    }

    /// Sets the vertical semi-axis.
    #[must_use]
    pub fn with_vertical(mut self, vertical_m: f64) -> Self {
        self.vertical_m = vertical_m.abs();
        self
    }

    /// Semi-major axis in meters.
    #[must_use]
    pub fn semi_major_m(&self) -> f64 {
        self.semi_major_m
    }

    /// Semi-minor axis in meters.
    #[must_use]
    pub fn semi_minor_m(&self) -> f64 {
        self.semi_minor_m
    }

    /// Vertical semi-axis in meters.
    #[must_use]
    pub fn vertical_m(&self) -> f64 {
        self.vertical_m
    }

    /// Bearing of the major axis in degrees.
    #[must_use]
    pub fn orientation_deg(&self) -> f64 {
        self.orientation_deg
    }

    /// Projects the axes into a flat ellipse in (lon, lat) degree space.
    ///
    /// `x` is longitude and `y` latitude, so a bearing of 90 degrees (east)
    /// is a rotation of zero.
    #[must_use]
    pub fn to_ellipse(&self, center: LatLon) -> Ellipse {
        let major = axis_length_to_angular_distance(center, self.orientation_deg, self.semi_major_m);
        let minor = axis_length_to_angular_distance(
            center,
            self.orientation_deg + 90.0,
            self.semi_minor_m,
        );
        Ellipse::new(
            (center.lon_deg, center.lat_deg),
            (major, minor),
            (90.0 - self.orientation_deg).to_radians(),
        )
    }

    /// Returns the metric ellipsoid described by these axes.
    #[must_use]
    pub fn to_ellipsoid(&self) -> Ellipsoid {
        Ellipsoid {
            horizontal_radii: Vec2::new(self.semi_major_m, self.semi_minor_m),
            vertical_radius_m: self.vertical_m,
            heading_deg: self.orientation_deg,
        }
    }

    /// Returns a frustum whose base is the horizontal ellipse and whose height
    /// is twice the vertical semi-axis.
    ///
    /// `top_scale` scales the top face relative to the base; it is clamped to
    /// be non-negative, and zero gives a cone.
    #[must_use]
    pub fn to_frustum(&self, top_scale: f64) -> Frustum {
        let base = Vec2::new(self.semi_major_m, self.semi_minor_m);
        Frustum {
            base_radii: base,
            top_radii: base * top_scale.max(0.0),
            height_m: self.vertical_m * 2.0,
            heading_deg: self.orientation_deg,
        }
    }
}

/// A metric ellipsoid centered on its feature.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major (`x`) and semi-minor (`y`) radii in meters.
    pub horizontal_radii: Vec2,
    /// Vertical radius in meters.
    pub vertical_radius_m: f64,
    /// Bearing of the major axis in degrees.
    pub heading_deg: f64,
}

/// An elliptical frustum standing on its feature's location.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frustum {
    /// Base radii in meters.
    pub base_radii: Vec2,
    /// Top radii in meters.
    pub top_radii: Vec2,
    /// Height in meters.
    pub height_m: f64,
    /// Bearing of the major axis in degrees.
    pub heading_deg: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_east_at_the_equator() {
        let deg = axis_length_to_angular_distance(LatLon::new(0.0, 0.0), 90.0, 111_190.0);
        assert!((deg - 1.0).abs() < 1e-3, "{deg}");
    }

    #[test]
    fn due_north_changes_latitude_only() {
        let end = LatLon::new(10.0, 20.0).destination(0.0, 111_195.0);
        assert!((end.lat_deg - 11.0).abs() < 1e-3);
        assert!((end.lon_deg - 20.0).abs() < 1e-9);
    }

    #[test]
    fn antimeridian_crossing_stays_small() {
        let deg = axis_length_to_angular_distance(LatLon::new(0.0, 179.9), 90.0, 22_239.0);
        assert!((deg - 0.2).abs() < 1e-3, "{deg}");
    }

    #[test]
    fn longitude_wrapping() {
        assert_eq!(wrap_longitude(190.0), -170.0);
        assert_eq!(wrap_longitude(-190.0), 170.0);
        assert_eq!(wrap_longitude(180.0), 180.0);
        assert_eq!(wrap_longitude(540.0), 180.0);
        assert_eq!(wrap_longitude(45.0), 45.0);
    }

    #[test]
    fn axes_normalize_order_and_sign() {
        let axes = EllipseAxes::new(-100.0, 300.0, 350.0);
        assert_eq!(axes.semi_major_m(), 300.0);
        assert_eq!(axes.semi_minor_m(), 100.0);
        assert_eq!(axes.orientation_deg(), 80.0);
    }

    #[test]
    fn east_facing_ellipse_is_unrotated() {
        let ellipse = EllipseAxes::new(111_190.0, 55_595.0, 90.0).to_ellipse(LatLon::new(0.0, 0.0));
        assert!(ellipse.rotation().abs() < 1e-12);
        let radii = ellipse.radii();
        assert!((radii.x - 1.0).abs() < 1e-3);
        assert!((radii.y - 0.5).abs() < 1e-3);
        assert_eq!(ellipse.center(), kurbo::Point::new(0.0, 0.0));
    }

    #[test]
    fn ellipsoid_and_frustum_keep_metric_radii() {
        let axes = EllipseAxes::new(500.0, 200.0, 45.0).with_vertical(50.0);
        let ellipsoid = axes.to_ellipsoid();
        assert_eq!(ellipsoid.horizontal_radii, Vec2::new(500.0, 200.0));
        assert_eq!(ellipsoid.vertical_radius_m, 50.0);
        assert_eq!(ellipsoid.heading_deg, 45.0);

        let frustum = axes.to_frustum(0.5);
        assert_eq!(frustum.top_radii, Vec2::new(250.0, 100.0));
        assert_eq!(frustum.height_m, 100.0);
        assert_eq!(axes.to_frustum(-1.0).top_radii, Vec2::ZERO);
    }
}
