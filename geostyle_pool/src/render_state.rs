// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-state shapes handed to the rendering host.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use peniko::color::Rgba8;

/// A pixel measure (point size, line width, icon scale) with total equality.
///
/// `-0.0` is folded into `0.0` and NaN into `0.0` so that equal-looking
/// values always intern to the same instance.
#[derive(Copy, Clone, Debug, Default)]
pub struct Px(f32);

impl Px {
    /// Creates a measure from a float.
    #[must_use]
    pub fn new(value: f32) -> Self {
        if value.is_nan() || value == 0.0 {
            Self(0.0)
        } else {
            Self(value)
        }
    }

    /// Creates a measure from an `f64`, narrowing to `f32`.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "pixel measures fit in f32")]
    pub fn from_f64(value: f64) -> Self {
        Self::new(value as f32)
    }

    /// Returns the raw value.
    #[must_use]
    #[inline]
    pub fn get(self) -> f32 {
        self.0
    }
}

impl PartialEq for Px {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Px {}

impl Hash for Px {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Drawing order; higher draws on top.
pub type ZOrder = i32;

/// The rendering-relevant content of a render state, one variant per shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RenderShape {
    /// A screen-space point.
    Point {
        /// Point color.
        color: Rgba8,
        /// Point diameter.
        size: Px,
        /// Drawing order.
        z_order: ZOrder,
    },
    /// A polyline (tracks, lines of bearing, outlines).
    Line {
        /// Line color.
        color: Rgba8,
        /// Line width.
        width: Px,
        /// Drawing order.
        z_order: ZOrder,
        /// Optional 16-bit stipple pattern.
        stipple: Option<u16>,
    },
    /// A filled area (polygons, ellipses) with a rim-fade gradient.
    Fill {
        /// Color at the center.
        center_color: Rgba8,
        /// Color at the edge.
        edge_color: Rgba8,
        /// Drawing order.
        z_order: ZOrder,
    },
    /// A textured icon; tinting is baked into the texture.
    Icon {
        /// Icon resource key.
        icon: Arc<str>,
        /// Scale factor.
        scale: Px,
        /// Drawing order.
        z_order: ZOrder,
    },
    /// A raster tile.
    Tile {
        /// Tile opacity.
        opacity: u8,
        /// Drawing order.
        z_order: ZOrder,
    },
}

impl RenderShape {
    /// Returns the shape's drawing order.
    #[must_use]
    pub fn z_order(&self) -> ZOrder {
        match self {
            Self::Point { z_order, .. }
            | Self::Line { z_order, .. }
            | Self::Fill { z_order, .. }
            | Self::Icon { z_order, .. }
            | Self::Tile { z_order, .. } => *z_order,
        }
    }

    /// Returns a short name for logging.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Point { .. } => "point",
            Self::Line { .. } => "line",
            Self::Fill { .. } => "fill",
            Self::Icon { .. } => "icon",
            Self::Tile { .. } => "tile",
        }
    }

    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// An immutable render state.
///
/// Wraps a [`RenderShape`] together with a cached fingerprint of it. The
/// fingerprint is derived data: it is excluded from equality and only feeds
/// hashing, so two states with equal shapes always intern together.
///
/// There is no way to mutate a `RenderState`; to change one, take its shape,
/// edit the copy, and build (and intern) a new state.
///
/// # Example
///
/// ```rust
/// use geostyle_pool::{Px, RenderPropertyPool, RenderShape, RenderState, Rgba8};
/// use std::sync::Arc;
///
/// let pool = RenderPropertyPool::new();
/// let red = Rgba8 { r: 255, g: 0, b: 0, a: 255 };
/// let point = |size| RenderState::new(RenderShape::Point { color: red, size: Px::new(size), z_order: 0 });
///
/// let a = pool.intern(point(4.0));
/// let b = pool.intern(point(4.0));
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Clone, Debug)]
pub struct RenderState {
    shape: RenderShape,
    fingerprint: u64,
}

impl RenderState {
    /// Creates a render state from its shape.
    #[must_use]
    pub fn new(shape: RenderShape) -> Self {
        let fingerprint = shape.fingerprint();
        Self { shape, fingerprint }
    }

    /// Returns the shape.
    #[must_use]
    #[inline]
    pub fn shape(&self) -> &RenderShape {
        &self.shape
    }

    /// Returns an owned copy of the shape, for building a patched state.
    #[must_use]
    pub fn to_shape(&self) -> RenderShape {
        self.shape.clone()
    }

    /// Returns the cached fingerprint.
    #[must_use]
    #[inline]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Returns `true` if the cached fingerprint still matches the shape.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.shape.fingerprint() == self.fingerprint
    }
}

impl PartialEq for RenderState {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape
    }
}

impl Eq for RenderState {}

impl Hash for RenderState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Equal shapes have equal fingerprints, so this agrees with `Eq`.
        state.write_u64(self.fingerprint);
    }
}

impl From<RenderShape> for RenderState {
    fn from(shape: RenderShape) -> Self {
        Self::new(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::RenderPropertyPool;

    const RED: Rgba8 = Rgba8 { r: 255, g: 0, b: 0, a: 255 };
    const BLUE: Rgba8 = Rgba8 { r: 0, g: 0, b: 255, a: 255 };

    fn line(color: Rgba8, width: f32) -> RenderState {
        RenderState::new(RenderShape::Line {
            color,
            width: Px::new(width),
            z_order: 1,
            stipple: None,
        })
    }

    #[test]
    fn px_folds_signed_zero_and_nan() {
        assert_eq!(Px::new(-0.0), Px::new(0.0));
        assert_eq!(Px::new(f32::NAN), Px::new(0.0));
        assert_ne!(Px::new(1.0), Px::new(1.5));
    }

    #[test]
    fn equal_shapes_share_an_instance() {
        let pool = RenderPropertyPool::new();
        let a = pool.intern(line(RED, 2.0));
        let b = pool.intern(line(RED, 2.0));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn every_field_separates_instances() {
        let pool = RenderPropertyPool::new();
        let base = pool.intern(line(RED, 2.0));
        let other_color = pool.intern(line(BLUE, 2.0));
        let other_width = pool.intern(line(RED, 3.0));
        let stippled = pool.intern(RenderState::new(RenderShape::Line {
            color: RED,
            width: Px::new(2.0),
            z_order: 1,
            stipple: Some(0xF0F0),
        }));
        assert_eq!(pool.len(), 4);
        assert!(!Arc::ptr_eq(&base, &other_color));
        assert!(!Arc::ptr_eq(&base, &other_width));
        assert!(!Arc::ptr_eq(&base, &stippled));
    }

    #[test]
    fn fingerprint_is_consistent() {
        let state = line(RED, 2.0);
        assert!(state.is_consistent());
        assert_eq!(state.fingerprint(), line(RED, 2.0).fingerprint());
        assert_eq!(state.shape().kind_name(), "line");
        assert_eq!(state.shape().z_order(), 1);
    }
}
