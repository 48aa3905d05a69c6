// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Building render state and geometry requests for features.
//!
//! Construction resolves the style's values through its chain once, then for
//! each feature:
//!
//! 1. picks the render shape for the style kind (colors by
//!    [`VisualState::base_color`] precedence),
//! 2. interns the render state in the session pool,
//! 3. places the feature vertically with [`resolve_position`],
//! 4. computes the footprint (ellipse axes, bearing end point), and
//! 5. hands a [`GeometryRequest`] to the host [`GeometryFactory`].

use std::fmt;
use std::sync::Arc;

use geostyle_geo::{
    AltitudeInput, EllipseAxes, Ellipsoid, FillStyle, LatLon, LengthUnit, Position,
    ReferenceMode, VisualState, fill_colors, resolve_position,
};
use geostyle_param::{ParamValue, Rgba8};
use geostyle_pool::{Px, RenderPropertyPool, RenderShape, RenderState, ZOrder};

use crate::capability::{StyleKind, keys};
use crate::chain::StyleChain;
use crate::error::StyleError;
use crate::feature::{ColumnSpec, FeatureContext};
use crate::style::Style;

/// A style's values, resolved through its chain.
///
/// Keys nothing in the chain defines keep their defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleValues {
    /// Base color.
    pub color: Rgba8,
    /// Selection color.
    pub select_color: Rgba8,
    /// Point diameter in pixels.
    pub point_size: f64,
    /// Line width in pixels.
    pub line_width: f64,
    /// Line stipple pattern.
    pub stipple: Option<u16>,
    /// Drawing order.
    pub z_order: ZOrder,
    /// Added to the drawing order of selected features.
    pub selected_z_offset: ZOrder,
    /// Rim fade alpha.
    pub rim_fade: u8,
    /// Fill style.
    pub fill_style: FillStyle,
    /// Tile opacity.
    pub opacity: u8,
    /// Icon resource key.
    pub icon: Arc<str>,
    /// Icon scale factor.
    pub icon_scale: f64,
    /// Altitude reference mode.
    pub reference_mode: ReferenceMode,
    /// Lift in meters.
    pub lift_m: f64,
    /// Extra lift for selected features, in meters.
    pub selected_lift_m: f64,
    /// Whether the altitude column is used.
    pub use_altitude: bool,
    /// Whether the altitude column holds depths.
    pub is_depth: bool,
    /// Multiplier for ellipse axes.
    pub axis_scale: f64,
    /// Semi-major axis for features without one, in `axis_unit`.
    pub semi_major: f64,
    /// Semi-minor axis for features without one, in `axis_unit`.
    pub semi_minor: f64,
    /// Major-axis bearing for features without one, in degrees.
    pub orientation_deg: f64,
    /// Unit of the default axes.
    pub axis_unit: LengthUnit,
    /// Length of a line of bearing in meters.
    pub line_length_m: f64,
}

const RESOLVED_KEYS: [&str; 23] = [
    keys::COLOR,
    keys::SELECT_COLOR,
    keys::POINT_SIZE,
    keys::LINE_WIDTH,
    keys::STIPPLE,
    keys::Z_ORDER,
    keys::SELECTED_Z_OFFSET,
    keys::RIM_FADE,
    keys::FILL_STYLE,
    keys::OPACITY,
    keys::ICON,
    keys::ICON_SCALE,
    keys::ALTITUDE_REFERENCE,
    keys::LIFT,
    keys::SELECTED_LIFT,
    keys::USE_ALTITUDE,
    keys::IS_DEPTH,
    keys::AXIS_SCALE,
    keys::SEMI_MAJOR,
    keys::SEMI_MINOR,
    keys::ORIENTATION,
    keys::AXIS_UNIT,
    keys::LINE_LENGTH,
];

impl Default for StyleValues {
    fn default() -> Self {
        let white = Rgba8 {
            r: 255,
            g: 255,
            b: 255,
            a: 255,
        };
        Self {
            color: white,
            select_color: white,
            point_size: 4.0,
            line_width: 1.0,
            stipple: None,
            z_order: 0,
            selected_z_offset: 0,
            rim_fade: 255,
            fill_style: FillStyle::Solid,
            opacity: 255,
            icon: Arc::from(""),
            icon_scale: 1.0,
            reference_mode: ReferenceMode::Automatic,
            lift_m: 0.0,
            selected_lift_m: 0.0,
            use_altitude: false,
            is_depth: false,
            axis_scale: 1.0,
            semi_major: 1.0,
            semi_minor: 1.0,
            orientation_deg: 0.0,
            axis_unit: LengthUnit::Kilometers,
            line_length_m: 0.0,
        }
    }
}

impl StyleValues {
    /// Resolves every known key through `style`'s chain.
    pub fn resolve<S: StyleChain + ?Sized>(style: &S) -> Result<Self, StyleError> {
        let mut values = Self::default();
        for key in RESOLVED_KEYS {
            if let Some(value) = style.resolve_value(key)? {
                values.assign(key, &value);
            }
        }
        Ok(values)
    }

    /// Stores `value` in the field for `key`.
    ///
    /// Returns `false` for keys that map to no field. Values of the wrong
    /// shape leave the field untouched.
    pub fn assign(&mut self, key: &str, value: &ParamValue) -> bool {
        match key {
            keys::COLOR => set_some(&mut self.color, value.as_color()),
            keys::SELECT_COLOR => set_some(&mut self.select_color, value.as_color()),
            keys::POINT_SIZE => set_some(&mut self.point_size, value.as_f64()),
            keys::LINE_WIDTH => set_some(&mut self.line_width, value.as_f64()),
            keys::STIPPLE => {
                if let Some(raw) = value.as_i64() {
                    self.stipple = u16::try_from(raw).ok().filter(|s| *s != 0);
                }
            }
            keys::Z_ORDER => set_some(&mut self.z_order, value.as_i64().map(saturating_i32)),
            keys::SELECTED_Z_OFFSET => {
                set_some(&mut self.selected_z_offset, value.as_i64().map(saturating_i32));
            }
            keys::RIM_FADE => set_some(&mut self.rim_fade, value.as_i64().map(clamp_u8)),
            keys::FILL_STYLE => set_some(&mut self.fill_style, parse_tag(key, value)),
            keys::OPACITY => set_some(&mut self.opacity, value.as_i64().map(clamp_u8)),
            keys::ICON => set_some(&mut self.icon, value.as_str().map(Arc::from)),
            keys::ICON_SCALE => set_some(&mut self.icon_scale, value.as_f64()),
            keys::ALTITUDE_REFERENCE => {
                let mode = value.as_str().and_then(ReferenceMode::from_tag);
                if mode.is_none() {
                    tracing::warn!(key, ?value, "unrecognized reference mode");
                }
                set_some(&mut self.reference_mode, mode);
            }
            keys::LIFT => set_some(&mut self.lift_m, value.as_f64()),
            keys::SELECTED_LIFT => set_some(&mut self.selected_lift_m, value.as_f64()),
            keys::USE_ALTITUDE => set_some(&mut self.use_altitude, value.as_bool()),
            keys::IS_DEPTH => set_some(&mut self.is_depth, value.as_bool()),
            keys::AXIS_SCALE => set_some(&mut self.axis_scale, value.as_f64()),
            keys::SEMI_MAJOR => set_some(&mut self.semi_major, value.as_f64()),
            keys::SEMI_MINOR => set_some(&mut self.semi_minor, value.as_f64()),
            keys::ORIENTATION => set_some(&mut self.orientation_deg, value.as_f64()),
            keys::AXIS_UNIT => {
                let unit = value.as_str().and_then(|tag| tag.parse::<LengthUnit>().ok());
                if unit.is_none() {
                    tracing::warn!(key, ?value, "unrecognized axis unit");
                }
                set_some(&mut self.axis_unit, unit);
            }
            keys::LINE_LENGTH => set_some(&mut self.line_length_m, value.as_f64()),
            _ => return false,
        }
        true
    }

    /// Returns the color inputs for `feature`.
    #[must_use]
    pub fn visual_state(&self, feature: &FeatureContext) -> VisualState {
        VisualState {
            selected: feature.selected,
            explicit_color: feature.explicit_color,
            default_color: self.color,
            select_color: self.select_color,
            rim_fade: self.rim_fade,
        }
    }

    /// Returns the drawing order for `feature`.
    #[must_use]
    pub fn z_order_for(&self, feature: &FeatureContext) -> ZOrder {
        if feature.selected {
            self.z_order.saturating_add(self.selected_z_offset)
        } else {
            self.z_order
        }
    }

    /// Returns the render shape a fresh feature of `kind` gets.
    #[must_use]
    pub fn shape_for(&self, kind: StyleKind, feature: &FeatureContext) -> RenderShape {
        let visual = self.visual_state(feature);
        let z_order = self.z_order_for(feature);
        match kind {
            StyleKind::Point => RenderShape::Point {
                color: visual.base_color(),
                size: Px::from_f64(self.point_size),
                z_order,
            },
            StyleKind::Icon => RenderShape::Icon {
                icon: Arc::clone(&self.icon),
                scale: Px::from_f64(self.icon_scale),
                z_order,
            },
            StyleKind::Ellipse | StyleKind::Polygon => match fill_colors(&visual, self.fill_style) {
                Some((center_color, edge_color)) => RenderShape::Fill {
                    center_color,
                    edge_color,
                    z_order,
                },
                // Unfilled areas draw their outline only.
                None => RenderShape::Line {
                    color: visual.base_color(),
                    width: Px::from_f64(self.line_width),
                    z_order,
                    stipple: None,
                },
            },
            StyleKind::LineOfBearing => RenderShape::Line {
                color: visual.base_color(),
                width: Px::from_f64(self.line_width),
                z_order,
                stipple: self.stipple,
            },
            StyleKind::Tile => RenderShape::Tile {
                opacity: self.opacity,
                z_order,
            },
        }
    }

    /// Returns the altitude inputs for `feature`.
    #[must_use]
    pub fn altitude_input(&self, feature: &FeatureContext) -> AltitudeInput {
        let metadata_override_m = feature
            .collection
            .altitude_column
            .as_ref()
            .and_then(|column| feature.metadata_m(column));
        AltitudeInput {
            mode: self.reference_mode,
            intrinsic_level: feature.location.reference,
            follows_terrain: feature.location.follows_terrain,
            raw_altitude_m: feature.location.altitude_m,
            metadata_override_m,
            use_altitude: self.use_altitude,
            is_depth: self.is_depth,
            selection_adjust_m: if feature.selected {
                self.selected_lift_m
            } else {
                0.0
            },
            lift_m: self.lift_m,
        }
    }

    /// Reads the feature's axes from its metadata, scaled by the axis scale.
    ///
    /// An axis whose column is absent or malformed takes the style's default.
    #[must_use]
    pub fn axes(&self, feature: &FeatureContext) -> EllipseAxes {
        let collection = &feature.collection;
        let axis = |column: Option<&ColumnSpec>, default: f64| {
            column
                .and_then(|column| feature.metadata_m(column))
                .unwrap_or_else(|| self.axis_unit.to_meters(default))
        };
        let major = axis(collection.semi_major_column.as_ref(), self.semi_major);
        let minor = axis(collection.semi_minor_column.as_ref(), self.semi_minor);
        EllipseAxes::new(
            major * self.axis_scale,
            minor * self.axis_scale,
            self.orientation_for(feature),
        )
    }

    fn orientation_for(&self, feature: &FeatureContext) -> f64 {
        feature
            .collection
            .orientation_column
            .as_deref()
            .and_then(|column| feature.metadata_f64(column))
            .unwrap_or(self.orientation_deg)
    }
}

fn set_some<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn saturating_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

fn clamp_u8(value: i64) -> u8 {
    u8::try_from(value.clamp(0, 255)).unwrap_or(u8::MAX)
}

fn parse_tag(key: &str, value: &ParamValue) -> Option<FillStyle> {
    let parsed = value.as_str().and_then(|tag| tag.parse().ok());
    if parsed.is_none() {
        tracing::warn!(key, ?value, "unrecognized fill style");
    }
    parsed
}

/// Builds the initial render state of `feature` for `style`.
pub fn build_render_state(style: &Style, feature: &FeatureContext) -> Result<RenderState, StyleError> {
    let values = StyleValues::resolve(style)?;
    Ok(RenderState::new(values.shape_for(style.kind(), feature)))
}

/// The horizontal extent of a feature, for kinds that have one.
#[derive(Clone, Debug, PartialEq)]
pub enum Footprint {
    /// An ellipse with its flat outline and metric ellipsoid.
    Ellipse {
        /// Outline in (lon, lat) degrees.
        outline: kurbo::Ellipse,
        /// Metric ellipsoid.
        ellipsoid: Ellipsoid,
    },
    /// A line of bearing from the feature to `end`.
    Bearing {
        /// Far end of the line.
        end: LatLon,
    },
}

/// Everything the host needs to build geometry for one feature.
#[derive(Clone, Debug)]
pub struct GeometryRequest {
    /// Element id.
    pub element_id: u64,
    /// Geometry id.
    pub geometry_id: u64,
    /// The style kind.
    pub kind: StyleKind,
    /// Placed location.
    pub position: Arc<Position>,
    /// Interned render state.
    pub render_state: Arc<RenderState>,
    /// Horizontal extent, if the kind has one.
    pub footprint: Option<Footprint>,
}

/// The host side of construction: turns requests into renderable geometry.
pub trait GeometryFactory {
    /// The geometry handle produced.
    type Geometry;
    /// The factory's error.
    type Error: fmt::Display;

    /// Creates geometry for one feature.
    fn create(&self, request: GeometryRequest) -> Result<Self::Geometry, Self::Error>;
}

/// Builds geometry for one feature.
///
/// `existing_position` is reused when the feature's placement did not change.
pub fn construct<F: GeometryFactory>(
    style: &Style,
    feature: &FeatureContext,
    existing_position: Option<&Arc<Position>>,
    pool: &RenderPropertyPool<RenderState>,
    factory: &F,
) -> Result<F::Geometry, StyleError> {
    let values = StyleValues::resolve(style)?;
    construct_with(style.kind(), &values, feature, existing_position, pool, factory)
}

fn construct_with<F: GeometryFactory>(
    kind: StyleKind,
    values: &StyleValues,
    feature: &FeatureContext,
    existing_position: Option<&Arc<Position>>,
    pool: &RenderPropertyPool<RenderState>,
    factory: &F,
) -> Result<F::Geometry, StyleError> {
    let render_state = pool.intern(RenderState::new(values.shape_for(kind, feature)));

    let location = &feature.location;
    let existing = existing_position.cloned().unwrap_or_else(|| {
        Arc::new(Position {
            lat_deg: location.lat_deg,
            lon_deg: location.lon_deg,
            altitude_m: location.altitude_m,
            reference: location.reference,
        })
    });
    let position = if kind.is_placed() {
        resolve_position(&existing, &values.altitude_input(feature))
    } else {
        existing
    };

    let center = LatLon::new(position.lat_deg, position.lon_deg);
    let footprint = match kind {
        StyleKind::Ellipse => {
            let axes = values.axes(feature);
            Some(Footprint::Ellipse {
                outline: axes.to_ellipse(center),
                ellipsoid: axes.to_ellipsoid(),
            })
        }
        StyleKind::LineOfBearing => Some(Footprint::Bearing {
            end: center.destination(values.orientation_for(feature), values.line_length_m),
        }),
        StyleKind::Point | StyleKind::Icon | StyleKind::Polygon | StyleKind::Tile => None,
    };

    let request = GeometryRequest {
        element_id: feature.element_id,
        geometry_id: feature.geometry_id,
        kind,
        position,
        render_state,
        footprint,
    };
    factory
        .create(request)
        .map_err(|err| StyleError::GeometryFactory {
            element_id: feature.element_id,
            message: err.to_string(),
        })
}

/// The outcome of [`construct_batch`].
#[derive(Debug)]
pub struct BatchReport<G> {
    /// Geometry built, keyed by element id, in input order.
    pub built: Vec<(u64, G)>,
    /// Features that were skipped and why.
    pub skipped: Vec<(u64, StyleError)>,
}

/// Builds geometry for many features.
///
/// A feature whose construction fails is logged and skipped; the rest of the
/// batch continues. Only a failure to resolve the style itself fails the
/// whole call.
pub fn construct_batch<'a, F, I>(
    style: &Style,
    features: I,
    pool: &RenderPropertyPool<RenderState>,
    factory: &F,
) -> Result<BatchReport<F::Geometry>, StyleError>
where
    F: GeometryFactory,
    I: IntoIterator<Item = &'a FeatureContext>,
{
    let values = StyleValues::resolve(style)?;
    let mut report = BatchReport {
        built: Vec::new(),
        skipped: Vec::new(),
    };
    for feature in features {
        match construct_with(style.kind(), &values, feature, None, pool, factory) {
            Ok(geometry) => report.built.push((feature.element_id, geometry)),
            Err(err) => {
                tracing::warn!(
                    style = style.name(),
                    element_id = feature.element_id,
                    %err,
                    "skipping feature"
                );
                report.skipped.push((feature.element_id, err));
            }
        }
    }
    tracing::debug!(
        style = style.name(),
        built = report.built.len(),
        skipped = report.skipped.len(),
        "batch constructed"
    );
    Ok(report)
}
