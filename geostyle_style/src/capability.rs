// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style kinds and their capability flags.
//!
//! Instead of a class per feature type, a style is a [`StyleKind`] (a row in a
//! small policy table) plus its [`Capabilities`] and parameters.

use std::fmt;

use bitflags::bitflags;
use geostyle_geo::{FillStyle, LengthUnit, ReferenceMode, clamp_rim_fade};
use geostyle_param::{ParamFlags, ParamValue, ParameterValue, Rgba8};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Boolean behavior a style may report.
    ///
    /// Chained queries are pessimistic: a style reports a capability if it has
    /// it locally or any predecessor reports it.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Every parameter change discards existing geometry.
        const ALL_CHANGES_REQUIRE_REBUILD = 1 << 0;
        /// Render state depends on feature selection.
        const SELECTION_SENSITIVE = 1 << 1;
        /// The style produces filled area geometry.
        const COMPUTES_FILL_GEOMETRY = 1 << 2;
        /// The style can draw feature labels.
        const SUPPORTS_LABELS = 1 << 3;
    }
}

/// Parameter keys shared by the built-in style kinds.
pub mod keys {
    /// Base color ([`Color`](geostyle_param::ParamValue::Color)).
    pub const COLOR: &str = "color";
    /// Color of selected features.
    pub const SELECT_COLOR: &str = "select_color";
    /// Point diameter in pixels.
    pub const POINT_SIZE: &str = "point_size";
    /// Line width in pixels.
    pub const LINE_WIDTH: &str = "line_width";
    /// 16-bit line stipple pattern; zero draws solid.
    pub const STIPPLE: &str = "stipple";
    /// Drawing order.
    pub const Z_ORDER: &str = "z_order";
    /// Added to the drawing order of selected features.
    pub const SELECTED_Z_OFFSET: &str = "selected_z_offset";
    /// Rim fade alpha, clamped to `[0, 255]`.
    pub const RIM_FADE: &str = "rim_fade";
    /// Fill style tag, see [`FillStyle`](geostyle_geo::FillStyle).
    pub const FILL_STYLE: &str = "fill_style";
    /// Tile opacity, clamped to `[0, 255]`.
    pub const OPACITY: &str = "opacity";
    /// Icon resource key.
    pub const ICON: &str = "icon";
    /// Icon scale factor.
    pub const ICON_SCALE: &str = "icon_scale";
    /// Reference mode tag, see [`ReferenceMode`](geostyle_geo::ReferenceMode).
    pub const ALTITUDE_REFERENCE: &str = "altitude_reference";
    /// Meters added to every feature's altitude.
    pub const LIFT: &str = "lift";
    /// Meters added to selected features' altitude.
    pub const SELECTED_LIFT: &str = "selected_lift";
    /// Whether the collection's altitude column is used.
    pub const USE_ALTITUDE: &str = "use_altitude";
    /// Whether the altitude column holds depths.
    pub const IS_DEPTH: &str = "is_depth";
    /// Multiplier applied to ellipse axes.
    pub const AXIS_SCALE: &str = "axis_scale";
    /// Semi-major axis used when a feature's metadata has none, in
    /// [`AXIS_UNIT`].
    pub const SEMI_MAJOR: &str = "semi_major";
    /// Semi-minor axis used when a feature's metadata has none, in
    /// [`AXIS_UNIT`].
    pub const SEMI_MINOR: &str = "semi_minor";
    /// Major-axis bearing in degrees used when a feature's metadata has none.
    pub const ORIENTATION: &str = "orientation";
    /// Unit tag of the default axes, see [`LengthUnit`](geostyle_geo::LengthUnit).
    pub const AXIS_UNIT: &str = "axis_unit";
    /// Length of a line of bearing in meters.
    pub const LINE_LENGTH: &str = "line_length";
    /// Whether feature labels are drawn.
    pub const SHOW_LABELS: &str = "show_labels";
}

const WHITE: Rgba8 = Rgba8 {
    r: 255,
    g: 255,
    b: 255,
    a: 255,
};
const YELLOW: Rgba8 = Rgba8 {
    r: 255,
    g: 255,
    b: 0,
    a: 255,
};

/// The built-in style kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleKind {
    /// Screen-space points.
    Point,
    /// Textured icons. Tinting is baked into the texture, so every change rebuilds.
    Icon,
    /// Ellipses sized from axis metadata.
    Ellipse,
    /// Filled polygons.
    Polygon,
    /// Lines of bearing from a feature's location.
    LineOfBearing,
    /// Raster tiles.
    Tile,
}

impl StyleKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Point,
        Self::Icon,
        Self::Ellipse,
        Self::Polygon,
        Self::LineOfBearing,
        Self::Tile,
    ];

    /// Returns the capabilities a fresh style of this kind has locally.
    #[must_use]
    pub fn capabilities(self) -> Capabilities {
        match self {
            Self::Point => Capabilities::SELECTION_SENSITIVE | Capabilities::SUPPORTS_LABELS,
            Self::Icon => {
                Capabilities::ALL_CHANGES_REQUIRE_REBUILD | Capabilities::SUPPORTS_LABELS
            }
            Self::Ellipse => {
                Capabilities::SELECTION_SENSITIVE | Capabilities::COMPUTES_FILL_GEOMETRY
            }
            Self::Polygon => {
                Capabilities::SELECTION_SENSITIVE
                    | Capabilities::COMPUTES_FILL_GEOMETRY
                    | Capabilities::SUPPORTS_LABELS
            }
            Self::LineOfBearing => Capabilities::SELECTION_SENSITIVE,
            Self::Tile => Capabilities::empty(),
        }
    }

    /// Returns `true` if features of this kind are placed vertically.
    #[must_use]
    pub fn is_placed(self) -> bool {
        !matches!(self, Self::Tile)
    }

    /// Returns `true` if this kind reads axis metadata.
    #[must_use]
    pub fn uses_axes(self) -> bool {
        matches!(self, Self::Ellipse)
    }

    /// Returns the kind's name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Icon => "icon",
            Self::Ellipse => "ellipse",
            Self::Polygon => "polygon",
            Self::LineOfBearing => "line_of_bearing",
            Self::Tile => "tile",
        }
    }

    /// Returns the parameters a fresh style of this kind defines.
    #[must_use]
    pub fn default_parameters(self) -> Vec<ParameterValue> {
        let mut params = vec![
            ParameterValue::new(keys::Z_ORDER, "Drawing order", ParamValue::Int(0)),
        ];
        if self != Self::Tile {
            params.extend([
                ParameterValue::new(keys::COLOR, "Color", ParamValue::Color(WHITE)),
                ParameterValue::new(keys::SELECT_COLOR, "Selection color", ParamValue::Color(YELLOW)),
                ParameterValue::new(
                    keys::SELECTED_Z_OFFSET,
                    "Selected drawing order offset",
                    ParamValue::Int(1),
                ),
            ]);
        }
        if self.is_placed() {
            params.extend(altitude_parameters());
        }
        if self.capabilities().contains(Capabilities::SUPPORTS_LABELS) {
            params.push(
                ParameterValue::new(keys::SHOW_LABELS, "Show labels", ParamValue::Bool(false))
                    .with_flags(ParamFlags::SAVE_ALWAYS),
            );
        }
        match self {
            Self::Point => {
                params.push(ParameterValue::new(
                    keys::POINT_SIZE,
                    "Point size",
                    ParamValue::Float(4.0),
                ));
            }
            Self::Icon => params.extend([
                ParameterValue::new(keys::ICON, "Icon", ParamValue::text("pin")),
                ParameterValue::new(keys::ICON_SCALE, "Icon scale", ParamValue::Float(1.0)),
            ]),
            Self::Ellipse | Self::Polygon => {
                params.extend(fill_parameters());
                if self == Self::Ellipse {
                    params.extend(axis_parameters());
                }
            }
            Self::LineOfBearing => params.extend([
                ParameterValue::new(keys::LINE_WIDTH, "Line width", ParamValue::Float(1.0)),
                ParameterValue::new(keys::STIPPLE, "Stipple", ParamValue::Int(0))
                    .with_coerce(clamp_u16),
                ParameterValue::new(keys::LINE_LENGTH, "Length (m)", ParamValue::Float(10_000.0))
                    .with_flags(ParamFlags::REBUILD_REQUIRED),
            ]),
            Self::Tile => params.push(
                ParameterValue::new(keys::OPACITY, "Opacity", ParamValue::Int(255))
                    .with_flags(ParamFlags::COLOR_OPACITY_ONLY)
                    .with_coerce(clamp_alpha),
            ),
        }
        params
    }
}

impl fmt::Display for StyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn altitude_parameters() -> [ParameterValue; 5] {
    let rebuild = ParamFlags::REBUILD_REQUIRED;
    [
        ParameterValue::new(
            keys::ALTITUDE_REFERENCE,
            "Altitude reference",
            ParamValue::tag(ReferenceMode::Automatic.tag()),
        )
        .with_flags(rebuild),
        ParameterValue::new(keys::LIFT, "Lift (m)", ParamValue::Float(0.0)).with_flags(rebuild),
        ParameterValue::new(keys::SELECTED_LIFT, "Selected lift (m)", ParamValue::Float(0.0))
            .with_flags(rebuild),
        ParameterValue::new(keys::USE_ALTITUDE, "Use altitude column", ParamValue::Bool(true))
            .with_flags(rebuild),
        ParameterValue::new(keys::IS_DEPTH, "Altitude is depth", ParamValue::Bool(false))
            .with_flags(rebuild),
    ]
}

fn axis_parameters() -> [ParameterValue; 5] {
    let rebuild = ParamFlags::REBUILD_REQUIRED;
    [
        ParameterValue::new(keys::AXIS_SCALE, "Axis scale", ParamValue::Float(1.0))
            .with_flags(rebuild),
        ParameterValue::new(keys::SEMI_MAJOR, "Default semi-major axis", ParamValue::Float(1.0))
            .with_flags(rebuild),
        ParameterValue::new(keys::SEMI_MINOR, "Default semi-minor axis", ParamValue::Float(1.0))
            .with_flags(rebuild),
        ParameterValue::new(keys::ORIENTATION, "Default orientation", ParamValue::Float(0.0))
            .with_flags(rebuild),
        ParameterValue::new(
            keys::AXIS_UNIT,
            "Default axis unit",
            ParamValue::tag(LengthUnit::Kilometers.tag()),
        )
        .with_flags(rebuild),
    ]
}

fn fill_parameters() -> [ParameterValue; 3] {
    [
        ParameterValue::new(keys::LINE_WIDTH, "Outline width", ParamValue::Float(1.0)),
        ParameterValue::new(keys::RIM_FADE, "Rim fade", ParamValue::Int(255))
            .with_coerce(clamp_alpha),
        ParameterValue::new(
            keys::FILL_STYLE,
            "Fill style",
            ParamValue::tag(FillStyle::Solid.tag()),
        ),
    ]
}

fn clamp_alpha(value: ParamValue) -> ParamValue {
    match value {
        ParamValue::Int(raw) => ParamValue::Int(i64::from(clamp_rim_fade(raw))),
        other => other,
    }
}

fn clamp_u16(value: ParamValue) -> ParamValue {
    match value {
        ParamValue::Int(raw) => ParamValue::Int(raw.clamp(0, i64::from(u16::MAX))),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(kind: StyleKind, key: &str) -> Option<ParameterValue> {
        kind.default_parameters().into_iter().find(|p| p.key() == key)
    }

    #[test]
    fn keys_are_unique_per_kind() {
        for kind in StyleKind::ALL {
            let params = kind.default_parameters();
            let mut keys: Vec<_> = params.iter().map(ParameterValue::key).collect();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), params.len(), "{kind}");
        }
    }

    #[test]
    fn placement_parameters_force_rebuild() {
        for kind in StyleKind::ALL.into_iter().filter(|k| k.is_placed()) {
            for key in [keys::LIFT, keys::ALTITUDE_REFERENCE, keys::IS_DEPTH] {
                assert!(find(kind, key).unwrap().rebuild_required(), "{kind} {key}");
            }
        }
        assert!(find(StyleKind::Tile, keys::LIFT).is_none());
    }

    #[test]
    fn only_ellipses_carry_default_axes() {
        for kind in StyleKind::ALL {
            for key in [keys::SEMI_MAJOR, keys::SEMI_MINOR, keys::ORIENTATION, keys::AXIS_UNIT] {
                let param = find(kind, key);
                assert_eq!(param.is_some(), kind.uses_axes(), "{kind} {key}");
                if let Some(param) = param {
                    assert!(param.rebuild_required(), "{key}");
                }
            }
        }
    }

    #[test]
    fn rim_fade_is_clamped() {
        let rim = find(StyleKind::Ellipse, keys::RIM_FADE).unwrap();
        assert_eq!(rim.with_value(ParamValue::Int(-5)).unwrap().value(), &ParamValue::Int(0));
        assert_eq!(rim.with_value(ParamValue::Int(500)).unwrap().value(), &ParamValue::Int(255));
    }

    #[test]
    fn label_parameter_follows_capability() {
        for kind in StyleKind::ALL {
            assert_eq!(
                find(kind, keys::SHOW_LABELS).is_some(),
                kind.capabilities().contains(Capabilities::SUPPORTS_LABELS),
                "{kind}"
            );
        }
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&StyleKind::LineOfBearing).unwrap();
        assert_eq!(json, "\"line_of_bearing\"");
    }
}
