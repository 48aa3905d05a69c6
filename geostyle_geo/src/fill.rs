// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fill colors for area features with a rim-fade gradient.

use std::fmt;
use std::str::FromStr;

use peniko::color::Rgba8;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the rim fade is applied on a filled shape.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStyle {
    /// No fill; only the outline is drawn.
    NoFill,
    /// Center and edge both faded.
    #[default]
    Solid,
    /// Faded center, opaque edge.
    Edge,
    /// Opaque center, faded edge.
    Center,
}

impl FillStyle {
    /// Returns the tag used in enum parameters.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::NoFill => "no_fill",
            Self::Solid => "solid",
            Self::Edge => "edge",
            Self::Center => "center",
        }
    }
}

impl fmt::Display for FillStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when a fill style tag is not recognized.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown fill style: {0}")]
pub struct UnknownFillStyle(pub String);

impl FromStr for FillStyle {
    type Err = UnknownFillStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_fill" | "none" => Ok(Self::NoFill),
            "solid" => Ok(Self::Solid),
            "edge" => Ok(Self::Edge),
            "center" => Ok(Self::Center),
            _ => Err(UnknownFillStyle(s.to_owned())),
        }
    }
}

/// The per-feature inputs to color selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VisualState {
    /// Whether the feature is selected.
    pub selected: bool,
    /// A color carried by the feature itself.
    pub explicit_color: Option<Rgba8>,
    /// The style's color.
    pub default_color: Rgba8,
    /// The style's selection color.
    pub select_color: Rgba8,
    /// Rim fade alpha in `[0, 255]`.
    pub rim_fade: u8,
}

impl VisualState {
    /// Returns the feature's base color.
    ///
    /// Selection beats an explicit feature color, which beats the style color.
    /// Construction and in-place patching both go through here.
    #[must_use]
    pub fn base_color(&self) -> Rgba8 {
        if self.selected {
            self.select_color
        } else {
            self.explicit_color.unwrap_or(self.default_color)
        }
    }
}

/// Returns the `(center, edge)` colors of a filled shape, or `None` for
/// [`FillStyle::NoFill`].
///
/// The faded alpha is `rim_fade * base.a / 255`.
///
/// # Example
///
/// ```rust
/// use geostyle_geo::fill::{FillStyle, VisualState, fill_colors};
/// use peniko::color::Rgba8;
///
/// let red = Rgba8 { r: 255, g: 0, b: 0, a: 255 };
/// let visual = VisualState {
///     selected: false,
///     explicit_color: None,
///     default_color: red,
///     select_color: red,
///     rim_fade: 64,
/// };
/// let (center, edge) = fill_colors(&visual, FillStyle::Edge).unwrap();
/// assert_eq!((center.a, edge.a), (64, 255));
/// ```
#[must_use]
pub fn fill_colors(visual: &VisualState, style: FillStyle) -> Option<(Rgba8, Rgba8)> {
    let base = visual.base_color();
    let faded = Rgba8 {
        a: fade_alpha(visual.rim_fade, base.a),
        ..base
    };
    match style {
        FillStyle::NoFill => None,
        FillStyle::Solid => Some((faded, faded)),
        FillStyle::Edge => Some((faded, base)),
        FillStyle::Center => Some((base, faded)),
    }
}

fn fade_alpha(rim_fade: u8, alpha: u8) -> u8 {
    let scaled = u16::from(rim_fade) * u16::from(alpha) / 255;
    u8::try_from(scaled).unwrap_or(u8::MAX)
}

/// Clamps a raw rim fade value to `[0, 255]`.
#[must_use]
pub fn clamp_rim_fade(value: i64) -> u8 {
    u8::try_from(value.clamp(0, 255)).unwrap_or(u8::MAX)
}
