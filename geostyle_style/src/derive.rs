// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deciding how a parameter change reaches existing render state.
//!
//! [`derive`] maps `(style, changes, existing state)` to one of three
//! outcomes, cheapest first:
//!
//! - [`Derivation::NoChange`]: the existing state still applies.
//! - [`Derivation::PatchInPlace`]: a patched copy of the state, interned.
//! - [`Derivation::RebuildRequired`]: geometry must be constructed again.

use std::fmt;
use std::sync::Arc;

use geostyle_geo::fill_colors;
use geostyle_param::{ChangeSet, ParamFlags, ParamValue, ParameterValue};
use geostyle_pool::{Px, RenderPropertyPool, RenderShape, RenderState};

use crate::capability::keys;
use crate::chain::StyleChain;
use crate::construct::StyleValues;
use crate::error::StyleError;
use crate::feature::FeatureContext;
use crate::style::Style;

/// Why existing geometry has to be rebuilt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RebuildReason {
    /// A changed parameter carries [`ParamFlags::REBUILD_REQUIRED`].
    Flagged(String),
    /// The style (or a predecessor) rebuilds on every change.
    AllChangesRequireRebuild,
    /// A changed parameter has no field in the existing shape.
    UnsupportedRenderStateShape {
        /// The changed parameter.
        key: String,
        /// The existing shape's kind.
        shape: &'static str,
    },
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flagged(key) => write!(f, "'{key}' requires a rebuild"),
            Self::AllChangesRequireRebuild => f.write_str("style rebuilds on every change"),
            Self::UnsupportedRenderStateShape { key, shape } => {
                write!(f, "'{key}' cannot be patched into a {shape} shape")
            }
        }
    }
}

/// The outcome of [`derive`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Derivation {
    /// Keep the existing render state.
    NoChange(Arc<RenderState>),
    /// Swap in this (interned) render state; geometry stays.
    PatchInPlace(Arc<RenderState>),
    /// Discard the geometry and construct it again.
    RebuildRequired(RebuildReason),
}

impl Derivation {
    /// Returns the render state to use, unless a rebuild is required.
    #[must_use]
    pub fn render_state(&self) -> Option<&Arc<RenderState>> {
        match self {
            Self::NoChange(state) | Self::PatchInPlace(state) => Some(state),
            Self::RebuildRequired(_) => None,
        }
    }

    /// Returns `true` for [`Derivation::RebuildRequired`].
    #[must_use]
    pub fn needs_rebuild(&self) -> bool {
        matches!(self, Self::RebuildRequired(_))
    }
}

/// Decides how `changes` to `style` reach `existing`, the render state of
/// `feature`.
///
/// Patches read the values `style` resolves through its chain, with the same
/// color and drawing-order precedence as construction. Label toggles map to
/// no render-state field and are ignored; if nothing else changed the result
/// is [`Derivation::NoChange`]. Any other key the shape cannot host, custom
/// parameters included, requires a rebuild.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use geostyle_param::{ChangeSet, ChangeSource, NotificationQueue, ParamValue, Rgba8};
/// use geostyle_pool::RenderPropertyPool;
/// use geostyle_style::{
///     CollectionDescriptor, Derivation, FeatureContext, FeatureLocation, StyleBuilder, StyleKind,
///     build_render_state, derive, keys,
/// };
///
/// let queue = Arc::new(NotificationQueue::spawn("geostyle-notify").unwrap());
/// let style = StyleBuilder::new("points", StyleKind::Point).build(queue).unwrap();
/// let feature = FeatureContext::new(
///     1,
///     FeatureLocation::new(0.0, 0.0),
///     Arc::new(CollectionDescriptor::new("contacts")),
/// );
/// let pool = RenderPropertyPool::new();
/// let existing = pool.intern(build_render_state(&style, &feature).unwrap());
///
/// let red = Rgba8 { r: 255, g: 0, b: 0, a: 255 };
/// let before = style.params().snapshot();
/// style.set(keys::COLOR, ParamValue::Color(red), ChangeSource::Api).unwrap();
/// let changes = ChangeSet::between(&before, &style.params().snapshot());
///
/// let outcome = derive(&style, &changes, &existing, &feature, &pool).unwrap();
/// assert!(matches!(outcome, Derivation::PatchInPlace(_)));
/// ```
pub fn derive(
    style: &Style,
    changes: &ChangeSet,
    existing: &Arc<RenderState>,
    feature: &FeatureContext,
    pool: &RenderPropertyPool<RenderState>,
) -> Result<Derivation, StyleError> {
    if changes.is_empty() {
        return Ok(Derivation::NoChange(Arc::clone(existing)));
    }
    if let Some(flagged) = changes.iter().find(|p| p.rebuild_required()) {
        return Ok(rebuild(style, RebuildReason::Flagged(flagged.key().to_owned())));
    }
    if style.all_changes_require_rebuild() {
        return Ok(rebuild(style, RebuildReason::AllChangesRequireRebuild));
    }

    // Values come from the chain, not the change set: a change to a
    // predecessor may be shadowed by this style's own value.
    let values = StyleValues::resolve(style)?;

    let mut shape = existing.to_shape();
    for change in changes {
        if !patch(&mut shape, change, &values, feature) {
            return Ok(rebuild(
                style,
                RebuildReason::UnsupportedRenderStateShape {
                    key: change.key().to_owned(),
                    shape: existing.shape().kind_name(),
                },
            ));
        }
    }

    if shape == *existing.shape() {
        return Ok(Derivation::NoChange(Arc::clone(existing)));
    }
    let patched = pool.intern(RenderState::new(shape));
    tracing::trace!(
        style = style.name(),
        element_id = feature.element_id,
        changes = changes.len(),
        "render state patched"
    );
    Ok(Derivation::PatchInPlace(patched))
}

fn rebuild(style: &Style, reason: RebuildReason) -> Derivation {
    tracing::debug!(style = style.name(), %reason, "rebuild required");
    Derivation::RebuildRequired(reason)
}

/// Applies one change to `shape`; `false` if the shape has nowhere to put it.
fn patch(
    shape: &mut RenderShape,
    change: &ParameterValue,
    values: &StyleValues,
    feature: &FeatureContext,
) -> bool {
    match change.key() {
        keys::COLOR | keys::SELECT_COLOR => patch_color(shape, values, feature),
        keys::RIM_FADE | keys::FILL_STYLE => match shape {
            RenderShape::Fill {
                center_color,
                edge_color,
                ..
            } => match fill_colors(&values.visual_state(feature), values.fill_style) {
                Some((center, edge)) => {
                    *center_color = center;
                    *edge_color = edge;
                    true
                }
                None => false,
            },
            RenderShape::Point { .. }
            | RenderShape::Line { .. }
            | RenderShape::Icon { .. }
            | RenderShape::Tile { .. } => false,
        },
        keys::POINT_SIZE => match shape {
            RenderShape::Point { size, .. } => {
                *size = Px::from_f64(values.point_size);
                true
            }
            _ => false,
        },
        keys::LINE_WIDTH => match shape {
            RenderShape::Line { width, .. } => {
                *width = Px::from_f64(values.line_width);
                true
            }
            _ => false,
        },
        keys::STIPPLE => match shape {
            RenderShape::Line { stipple, .. } => {
                *stipple = values.stipple;
                true
            }
            _ => false,
        },
        keys::Z_ORDER | keys::SELECTED_Z_OFFSET => {
            set_z_order(shape, values.z_order_for(feature));
            true
        }
        keys::ICON | keys::ICON_SCALE => match shape {
            RenderShape::Icon { icon, scale, .. } => {
                *icon = Arc::clone(&values.icon);
                *scale = Px::from_f64(values.icon_scale);
                true
            }
            _ => false,
        },
        keys::OPACITY => patch_opacity(shape, values.opacity),
        _ if change.flags().contains(ParamFlags::COLOR_OPACITY_ONLY) => {
            match opacity_of(change.value()) {
                Some(alpha) => patch_opacity(shape, alpha),
                None => false,
            }
        }
        keys::SHOW_LABELS => true,
        _ => false,
    }
}

fn patch_color(shape: &mut RenderShape, values: &StyleValues, feature: &FeatureContext) -> bool {
    let visual = values.visual_state(feature);
    match shape {
        RenderShape::Point { color, .. } | RenderShape::Line { color, .. } => {
            *color = visual.base_color();
            true
        }
        RenderShape::Fill {
            center_color,
            edge_color,
            ..
        } => match fill_colors(&visual, values.fill_style) {
            Some((center, edge)) => {
                *center_color = center;
                *edge_color = edge;
                true
            }
            None => false,
        },
        // Icon tints are baked into the texture; tiles only take opacity.
        RenderShape::Icon { .. } | RenderShape::Tile { .. } => false,
    }
}

fn patch_opacity(shape: &mut RenderShape, alpha: u8) -> bool {
    match shape {
        RenderShape::Tile { opacity, .. } => {
            *opacity = alpha;
            true
        }
        _ => false,
    }
}

fn opacity_of(value: &ParamValue) -> Option<u8> {
    match value {
        ParamValue::Color(color) => Some(color.a),
        ParamValue::Int(raw) => Some(u8::try_from((*raw).clamp(0, 255)).unwrap_or(u8::MAX)),
        _ => None,
    }
}

fn set_z_order(shape: &mut RenderShape, value: i32) {
    match shape {
        RenderShape::Point { z_order, .. }
        | RenderShape::Line { z_order, .. }
        | RenderShape::Fill { z_order, .. }
        | RenderShape::Icon { z_order, .. }
        | RenderShape::Tile { z_order, .. } => *z_order = value,
    }
}
