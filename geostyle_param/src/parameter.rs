// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable parameter records.
//!
//! This module provides [`ParameterValue`], the unit stored in a
//! [`ParameterStore`](crate::ParameterStore), and [`ParamFlags`] describing how a
//! change to the parameter propagates.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::error::ParamError;
use crate::value::{ParamValue, TypeTag};

bitflags! {
    /// Behavior flags attached to a parameter.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ParamFlags: u8 {
        /// Any change to this parameter discards existing geometry.
        const REBUILD_REQUIRED = 1 << 0;
        /// A color parameter whose changes only matter through their alpha channel.
        const COLOR_OPACITY_ONLY = 1 << 1;
        /// Persist the value even when it equals the default.
        const SAVE_ALWAYS = 1 << 2;
    }
}

/// Callback used to coerce a raw value before it is stored.
///
/// This can be used to clamp values, snap to a grid, etc.
pub type CoerceFn = Arc<dyn Fn(ParamValue) -> ParamValue + Send + Sync>;

/// An immutable `(key, display name, value, declared type, flags)` record.
///
/// Setting a parameter never mutates a record; [`ParameterValue::with_value`]
/// derives a new one that replaces the old.
///
/// # Example
///
/// ```rust
/// use geostyle_param::{ParamFlags, ParamValue, ParameterValue, TypeTag};
///
/// let lift = ParameterValue::new("lift", "Lift (m)", ParamValue::Float(0.0))
///     .with_flags(ParamFlags::REBUILD_REQUIRED);
///
/// let raised = lift.with_value(ParamValue::Int(5)).unwrap();
/// assert_eq!(raised.value(), &ParamValue::Float(5.0));
/// assert_eq!(raised.declared_type(), TypeTag::Float);
/// assert_eq!(lift.value(), &ParamValue::Float(0.0));
/// ```
#[derive(Clone)]
pub struct ParameterValue {
    key: Arc<str>,
    display_name: Arc<str>,
    value: ParamValue,
    declared_type: TypeTag,
    flags: ParamFlags,
    coerce: Option<CoerceFn>,
}

impl ParameterValue {
    /// Creates a parameter whose declared type is the type of `value`.
    #[must_use]
    pub fn new(key: &str, display_name: &str, value: ParamValue) -> Self {
        Self {
            key: Arc::from(key),
            display_name: Arc::from(display_name),
            declared_type: value.type_tag(),
            value,
            flags: ParamFlags::empty(),
            coerce: None,
        }
    }

    /// Replaces the behavior flags.
    #[must_use]
    pub fn with_flags(mut self, flags: ParamFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Installs a coerce callback and applies it to the current value.
    #[must_use]
    pub fn with_coerce<F>(mut self, coerce: F) -> Self
    where
        F: Fn(ParamValue) -> ParamValue + Send + Sync + 'static,
    {
        let coerce: CoerceFn = Arc::new(coerce);
        self.value = coerce(self.value);
        self.coerce = Some(coerce);
        self
    }

    /// Returns the key.
    #[must_use]
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the shared key.
    #[must_use]
    #[inline]
    pub fn shared_key(&self) -> Arc<str> {
        Arc::clone(&self.key)
    }

    /// Returns the human-readable name.
    #[must_use]
    #[inline]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the current value.
    #[must_use]
    #[inline]
    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    /// Returns the declared type.
    #[must_use]
    #[inline]
    pub fn declared_type(&self) -> TypeTag {
        self.declared_type
    }

    /// Returns the behavior flags.
    #[must_use]
    #[inline]
    pub fn flags(&self) -> ParamFlags {
        self.flags
    }

    /// Returns `true` if a change to this parameter forces a geometry rebuild.
    #[must_use]
    #[inline]
    pub fn rebuild_required(&self) -> bool {
        self.flags.contains(ParamFlags::REBUILD_REQUIRED)
    }

    /// Converts and coerces a raw value the way [`with_value`](Self::with_value) would,
    /// without building a new record.
    pub fn prepare(&self, raw: ParamValue) -> Result<ParamValue, ParamError> {
        let value = self.declared_type.coerce(&self.key, raw)?;
        Ok(match &self.coerce {
            Some(coerce) => coerce(value),
            None => value,
        })
    }

    /// Derives a new record carrying `raw`.
    ///
    /// Fails with [`ParamError::TypeMismatch`] if `raw` is incompatible with the
    /// declared type.
    pub fn with_value(&self, raw: ParamValue) -> Result<Self, ParamError> {
        let value = self.prepare(raw)?;
        Ok(self.replaced(value))
    }

    /// Builds the successor record from an already prepared value.
    pub(crate) fn replaced(&self, value: ParamValue) -> Self {
        Self {
            key: Arc::clone(&self.key),
            display_name: Arc::clone(&self.display_name),
            value,
            declared_type: self.declared_type,
            flags: self.flags,
            coerce: self.coerce.clone(),
        }
    }
}

impl PartialEq for ParameterValue {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.display_name == other.display_name
            && self.value == other.value
            && self.declared_type == other.declared_type
            && self.flags == other.flags
    }
}

// Manual Debug impl since the coerce callback isn't Debug
impl fmt::Debug for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterValue")
            .field("key", &self.key)
            .field("display_name", &self.display_name)
            .field("value", &self.value)
            .field("declared_type", &self.declared_type)
            .field("flags", &self.flags)
            .field("has_coerce", &self.coerce.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rim_fade() -> ParameterValue {
        ParameterValue::new("rim_fade", "Rim fade", ParamValue::Int(255))
            .with_coerce(|v| match v {
                ParamValue::Int(i) => ParamValue::Int(i.clamp(0, 255)),
                other => other,
            })
    }

    #[test]
    fn new_infers_declared_type() {
        let p = ParameterValue::new("size", "Size", ParamValue::Float(3.0));
        assert_eq!(p.declared_type(), TypeTag::Float);
        assert!(p.flags().is_empty());
        assert!(!p.rebuild_required());
    }

    #[test]
    fn with_value_keeps_original() {
        let p = ParameterValue::new("size", "Size", ParamValue::Float(3.0));
        let q = p.with_value(ParamValue::Float(4.0)).unwrap();
        assert_eq!(p.value(), &ParamValue::Float(3.0));
        assert_eq!(q.value(), &ParamValue::Float(4.0));
        assert_eq!(q.key(), "size");
    }

    #[test]
    fn with_value_rejects_wrong_type() {
        let p = ParameterValue::new("size", "Size", ParamValue::Float(3.0));
        let err = p.with_value(ParamValue::Bool(true)).unwrap_err();
        assert_eq!(
            err,
            ParamError::TypeMismatch {
                key: "size".into(),
                expected: TypeTag::Float,
                found: TypeTag::Bool,
            }
        );
    }

    #[test]
    fn coerce_clamps() {
        let p = rim_fade();
        assert_eq!(p.with_value(ParamValue::Int(-5)).unwrap().value(), &ParamValue::Int(0));
        assert_eq!(p.with_value(ParamValue::Int(500)).unwrap().value(), &ParamValue::Int(255));
        assert_eq!(p.with_value(ParamValue::Int(128)).unwrap().value(), &ParamValue::Int(128));
    }

    #[test]
    fn flags_survive_derivation() {
        let p = ParameterValue::new("lift", "Lift", ParamValue::Float(0.0))
            .with_flags(ParamFlags::REBUILD_REQUIRED | ParamFlags::SAVE_ALWAYS);
        let q = p.with_value(ParamValue::Float(1.0)).unwrap();
        assert!(q.rebuild_required());
        assert!(q.flags().contains(ParamFlags::SAVE_ALWAYS));
    }

    #[test]
    fn debug_mentions_coerce() {
        let debug = format!("{:?}", rim_fade());
        assert!(debug.contains("ParameterValue"));
        assert!(debug.contains("has_coerce: true"));
    }
}
