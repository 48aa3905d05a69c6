// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw parameter values and their declared types.
//!
//! This module provides [`ParamValue`], the closed set of value shapes a style
//! parameter can hold, and [`TypeTag`], the type a parameter is declared with.

use std::fmt;
use std::sync::Arc;

use peniko::color::Rgba8;

use crate::error::ParamError;

/// A raw style parameter value.
///
/// Equality is value equality; two values of different variants are never equal.
/// Floats compare by bit pattern, so `NaN` equals itself and `-0.0` differs
/// from `0.0`.
///
/// # Example
///
/// ```rust
/// use geostyle_param::{ParamValue, TypeTag};
///
/// let width = ParamValue::Float(2.5);
/// assert_eq!(width.type_tag(), TypeTag::Float);
/// assert_eq!(width.as_f64(), Some(2.5));
/// ```
#[derive(Clone, Debug)]
pub enum ParamValue {
    /// A boolean toggle.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// Free text.
    Text(Arc<str>),
    /// An sRGB color with 8-bit channels.
    Color(Rgba8),
    /// One tag out of a fixed enumeration (e.g. a fill style or a unit name).
    Enum(Arc<str>),
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) | (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Color(a), Self::Color(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ParamValue {}

impl ParamValue {
    /// Returns the [`TypeTag`] this value carries at runtime.
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Bool(_) => TypeTag::Bool,
            Self::Int(_) => TypeTag::Int,
            Self::Float(_) => TypeTag::Float,
            Self::Text(_) => TypeTag::Text,
            Self::Color(_) => TypeTag::Color,
            Self::Enum(_) => TypeTag::Enum,
        }
    }

    /// Returns the boolean payload, if this is a [`ParamValue::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is a [`ParamValue::Int`].
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns a numeric payload as `f64`.
    ///
    /// Integers are widened.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the color payload, if this is a [`ParamValue::Color`].
    #[must_use]
    pub fn as_color(&self) -> Option<Rgba8> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Returns the text of a [`ParamValue::Text`] or [`ParamValue::Enum`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Creates an enum-tag value.
    #[must_use]
    pub fn tag(tag: &str) -> Self {
        Self::Enum(Arc::from(tag))
    }

    /// Creates a text value.
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::Text(Arc::from(text))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Rgba8> for ParamValue {
    fn from(value: Rgba8) -> Self {
        Self::Color(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

/// The declared type of a parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// [`ParamValue::Bool`]
    Bool,
    /// [`ParamValue::Int`]
    Int,
    /// [`ParamValue::Float`]
    Float,
    /// [`ParamValue::Text`]
    Text,
    /// [`ParamValue::Color`]
    Color,
    /// [`ParamValue::Enum`]
    Enum,
}

impl TypeTag {
    /// Converts `value` to this declared type.
    ///
    /// Only the lossless integer-to-float widening is performed; every other
    /// mismatch is a [`ParamError::TypeMismatch`] for `key`.
    pub fn coerce(self, key: &str, value: ParamValue) -> Result<ParamValue, ParamError> {
        match (self, value) {
            (Self::Float, ParamValue::Int(i)) => Ok(ParamValue::Float(i as f64)),
            (tag, value) if value.type_tag() == tag => Ok(value),
            (tag, value) => Err(ParamError::TypeMismatch {
                key: key.to_owned(),
                expected: tag,
                found: value.type_tag(),
            }),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Color => "color",
            Self::Enum => "enum",
        };
        f.write_str(name)
    }
}
