// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parameter store errors.

use thiserror::Error;

use crate::value::TypeTag;

/// Errors returned by [`ParameterStore`](crate::ParameterStore) mutations.
///
/// Both variants are non-fatal: the store is left untouched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    /// The key is not present in the store.
    #[error("no such parameter: {0}")]
    NoSuchParameter(String),

    /// The raw value's runtime type disagrees with the declared type.
    #[error("type mismatch for '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        /// The parameter key.
        key: String,
        /// The declared type.
        expected: TypeTag,
        /// The type of the rejected value.
        found: TypeTag,
    },
}
