// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style errors.

use geostyle_param::ParamError;
use thiserror::Error;

/// Errors returned by style construction, chaining and geometry building.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StyleError {
    /// A parameter edit was rejected.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// A predecessor chain is longer than the configured limit, or would
    /// contain the style it is being attached to.
    #[error("style chain of '{style}' loops or exceeds {limit} links")]
    ChainCycleDetected {
        /// Name of the style whose chain was being walked.
        style: String,
        /// The configured chain depth limit.
        limit: usize,
    },

    /// No style with this name is installed.
    #[error("unknown style: {0}")]
    UnknownStyle(String),

    /// The engine configuration could not be loaded or is out of range.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// The host geometry factory refused a request.
    #[error("geometry factory failed for feature {element_id}: {message}")]
    GeometryFactory {
        /// The feature's element id.
        element_id: u64,
        /// The factory's error, rendered.
        message: String,
    },
}

/// Errors reading per-feature metadata.
///
/// These never fail an operation; the value is logged and treated as absent.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    /// The column holds a value that does not parse as a number.
    #[error("metadata column '{column}' is not numeric: {raw:?}")]
    NotNumeric {
        /// The metadata column.
        column: String,
        /// The offending raw text.
        raw: String,
    },
}
