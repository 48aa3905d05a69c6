// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style chaining.
//!
//! A style may have a predecessor it delegates to. Two different rules apply
//! along the chain:
//!
//! - **Values** are "nearest wins": the local store first, then the
//!   predecessor, and so on.
//! - **Capabilities** are pessimistic: `local OR (has_previous AND previous.query())`,
//!   so a capability reported anywhere along the chain is reported by every
//!   style after it.
//!
//! Every walk is bounded by [`StyleChain::chain_limit`].

use geostyle_param::ParamValue;

use crate::capability::Capabilities;
use crate::error::StyleError;

/// Chain depth used when no configuration says otherwise.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 32;

/// A link in a predecessor chain.
///
/// Implementors supply the local parts; the chain walks are provided.
///
/// # Example
///
/// ```rust
/// use geostyle_param::ParamValue;
/// use geostyle_style::{Capabilities, StyleChain};
///
/// struct Link {
///     caps: Capabilities,
///     width: Option<f64>,
///     previous: Option<Box<Link>>,
/// }
///
/// impl StyleChain for Link {
///     fn chain_name(&self) -> &str { "link" }
///     fn previous(&self) -> Option<&Self> { self.previous.as_deref() }
///     fn local_capabilities(&self) -> Capabilities { self.caps }
///     fn local_value(&self, _key: &str) -> Option<ParamValue> { self.width.map(ParamValue::Float) }
/// }
///
/// let root = Link { caps: Capabilities::SELECTION_SENSITIVE, width: Some(2.0), previous: None };
/// let leaf = Link { caps: Capabilities::empty(), width: None, previous: Some(Box::new(root)) };
///
/// assert!(leaf.is_selection_sensitive());
/// assert_eq!(leaf.resolve_value("line_width").unwrap(), Some(ParamValue::Float(2.0)));
/// ```
pub trait StyleChain {
    /// Name used in errors and logs.
    fn chain_name(&self) -> &str;

    /// Returns the predecessor, if any.
    fn previous(&self) -> Option<&Self>;

    /// Returns the capabilities this link has on its own.
    fn local_capabilities(&self) -> Capabilities;

    /// Returns this link's own value for `key`.
    fn local_value(&self, key: &str) -> Option<ParamValue>;

    /// Maximum number of predecessor links a walk may follow.
    fn chain_limit(&self) -> usize {
        DEFAULT_MAX_CHAIN_DEPTH
    }

    /// Returns `true` if this link has a predecessor.
    fn has_previous(&self) -> bool {
        self.previous().is_some()
    }

    /// Returns the value for `key` from the nearest link that has one.
    fn resolve_value(&self, key: &str) -> Result<Option<ParamValue>, StyleError> {
        let limit = self.chain_limit();
        let mut current = self;
        for _ in 0..=limit {
            if let Some(value) = current.local_value(key) {
                return Ok(Some(value));
            }
            match current.previous() {
                Some(previous) => current = previous,
                None => return Ok(None),
            }
        }
        Err(self.chain_error())
    }

    /// Returns the first link of the chain.
    fn base_style(&self) -> Result<&Self, StyleError> {
        let limit = self.chain_limit();
        let mut current = self;
        for _ in 0..limit {
            match current.previous() {
                Some(previous) => current = previous,
                None => return Ok(current),
            }
        }
        if current.has_previous() {
            Err(self.chain_error())
        } else {
            Ok(current)
        }
    }

    /// Returns the number of predecessors, or an error if over the limit.
    fn depth(&self) -> Result<usize, StyleError> {
        let limit = self.chain_limit();
        let mut current = self;
        let mut depth = 0;
        while let Some(previous) = current.previous() {
            depth += 1;
            if depth > limit {
                return Err(self.chain_error());
            }
            current = previous;
        }
        Ok(depth)
    }

    /// Returns `true` if `flag` is reported locally or anywhere up the chain.
    ///
    /// A chain longer than the limit reports `true`.
    fn chained_capability(&self, flag: Capabilities) -> bool {
        let limit = self.chain_limit();
        let mut current = self;
        for _ in 0..=limit {
            if current.local_capabilities().contains(flag) {
                return true;
            }
            match current.previous() {
                Some(previous) => current = previous,
                None => return false,
            }
        }
        tracing::warn!(
            style = self.chain_name(),
            limit,
            ?flag,
            "style chain over depth limit; reporting capability"
        );
        true
    }

    /// Whether every parameter change forces a rebuild.
    fn all_changes_require_rebuild(&self) -> bool {
        self.chained_capability(Capabilities::ALL_CHANGES_REQUIRE_REBUILD)
    }

    /// Whether render state depends on selection.
    fn is_selection_sensitive(&self) -> bool {
        self.chained_capability(Capabilities::SELECTION_SENSITIVE)
    }

    /// Whether the chain produces filled area geometry.
    fn computes_fill_geometry(&self) -> bool {
        self.chained_capability(Capabilities::COMPUTES_FILL_GEOMETRY)
    }

    /// Whether the chain can draw labels.
    fn supports_labels(&self) -> bool {
        self.chained_capability(Capabilities::SUPPORTS_LABELS)
    }

    /// Builds the error reported for an over-long chain.
    fn chain_error(&self) -> StyleError {
        StyleError::ChainCycleDetected {
            style: self.chain_name().to_owned(),
            limit: self.chain_limit(),
        }
    }
}
