// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feature styles.
//!
//! This module provides [`Style`], one configured instance of a [`StyleKind`]
//! with its own [`ParameterStore`], and [`StyleBuilder`] for creating and
//! copying styles.

use std::fmt;
use std::sync::Arc;

use geostyle_geo::clamp_rim_fade;
use geostyle_param::{
    ChangeEvent, ChangeSet, ChangeSource, ListenerId, NotificationQueue, ParamError, ParamValue,
    ParameterStore, ParameterValue, StoreId,
};

use crate::capability::{Capabilities, StyleKind, keys};
use crate::chain::{DEFAULT_MAX_CHAIN_DEPTH, StyleChain};
use crate::error::StyleError;

/// A configured style.
///
/// Parameters live in the style's own store and are edited through
/// [`set`](Self::set) and [`set_many`](Self::set_many). The predecessor is
/// fixed at build time; to change it, derive a new style with
/// [`StyleBuilder::derive_from`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use geostyle_param::{ChangeSource, NotificationQueue, ParamValue};
/// use geostyle_style::{StyleBuilder, StyleChain, StyleKind, keys};
///
/// let queue = Arc::new(NotificationQueue::spawn("geostyle-notify").unwrap());
/// let points = StyleBuilder::new("points", StyleKind::Point)
///     .data_type_key("contacts")
///     .set(keys::POINT_SIZE, ParamValue::Float(6.0))
///     .build(Arc::clone(&queue))
///     .unwrap();
///
/// assert!(points.is_selection_sensitive());
/// assert_eq!(points.value(keys::POINT_SIZE).unwrap(), Some(ParamValue::Float(6.0)));
/// assert!(points.set(keys::POINT_SIZE, ParamValue::Int(8), ChangeSource::Api).unwrap());
/// ```
pub struct Style {
    name: Arc<str>,
    kind: StyleKind,
    data_type_key: Arc<str>,
    capabilities: Capabilities,
    params: ParameterStore,
    previous: Option<Arc<Self>>,
    max_chain_depth: usize,
}

impl Style {
    /// Returns the style's name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the style's kind.
    #[must_use]
    #[inline]
    pub fn kind(&self) -> StyleKind {
        self.kind
    }

    /// Returns the key of the data type this style draws.
    #[must_use]
    #[inline]
    pub fn data_type_key(&self) -> &str {
        &self.data_type_key
    }

    /// Returns the local parameter store.
    #[must_use]
    #[inline]
    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    /// Returns the identity of the local store.
    #[must_use]
    #[inline]
    pub fn id(&self) -> StoreId {
        self.params.id()
    }

    /// Returns the predecessor, shared.
    #[must_use]
    pub fn previous_style(&self) -> Option<&Arc<Self>> {
        self.previous.as_ref()
    }

    /// Resolves `key` through the chain.
    pub fn value(&self, key: &str) -> Result<Option<ParamValue>, StyleError> {
        self.resolve_value(key)
    }

    /// Sets a local parameter; `true` if the value changed.
    pub fn set(&self, key: &str, raw: ParamValue, source: ChangeSource) -> Result<bool, StyleError> {
        Ok(self.params.set(key, raw, source)?)
    }

    /// Sets several local parameters with a single notification.
    pub fn set_many<I, K>(&self, values: I, source: ChangeSource) -> Result<ChangeSet, StyleError>
    where
        I: IntoIterator<Item = (K, ParamValue)>,
        K: AsRef<str>,
    {
        Ok(self.params.set_values(values, source)?)
    }

    /// Sets the rim fade, clamping to `[0, 255]`.
    pub fn set_rim_fade(&self, raw: i64, source: ChangeSource) -> Result<bool, StyleError> {
        self.set(
            keys::RIM_FADE,
            ParamValue::Int(i64::from(clamp_rim_fade(raw))),
            source,
        )
    }

    /// Registers a listener for changes to the local parameters.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.params.subscribe(listener)
    }

    /// Removes a listener.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.params.unsubscribe(id)
    }

    fn chain_contains(&self, id: StoreId) -> Result<bool, StyleError> {
        let mut current = self;
        let mut links = 0;
        loop {
            if current.id() == id {
                return Ok(true);
            }
            let Some(previous) = current.previous() else {
                return Ok(false);
            };
            links += 1;
            if links > self.max_chain_depth {
                return Err(self.chain_error());
            }
            current = previous;
        }
    }
}

impl StyleChain for Style {
    fn chain_name(&self) -> &str {
        &self.name
    }

    fn previous(&self) -> Option<&Self> {
        self.previous.as_deref()
    }

    fn local_capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn local_value(&self, key: &str) -> Option<ParamValue> {
        self.params.value(key)
    }

    fn chain_limit(&self) -> usize {
        self.max_chain_depth
    }
}

impl fmt::Debug for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Style")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("data_type_key", &self.data_type_key)
            .field("capabilities", &self.capabilities)
            .field("params", &self.params)
            .field("previous", &self.previous.as_ref().map(|p| p.name()))
            .field("max_chain_depth", &self.max_chain_depth)
            .finish()
    }
}

/// Builder for [`Style`] instances.
///
/// A fresh builder starts from the kind's default parameters and
/// capabilities. [`derive_from`](Self::derive_from) starts from an existing
/// style instead, copying its current values and sharing its predecessor.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use geostyle_param::{NotificationQueue, ParamValue};
/// use geostyle_style::{Capabilities, StyleBuilder, StyleChain, StyleKind, keys};
///
/// let queue = Arc::new(NotificationQueue::spawn("geostyle-notify").unwrap());
/// let base = Arc::new(
///     StyleBuilder::new("base", StyleKind::Tile)
///         .capabilities(Capabilities::SUPPORTS_LABELS)
///         .build(Arc::clone(&queue))
///         .unwrap(),
/// );
/// let tiles = StyleBuilder::new("tiles", StyleKind::Tile)
///     .previous(Arc::clone(&base))
///     .unwrap()
///     .build(Arc::clone(&queue))
///     .unwrap();
/// assert!(tiles.supports_labels());
///
/// let copy = StyleBuilder::derive_from(&tiles)
///     .set(keys::OPACITY, ParamValue::Int(128))
///     .build(queue)
///     .unwrap();
/// assert!(Arc::ptr_eq(copy.previous_style().unwrap(), &base));
/// assert_eq!(tiles.value(keys::OPACITY).unwrap(), Some(ParamValue::Int(255)));
/// ```
#[derive(Debug)]
pub struct StyleBuilder {
    name: Arc<str>,
    kind: StyleKind,
    data_type_key: Arc<str>,
    capabilities: Capabilities,
    params: Vec<ParameterValue>,
    overrides: Vec<(String, ParamValue)>,
    previous: Option<Arc<Style>>,
    origin: Option<StoreId>,
    max_chain_depth: usize,
}

impl StyleBuilder {
    /// Starts a style of `kind` with the kind's defaults.
    #[must_use]
    pub fn new(name: &str, kind: StyleKind) -> Self {
        Self {
            name: Arc::from(name),
            kind,
            data_type_key: Arc::from(""),
            capabilities: kind.capabilities(),
            params: kind.default_parameters(),
            overrides: Vec::new(),
            previous: None,
            origin: None,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
        }
    }

    /// Starts a copy of `style`.
    ///
    /// Parameter values are copied; the predecessor is shared. Listeners are
    /// not copied.
    #[must_use]
    pub fn derive_from(style: &Style) -> Self {
        Self {
            name: Arc::clone(&style.name),
            kind: style.kind,
            data_type_key: Arc::clone(&style.data_type_key),
            capabilities: style.capabilities,
            params: style.params.snapshot(),
            overrides: Vec::new(),
            previous: style.previous.clone(),
            origin: Some(style.id()),
            max_chain_depth: style.max_chain_depth,
        }
    }

    /// Renames the style.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Arc::from(name);
        self
    }

    /// Sets the key of the data type this style draws.
    #[must_use]
    pub fn data_type_key(mut self, key: &str) -> Self {
        self.data_type_key = Arc::from(key);
        self
    }

    /// Adds local capabilities on top of the kind's.
    #[must_use]
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities |= capabilities;
        self
    }

    /// Adds or replaces a parameter definition.
    #[must_use]
    pub fn define(mut self, parameter: ParameterValue) -> Self {
        match self.params.iter_mut().find(|p| p.key() == parameter.key()) {
            Some(existing) => *existing = parameter,
            None => self.params.push(parameter),
        }
        self
    }

    /// Overrides the value of a defined parameter.
    ///
    /// The value is validated by [`build`](Self::build).
    #[must_use]
    pub fn set(mut self, key: &str, value: ParamValue) -> Self {
        self.overrides.push((key.to_owned(), value));
        self
    }

    /// Limits how many predecessor links a chain walk may follow.
    #[must_use]
    pub fn max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }

    /// Attaches a predecessor.
    ///
    /// Fails with [`StyleError::ChainCycleDetected`] if this builder was
    /// derived from a style that already appears in `previous`'s chain, or if
    /// that chain is over the depth limit.
    pub fn previous(mut self, previous: Arc<Style>) -> Result<Self, StyleError> {
        let cyclic = match self.origin {
            Some(origin) => previous.chain_contains(origin)?,
            None => previous.depth().map(|_| false)?,
        };
        if cyclic {
            return Err(StyleError::ChainCycleDetected {
                style: self.name.to_string(),
                limit: self.max_chain_depth,
            });
        }
        self.previous = Some(previous);
        Ok(self)
    }

    /// Detaches the predecessor.
    #[must_use]
    pub fn no_previous(mut self) -> Self {
        self.previous = None;
        self
    }

    /// Builds the style, delivering its notifications on `queue`.
    ///
    /// Fails if an override names an undefined parameter or has the wrong type.
    pub fn build(self, queue: Arc<NotificationQueue>) -> Result<Style, StyleError> {
        let mut params = self.params;
        for (key, raw) in self.overrides {
            let slot = params
                .iter_mut()
                .find(|p| p.key() == key)
                .ok_or_else(|| ParamError::NoSuchParameter(key.clone()))?;
            *slot = slot.with_value(raw)?;
        }

        let store = ParameterStore::new(queue);
        for parameter in params {
            store.define(parameter);
        }
        let style = Style {
            name: self.name,
            kind: self.kind,
            data_type_key: self.data_type_key,
            capabilities: self.capabilities,
            params: store,
            previous: self.previous,
            max_chain_depth: self.max_chain_depth,
        };
        // The chain was checked when attached, but the limit may have changed since.
        style.depth()?;
        tracing::debug!(
            style = style.name(),
            kind = %style.kind,
            params = style.params.len(),
            chained = style.has_previous(),
            "style built"
        );
        Ok(style)
    }
}
