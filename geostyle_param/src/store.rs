// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-style parameter storage.
//!
//! This module provides [`ParameterStore`], the `key -> ParameterValue` mapping
//! owned by exactly one style instance.
//!
//! # Locking
//!
//! Reads take a shared lock on the entry map only. Every mutation first takes
//! the store's writer mutex, so a read-modify-write (`set`, `set_many`) never
//! interleaves with another one, and then the exclusive entry lock just long
//! enough to swap records in. The notification is queued while the writer
//! mutex is still held, which keeps delivery order equal to mutation order.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use hashbrown::HashMap;

use crate::change::{ChangeEvent, ChangeSet, ChangeSource, StoreId};
use crate::error::ParamError;
use crate::notify::{Listener, NotificationQueue};
use crate::parameter::ParameterValue;
use crate::value::ParamValue;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned by [`ParameterStore::subscribe`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// The current parameter values of one style.
///
/// Every key present always maps to a current [`ParameterValue`]. Records are
/// replaced, never mutated.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use geostyle_param::{
///     ChangeSource, NotificationQueue, ParamError, ParamValue, ParameterStore, ParameterValue,
/// };
///
/// let queue = Arc::new(NotificationQueue::spawn("geostyle-notify").unwrap());
/// let store = ParameterStore::new(queue);
/// store.define(ParameterValue::new("line_width", "Line width", ParamValue::Float(1.0)));
///
/// // First change reports `true`, repeating it reports `false`.
/// assert!(store.set("line_width", ParamValue::Float(2.0), ChangeSource::Api).unwrap());
/// assert!(!store.set("line_width", ParamValue::Float(2.0), ChangeSource::Api).unwrap());
///
/// assert!(matches!(
///     store.set("missing", ParamValue::Bool(true), ChangeSource::Api),
///     Err(ParamError::NoSuchParameter(_))
/// ));
/// ```
pub struct ParameterStore {
    id: StoreId,
    entries: RwLock<HashMap<Arc<str>, ParameterValue>>,
    writer: Mutex<()>,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
    queue: Arc<NotificationQueue>,
}

impl ParameterStore {
    /// Creates an empty store delivering notifications on `queue`.
    #[must_use]
    pub fn new(queue: Arc<NotificationQueue>) -> Self {
        Self {
            id: StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed)),
            entries: RwLock::new(HashMap::new()),
            writer: Mutex::new(()),
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            queue,
        }
    }

    /// Returns this store's identifier, as carried by its [`ChangeEvent`]s.
    #[must_use]
    #[inline]
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Returns the queue notifications are delivered on.
    #[must_use]
    pub fn queue(&self) -> &Arc<NotificationQueue> {
        &self.queue
    }

    /// Adds or replaces a parameter definition without notifying anyone.
    ///
    /// This is the initialization path; edits go through [`set`](Self::set).
    pub fn define(&self, parameter: ParameterValue) {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(parameter.shared_key(), parameter);
    }

    /// Gets the current record for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ParameterValue> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Gets the current raw value for `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<ParamValue> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|p| p.value().clone())
    }

    /// Returns `true` if `key` is defined.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Returns the number of defined parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if no parameters are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sets `key` to `raw`.
    ///
    /// Returns `Ok(true)` if the stored value changed. An unchanged value returns
    /// `Ok(false)` and notifies nobody. Nothing is mutated on error.
    pub fn set(&self, key: &str, raw: ParamValue, source: ChangeSource) -> Result<bool, ParamError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self
            .get(key)
            .ok_or_else(|| ParamError::NoSuchParameter(key.to_owned()))?;
        let value = current.prepare(raw)?;
        if &value == current.value() {
            return Ok(false);
        }

        let updated = current.replaced(value);
        let mut changes = ChangeSet::new();
        changes.insert(updated.clone());
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(updated.shared_key(), updated);

        tracing::trace!(store = self.id.0, key, ?source, "parameter changed");
        self.notify(source, changes);
        Ok(true)
    }

    /// Applies a batch of values atomically.
    ///
    /// Each item contributes its key and value. The whole batch is validated
    /// before anything is stored, and exactly one notification carrying every
    /// change is sent.
    pub fn set_many<I>(&self, values: I, source: ChangeSource) -> Result<ChangeSet, ParamError>
    where
        I: IntoIterator<Item = ParameterValue>,
    {
        self.set_values(
            values.into_iter().map(|p| (p.shared_key(), p.value().clone())),
            source,
        )
    }

    /// Applies a batch of `(key, raw value)` pairs atomically.
    ///
    /// Same semantics as [`set_many`](Self::set_many). A later pair for the same key
    /// wins over an earlier one.
    pub fn set_values<I, K>(&self, values: I, source: ChangeSource) -> Result<ChangeSet, ParamError>
    where
        I: IntoIterator<Item = (K, ParamValue)>,
        K: AsRef<str>,
    {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut changes = ChangeSet::new();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            for (key, raw) in values {
                let key = key.as_ref();
                let current = entries
                    .get(key)
                    .ok_or_else(|| ParamError::NoSuchParameter(key.to_owned()))?;
                let value = current.prepare(raw)?;
                changes.insert(current.replaced(value));
            }
        }

        // Drop entries that ended up back at their stored value.
        let changes = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            let mut effective = ChangeSet::new();
            for p in &changes {
                if entries.get(p.key()).is_some_and(|c| c.value() != p.value()) {
                    effective.insert(p.clone());
                }
            }
            effective
        };
        if changes.is_empty() {
            return Ok(changes);
        }

        {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            for p in &changes {
                entries.insert(p.shared_key(), p.clone());
            }
        }

        tracing::trace!(store = self.id.0, count = changes.len(), ?source, "parameters changed");
        self.notify(source, changes.clone());
        Ok(changes)
    }

    /// Returns a copy of every current record, sorted by key.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ParameterValue> {
        let mut values: Vec<_> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        values.sort_by(|a, b| a.key().cmp(b.key()));
        values
    }

    /// Copies the current values into a new, independent store.
    ///
    /// Listeners are not copied.
    #[must_use]
    pub fn deep_copy(&self, queue: Arc<NotificationQueue>) -> Self {
        let copy = Self::new(queue);
        for parameter in self.snapshot() {
            copy.define(parameter);
        }
        copy
    }

    /// Registers a listener for this store's change events.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener.
    ///
    /// Returns `true` if it was registered. Events already queued may still reach it.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    fn notify(&self, source: ChangeSource, changes: ChangeSet) {
        if source == ChangeSource::NoEvent {
            return;
        }
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        self.queue.submit(
            listeners,
            ChangeEvent {
                store: self.id,
                source,
                changes,
            },
        );
    }
}

impl fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStore")
            .field("id", &self.id)
            .field("len", &self.len())
            .field("queue", &self.queue.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParamFlags;
    use crate::value::TypeTag;

    fn store() -> ParameterStore {
        let queue = Arc::new(NotificationQueue::spawn("store-tests").unwrap());
        let store = ParameterStore::new(queue);
        store.define(ParameterValue::new("size", "Size", ParamValue::Float(1.0)));
        store.define(
            ParameterValue::new("lift", "Lift", ParamValue::Float(0.0))
                .with_flags(ParamFlags::REBUILD_REQUIRED),
        );
        store.define(ParameterValue::new("labels", "Labels", ParamValue::Bool(false)));
        store
    }

    #[test]
    fn define_and_get() {
        let s = store();
        assert_eq!(s.len(), 3);
        assert_eq!(s.value("size"), Some(ParamValue::Float(1.0)));
        assert!(s.get("missing").is_none());
    }

    #[test]
    fn set_widens_int_to_float() {
        let s = store();
        assert!(s.set("size", ParamValue::Int(4), ChangeSource::Api).unwrap());
        assert_eq!(s.value("size"), Some(ParamValue::Float(4.0)));
    }

    #[test]
    fn set_type_mismatch_leaves_value() {
        let s = store();
        let err = s.set("labels", ParamValue::Int(1), ChangeSource::Api).unwrap_err();
        assert_eq!(
            err,
            ParamError::TypeMismatch {
                key: "labels".into(),
                expected: TypeTag::Bool,
                found: TypeTag::Int,
            }
        );
        assert_eq!(s.value("labels"), Some(ParamValue::Bool(false)));
    }

    #[test]
    fn set_many_is_all_or_nothing() {
        let s = store();
        let err = s
            .set_values(
                [("size", ParamValue::Float(9.0)), ("nope", ParamValue::Bool(true))],
                ChangeSource::Api,
            )
            .unwrap_err();
        assert_eq!(err, ParamError::NoSuchParameter("nope".into()));
        assert_eq!(s.value("size"), Some(ParamValue::Float(1.0)));
    }

    #[test]
    fn set_many_reports_only_effective_changes() {
        let s = store();
        let changes = s
            .set_values(
                [
                    ("size", ParamValue::Float(1.0)),
                    ("lift", ParamValue::Float(3.0)),
                    ("labels", ParamValue::Bool(true)),
                    ("labels", ParamValue::Bool(false)),
                ],
                ChangeSource::Api,
            )
            .unwrap();
        let keys: Vec<_> = changes.keys().collect();
        assert_eq!(keys, ["lift"]);
        assert!(changes.any_rebuild_required());
    }

    #[test]
    fn snapshot_is_sorted() {
        let s = store();
        let keys: Vec<_> = s.snapshot().iter().map(|p| p.key().to_owned()).collect();
        assert_eq!(keys, ["labels", "lift", "size"]);
    }

    #[test]
    fn deep_copy_is_independent() {
        let s = store();
        let copy = s.deep_copy(Arc::clone(s.queue()));
        assert_ne!(copy.id(), s.id());
        copy.set("size", ParamValue::Float(7.0), ChangeSource::Api).unwrap();
        assert_eq!(s.value("size"), Some(ParamValue::Float(1.0)));
        assert_eq!(copy.value("size"), Some(ParamValue::Float(7.0)));
    }

    #[test]
    fn unsubscribe() {
        let s = store();
        let id = s.subscribe(|_| {});
        assert!(s.unsubscribe(id));
        assert!(!s.unsubscribe(id));
    }
}
