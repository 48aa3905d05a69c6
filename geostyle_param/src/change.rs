// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change sets and change events.

use crate::parameter::ParameterValue;

/// The parameters that changed between two snapshots of one style, keyed by key.
///
/// Holds the *new* value of every changed parameter. Entries are kept sorted by
/// key, the same sorted-vector layout the store uses for snapshots.
///
/// # Example
///
/// ```rust
/// use geostyle_param::{ChangeSet, ParamValue, ParameterValue};
///
/// let old = vec![
///     ParameterValue::new("a", "A", ParamValue::Int(1)),
///     ParameterValue::new("b", "B", ParamValue::Int(2)),
/// ];
/// let new = vec![
///     ParameterValue::new("a", "A", ParamValue::Int(1)),
///     ParameterValue::new("b", "B", ParamValue::Int(3)),
/// ];
///
/// let changes = ChangeSet::between(&old, &new);
/// assert_eq!(changes.len(), 1);
/// assert_eq!(changes.get("b").map(|p| p.value()), Some(&ParamValue::Int(3)));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeSet {
    entries: Vec<ParameterValue>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Diffs two snapshots.
    ///
    /// A parameter is reported when its value differs or when it only exists in
    /// `new`. Parameters that only exist in `old` are not reported.
    #[must_use]
    pub fn between(old: &[ParameterValue], new: &[ParameterValue]) -> Self {
        let mut changes = Self::new();
        for candidate in new {
            let unchanged = old
                .iter()
                .find(|p| p.key() == candidate.key())
                .is_some_and(|p| p.value() == candidate.value());
            if !unchanged {
                changes.insert(candidate.clone());
            }
        }
        changes
    }

    #[inline]
    fn find(&self, key: &str) -> Result<usize, usize> {
        self.entries.binary_search_by(|p| p.key().cmp(key))
    }

    /// Records `value` as changed, replacing an earlier entry for the same key.
    pub fn insert(&mut self, value: ParameterValue) {
        match self.find(value.key()) {
            Ok(idx) => self.entries[idx] = value,
            Err(idx) => self.entries.insert(idx, value),
        }
    }

    /// Returns the new value for `key`, if it changed.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.find(key).ok().map(|idx| &self.entries[idx])
    }

    /// Returns `true` if `key` changed.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_ok()
    }

    /// Returns the number of changed parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the changed parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterValue> + '_ {
        self.entries.iter()
    }

    /// Iterates over the changed keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(ParameterValue::key)
    }

    /// Returns `true` if any changed parameter is flagged as requiring a rebuild.
    #[must_use]
    pub fn any_rebuild_required(&self) -> bool {
        self.entries.iter().any(ParameterValue::rebuild_required)
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ParameterValue;
    type IntoIter = core::slice::Iter<'a, ParameterValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Where a mutation came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChangeSource {
    /// An interactive edit.
    Editor,
    /// A programmatic change by the embedder.
    Api,
    /// Silent bulk update (e.g. restoring saved values); no notification is sent.
    NoEvent,
}

/// Identifies the store that produced a [`ChangeEvent`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(pub u64);

/// A batch of changes delivered to listeners.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    /// The store the changes were applied to.
    pub store: StoreId,
    /// The source passed to the mutation.
    pub source: ChangeSource,
    /// Every parameter that changed in the mutation.
    pub changes: ChangeSet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParamFlags;
    use crate::value::ParamValue;

    fn p(key: &str, v: i64) -> ParameterValue {
        ParameterValue::new(key, key, ParamValue::Int(v))
    }

    #[test]
    fn insert_keeps_sorted_and_replaces() {
        let mut set = ChangeSet::new();
        set.insert(p("c", 1));
        set.insert(p("a", 1));
        set.insert(p("b", 1));
        set.insert(p("a", 2));

        let keys: Vec<_> = set.keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(set.get("a").unwrap().value(), &ParamValue::Int(2));
    }

    #[test]
    fn between_reports_new_keys_only_from_new_side() {
        let old = [p("a", 1), p("gone", 1)];
        let new = [p("a", 1), p("fresh", 7)];
        let set = ChangeSet::between(&old, &new);
        assert!(set.contains("fresh"));
        assert!(!set.contains("gone"));
        assert!(!set.contains("a"));
    }

    #[test]
    fn rebuild_flag_is_reported() {
        let mut set = ChangeSet::new();
        set.insert(p("a", 1));
        assert!(!set.any_rebuild_required());
        set.insert(p("b", 1).with_flags(ParamFlags::REBUILD_REQUIRED));
        assert!(set.any_rebuild_required());
    }
}
