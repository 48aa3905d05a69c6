// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Installed styles of a rendering session.

use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::HashMap;

use crate::error::StyleError;
use crate::style::Style;

/// Name -> style lookup, scoped to one session.
///
/// There is no process-wide registry; a [`RenderSession`](crate::RenderSession)
/// owns one and hands it out by reference.
#[derive(Debug, Default)]
pub struct StyleRegistry {
    styles: RwLock<HashMap<Arc<str>, Arc<Style>>>,
}

impl StyleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `style` under its name, returning the style it replaced.
    pub fn install(&self, style: Arc<Style>) -> Option<Arc<Style>> {
        let name: Arc<str> = Arc::from(style.name());
        tracing::debug!(style = %name, kind = %style.kind(), "style installed");
        self.styles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, style)
    }

    /// Looks up a style by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Style>> {
        self.styles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Looks up a style by name, failing with [`StyleError::UnknownStyle`].
    pub fn require(&self, name: &str) -> Result<Arc<Style>, StyleError> {
        self.get(name)
            .ok_or_else(|| StyleError::UnknownStyle(name.to_owned()))
    }

    /// Removes a style.
    pub fn remove(&self, name: &str) -> Option<Arc<Style>> {
        self.styles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Returns every style drawing `data_type_key`, sorted by name.
    #[must_use]
    pub fn for_data_type(&self, data_type_key: &str) -> Vec<Arc<Style>> {
        let mut styles: Vec<_> = self
            .styles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| s.data_type_key() == data_type_key)
            .cloned()
            .collect();
        styles.sort_by(|a, b| a.name().cmp(b.name()));
        styles
    }

    /// Returns the number of installed styles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.styles.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if no style is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every style, returning how many there were.
    pub fn clear(&self) -> usize {
        let mut styles = self.styles.write().unwrap_or_else(PoisonError::into_inner);
        let removed = styles.len();
        styles.clear();
        removed
    }
}

#[cfg(test)]
mod tests {
    use geostyle_param::NotificationQueue;

    use super::*;
    use crate::capability::StyleKind;
    use crate::style::StyleBuilder;

    fn style(queue: &Arc<NotificationQueue>, name: &str, data_type: &str) -> Arc<Style> {
        Arc::new(
            StyleBuilder::new(name, StyleKind::Point)
                .data_type_key(data_type)
                .build(Arc::clone(queue))
                .unwrap(),
        )
    }

    #[test]
    fn install_replace_remove() {
        let queue = Arc::new(NotificationQueue::spawn("registry-test").unwrap());
        let registry = StyleRegistry::new();
        assert!(registry.install(style(&queue, "a", "contacts")).is_none());
        let replaced = registry.install(style(&queue, "a", "tracks"));
        assert_eq!(replaced.unwrap().data_type_key(), "contacts");
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.require("a").unwrap().data_type_key(), "tracks");
        assert_eq!(
            registry.require("b").unwrap_err(),
            StyleError::UnknownStyle("b".to_owned())
        );
        assert!(registry.remove("a").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn lookup_by_data_type() {
        let queue = Arc::new(NotificationQueue::spawn("registry-test").unwrap());
        let registry = StyleRegistry::new();
        for (name, data_type) in [("z", "contacts"), ("m", "tracks"), ("a", "contacts")] {
            registry.install(style(&queue, name, data_type));
        }
        let names: Vec<_> = registry
            .for_data_type("contacts")
            .iter()
            .map(|s| s.name().to_owned())
            .collect();
        assert_eq!(names, ["a", "z"]);
        assert_eq!(registry.clear(), 3);
    }
}
