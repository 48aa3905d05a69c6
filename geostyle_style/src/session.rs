// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering sessions and their configuration.

use std::sync::Arc;

use geostyle_param::NotificationQueue;
use geostyle_pool::{PoolStats, RenderPropertyPool, RenderState};
use serde::{Deserialize, Serialize};

use crate::capability::StyleKind;
use crate::chain::DEFAULT_MAX_CHAIN_DEPTH;
use crate::error::StyleError;
use crate::registry::StyleRegistry;
use crate::style::{Style, StyleBuilder};

/// Engine configuration.
///
/// Every field has a default, so `{}` is a valid configuration.
///
/// # Example
///
/// ```rust
/// use geostyle_style::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "max_chain_depth": 8 }"#).unwrap();
/// assert_eq!(config.max_chain_depth, 8);
/// assert_eq!(config.notifier_thread_name, "geostyle-notify");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum number of predecessor links a chain walk may follow.
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,

    /// Name of the notification worker thread.
    #[serde(default = "default_notifier_thread_name")]
    pub notifier_thread_name: String,

    /// Initial capacity of the render property pool.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
}

fn default_max_chain_depth() -> usize {
    DEFAULT_MAX_CHAIN_DEPTH
}
fn default_notifier_thread_name() -> String {
    "geostyle-notify".to_owned()
}
fn default_pool_capacity() -> usize {
    1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: default_max_chain_depth(),
            notifier_thread_name: default_notifier_thread_name(),
            pool_capacity: default_pool_capacity(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, StyleError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| StyleError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every field is in range.
    pub fn validate(&self) -> Result<(), StyleError> {
        if self.max_chain_depth == 0 {
            return Err(StyleError::InvalidConfig(
                "max_chain_depth must be at least 1".to_owned(),
            ));
        }
        if self.notifier_thread_name.trim().is_empty() {
            return Err(StyleError::InvalidConfig(
                "notifier_thread_name must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Everything one rendering session shares: the render property pool, the
/// installed styles, and the notification worker.
///
/// # Example
///
/// ```rust
/// use geostyle_style::{EngineConfig, RenderSession, StyleKind};
///
/// let session = RenderSession::new(EngineConfig::default()).unwrap();
/// let style = session.install(session.style_builder("points", StyleKind::Point)).unwrap();
/// assert_eq!(session.registry().get("points").unwrap().name(), style.name());
///
/// session.reset();
/// assert!(session.registry().is_empty());
/// ```
#[derive(Debug)]
pub struct RenderSession {
    config: EngineConfig,
    pool: RenderPropertyPool<RenderState>,
    registry: StyleRegistry,
    queue: Arc<NotificationQueue>,
}

impl RenderSession {
    /// Starts a session, spawning its notification worker.
    pub fn new(config: EngineConfig) -> Result<Self, StyleError> {
        config.validate()?;
        let queue = NotificationQueue::spawn(&config.notifier_thread_name).map_err(|e| {
            StyleError::InvalidConfig(format!(
                "cannot start notifier thread '{}': {e}",
                config.notifier_thread_name
            ))
        })?;
        tracing::debug!(
            max_chain_depth = config.max_chain_depth,
            pool_capacity = config.pool_capacity,
            "render session started"
        );
        Ok(Self {
            pool: RenderPropertyPool::with_capacity(config.pool_capacity),
            registry: StyleRegistry::new(),
            queue: Arc::new(queue),
            config,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the render property pool.
    #[must_use]
    pub fn pool(&self) -> &RenderPropertyPool<RenderState> {
        &self.pool
    }

    /// Returns the installed styles.
    #[must_use]
    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    /// Returns the notification queue styles of this session deliver on.
    #[must_use]
    pub fn queue(&self) -> &Arc<NotificationQueue> {
        &self.queue
    }

    /// Starts a style builder configured for this session.
    #[must_use]
    pub fn style_builder(&self, name: &str, kind: StyleKind) -> StyleBuilder {
        StyleBuilder::new(name, kind).max_chain_depth(self.config.max_chain_depth)
    }

    /// Builds a style on this session's queue and installs it.
    pub fn install(&self, builder: StyleBuilder) -> Result<Arc<Style>, StyleError> {
        let style = Arc::new(builder.build(Arc::clone(&self.queue))?);
        self.registry.install(Arc::clone(&style));
        Ok(style)
    }

    /// Clears the pool and the registry.
    ///
    /// Render state and styles already handed out stay valid.
    pub fn reset(&self) -> PoolStats {
        let stats = self.pool.stats();
        self.pool.clear();
        let styles = self.registry.clear();
        tracing::debug!(
            entries = stats.entries,
            hits = stats.hits,
            misses = stats.misses,
            styles,
            "render session reset"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn bad_configs_are_rejected() {
        for json in [
            r#"{ "max_chain_depth": 0 }"#,
            r#"{ "notifier_thread_name": " " }"#,
            r#"{ "max_chain_depth": "deep" }"#,
            r#"{ "pool_size": 3 }"#,
        ] {
            assert!(
                matches!(EngineConfig::from_json(json), Err(StyleError::InvalidConfig(_))),
                "{json}"
            );
        }
    }

    #[test]
    fn session_builders_carry_chain_limit() {
        let config = EngineConfig {
            max_chain_depth: 1,
            ..EngineConfig::default()
        };
        let session = RenderSession::new(config).unwrap();
        let a = session.install(session.style_builder("a", StyleKind::Tile)).unwrap();
        let b = session
            .install(session.style_builder("b", StyleKind::Tile).previous(a).unwrap())
            .unwrap();
        let c = session.style_builder("c", StyleKind::Tile).previous(b).unwrap();
        assert!(matches!(
            session.install(c),
            Err(StyleError::ChainCycleDetected { limit: 1, .. })
        ));
        assert_eq!(session.registry().len(), 2);
    }

    #[test]
    fn reset_reports_pool_stats() {
        use geostyle_pool::RenderShape;

        let session = RenderSession::new(EngineConfig::default()).unwrap();
        let tile = RenderState::new(RenderShape::Tile {
            opacity: 10,
            z_order: 0,
        });
        session.pool().intern(tile.clone());
        session.pool().intern(tile);
        let stats = session.reset();
        assert_eq!((stats.entries, stats.hits, stats.misses), (1, 1, 1));
        assert!(session.pool().is_empty());
    }
}
