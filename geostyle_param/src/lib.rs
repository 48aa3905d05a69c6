// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geostyle Param: typed style parameters.
//!
//! This crate provides the storage layer for feature styles: immutable
//! parameter records, a per-style store with compare-and-set semantics, and
//! asynchronous change notification. Style chaining and render-state
//! derivation are provided by `geostyle_style`.
//!
//! ## Core Concepts
//!
//! ### Parameter records
//!
//! [`ParameterValue`] is an immutable `(key, display name, value, declared type,
//! flags)` record. [`ParamFlags`] say how a change propagates:
//!
//! - **`REBUILD_REQUIRED`** - geometry must be rebuilt from scratch
//! - **`COLOR_OPACITY_ONLY`** - only the alpha channel of a color matters
//! - **`SAVE_ALWAYS`** - persist even when equal to the default
//!
//! ### Stores
//!
//! [`ParameterStore`] maps keys to records for one style instance:
//!
//! - `get(key)` - shared-lock lookup
//! - `set(key, value, source)` - compare-and-set, `true` if changed
//! - `set_many(values, source)` - validated batch, one notification
//! - `snapshot()` - a copy safe to hand to another thread
//!
//! ### Notifications
//!
//! Listeners registered with [`ParameterStore::subscribe`] receive a
//! [`ChangeEvent`] on the store's [`NotificationQueue`] worker, never on the
//! mutating thread. [`ChangeSource::NoEvent`] suppresses delivery.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use geostyle_param::{
//!     ChangeSource, NotificationQueue, ParamFlags, ParamValue, ParameterStore, ParameterValue,
//! };
//!
//! let queue = Arc::new(NotificationQueue::spawn("geostyle-notify").unwrap());
//! let store = ParameterStore::new(queue);
//! store.define(
//!     ParameterValue::new("lift", "Lift (m)", ParamValue::Float(0.0))
//!         .with_flags(ParamFlags::REBUILD_REQUIRED),
//! );
//! store.define(ParameterValue::new("point_size", "Point size", ParamValue::Float(4.0)));
//!
//! let changes = store
//!     .set_values(
//!         [("lift", ParamValue::Float(5.0)), ("point_size", ParamValue::Float(4.0))],
//!         ChangeSource::Editor,
//!     )
//!     .unwrap();
//!
//! // Only the lift actually changed.
//! assert_eq!(changes.len(), 1);
//! assert!(changes.any_rebuild_required());
//! ```

mod change;
mod error;
mod notify;
mod parameter;
mod store;
mod value;

pub use change::{ChangeEvent, ChangeSet, ChangeSource, StoreId};
pub use error::ParamError;
pub use notify::{Listener, NotificationQueue};
pub use parameter::{CoerceFn, ParamFlags, ParameterValue};
pub use store::{ListenerId, ParameterStore};
pub use value::{ParamValue, TypeTag};

/// Re-exported color type used by [`ParamValue::Color`].
pub use peniko::color::Rgba8;
