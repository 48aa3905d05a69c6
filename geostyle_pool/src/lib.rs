// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geostyle Pool: interning for render state.
//!
//! Rendering millions of features with a handful of styles produces the same
//! few render states over and over. This crate provides:
//!
//! - [`RenderPropertyPool`]: a thread-safe interner mapping every distinct
//!   value to one shared [`Arc`](std::sync::Arc).
//! - [`RenderState`] / [`RenderShape`]: the render-state variants consumed by
//!   the rendering host (point, line, fill, icon, tile).
//!
//! The pool is scoped to a rendering session: it never evicts on its own and
//! is only emptied by [`RenderPropertyPool::clear`] when the session resets.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use geostyle_pool::{Px, RenderPropertyPool, RenderShape, RenderState, Rgba8};
//!
//! let pool = RenderPropertyPool::new();
//! let white = Rgba8 { r: 255, g: 255, b: 255, a: 255 };
//!
//! let first = pool.intern(RenderState::new(RenderShape::Tile { opacity: 200, z_order: -1 }));
//! let second = pool.intern(RenderState::new(RenderShape::Tile { opacity: 200, z_order: -1 }));
//! let point = pool.intern(RenderState::new(RenderShape::Point {
//!     color: white,
//!     size: Px::new(3.0),
//!     z_order: 0,
//! }));
//!
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(pool.len(), 2);
//! assert_eq!(point.shape().kind_name(), "point");
//! ```

mod pool;
mod render_state;

pub use pool::{PoolStats, RenderPropertyPool};
pub use render_state::{Px, RenderShape, RenderState, ZOrder};

/// Re-exported color type used by [`RenderShape`].
pub use peniko::color::Rgba8;
