// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geostyle Style: chained feature styles and render-state derivation.
//!
//! This crate ties the parameter stores of `geostyle_param`, the interning
//! pool of `geostyle_pool` and the placement math of `geostyle_geo` together.
//!
//! ## Core Concepts
//!
//! ### Styles and chains
//!
//! A [`Style`] is a [`StyleKind`] plus [`Capabilities`] plus its own
//! parameter store, and optionally a predecessor. [`StyleChain`] provides the
//! walks over predecessors: values are "nearest wins" while capability queries
//! OR along the chain.
//!
//! ### Construction
//!
//! [`construct`] turns a feature into a [`GeometryRequest`] for the host's
//! [`GeometryFactory`], interning its render state on the way.
//! [`construct_batch`] does the same for many features and skips the ones
//! that fail.
//!
//! ### Derivation
//!
//! When parameters change, [`derive`] decides whether existing render state
//! survives ([`Derivation::NoChange`]), can be patched
//! ([`Derivation::PatchInPlace`]), or must be rebuilt
//! ([`Derivation::RebuildRequired`]).
//!
//! ### Sessions
//!
//! A [`RenderSession`] owns the pool, the [`StyleRegistry`] and the
//! notification worker, configured by an [`EngineConfig`].
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use geostyle_param::{ChangeSource, ParamValue};
//! use geostyle_style::{
//!     CollectionDescriptor, Derivation, EngineConfig, FeatureContext, FeatureLocation,
//!     RenderSession, StyleKind, build_render_state, derive, keys,
//! };
//!
//! let session = RenderSession::new(EngineConfig::default()).unwrap();
//! let style = session
//!     .install(session.style_builder("contacts", StyleKind::Point).data_type_key("contacts"))
//!     .unwrap();
//!
//! let feature = FeatureContext::new(
//!     42,
//!     FeatureLocation::new(51.5, -0.12),
//!     Arc::new(CollectionDescriptor::new("contacts")),
//! );
//! let existing = session.pool().intern(build_render_state(&style, &feature).unwrap());
//!
//! let changes = style
//!     .set_many([(keys::POINT_SIZE, ParamValue::Float(8.0))], ChangeSource::Editor)
//!     .unwrap();
//! let outcome = derive(&style, &changes, &existing, &feature, session.pool()).unwrap();
//! assert!(matches!(outcome, Derivation::PatchInPlace(_)));
//! ```

pub mod capability;
pub mod chain;
pub mod construct;
pub mod derive;
pub mod error;
pub mod feature;
pub mod registry;
pub mod session;
pub mod style;

pub use capability::{Capabilities, StyleKind, keys};
pub use chain::{DEFAULT_MAX_CHAIN_DEPTH, StyleChain};
pub use construct::{
    BatchReport, Footprint, GeometryFactory, GeometryRequest, StyleValues, build_render_state,
    construct, construct_batch,
};
pub use derive::{Derivation, RebuildReason, derive};
pub use error::{MetadataError, StyleError};
pub use feature::{
    CollectionDescriptor, ColumnSpec, FeatureContext, FeatureLocation, MetadataAccessor,
    MetadataValue, NoMetadata, numeric_metadata,
};
pub use registry::StyleRegistry;
pub use session::{EngineConfig, RenderSession};
pub use style::{Style, StyleBuilder};
