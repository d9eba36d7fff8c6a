// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy View: view identity, registries, and view-state persistence.
//!
//! The synchronization core tracks *entities*; rendering code tracks *views*
//! of those entities. This crate holds the explicit plumbing between the two:
//!
//! - [`ViewKey`]: one view instance per (entity, view context) — the same
//!   model can be shown in two panels at once, each with independent state.
//! - [`ViewRegistry`]: the owned "find the view for this model" map. It is a
//!   plain object owned by the root view and passed to whoever needs lookup;
//!   there is no process-wide registry.
//! - [`FactoryRegistry`]: maps a [`TypeTag`] to a view factory, with an
//!   explicit ordered fallback chain of candidate tags standing in for
//!   base-class/interface walks.
//! - [`Capabilities`] and [`select_variant`]: view selection as a pure
//!   function over a capability descriptor rather than type tests.
//! - [`ViewStateMap`]: simple key/list persistence for per-view state
//!   (pan/zoom, collapsed sections). The encoding is private to the process.
//!
//! ## Quick Start
//!
//! ```rust
//! use canopy_state::EntityId;
//! use canopy_view::{ViewContext, ViewId, ViewKey, ViewRegistry};
//!
//! const CANVAS: ViewContext = ViewContext::new(0);
//! const INSPECTOR: ViewContext = ViewContext::new(1);
//!
//! let model = EntityId::from_raw(7);
//! let mut registry = ViewRegistry::new();
//! registry.register(ViewKey::new(model, CANVAS), ViewId::from_raw(100));
//!
//! assert!(registry.get(ViewKey::new(model, CANVAS)).is_some());
//! // The same model has no inspector view yet.
//! assert!(registry.get(ViewKey::new(model, INSPECTOR)).is_none());
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod caps;
mod factory;
mod key;
mod persist;
mod registry;

pub use caps::{Capabilities, ViewVariant, select_variant};
pub use factory::{FactoryRegistry, RegisterError, TypeTag};
pub use key::{ViewContext, ViewId, ViewKey};
pub use persist::{DecodeError, ViewStateMap};
pub use registry::ViewRegistry;
