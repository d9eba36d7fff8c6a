// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Cull: incremental visibility for node-graph canvases.
//!
//! Thousands of elements move, appear, and disappear across frames; only a
//! fraction are on screen. This crate keeps the on-screen set current without
//! per-frame full scans, as a consumer of the `canopy_state` /
//! `canopy_observe` synchronization core:
//!
//! - [`CullSource`] / [`CullSourceSet`]: independent reasons an element is
//!   hidden. "Outside the viewport" and "zoom too far out" can both apply at
//!   once and must clear independently — a single boolean would reveal an
//!   element as soon as *one* reason cleared.
//! - [`VisibilityMap`]: the per-element state machine: visible iff no source
//!   applies.
//! - [`CullOps`]: the cull/reveal changeset payload, with per-source
//!   cancellation under aggregation.
//! - [`Scene`], [`Space`], [`Camera`]: the pipeline's container values —
//!   elements with bounds, per-partition spatial indices, and the viewport.
//! - [`pipeline`]: the observers wiring scene → space → cull → visibility,
//!   including the budgeted reveal that bounds per-tick work.
//!
//! ## The pipeline at a glance
//!
//! External commands mutate the scene container; once per tick the observer
//! engine runs:
//!
//! 1. [`pipeline::IndexSync`] applies the scene delta to the per-partition
//!    spatial indices.
//! 2. [`pipeline::ViewportCuller`] diffs the in-view set against the
//!    previous frame and records cull/reveal ops per source.
//! 3. [`pipeline::VisibilityApplier`] applies the ops to the effective
//!    [`VisibilityMap`], revealing at most a budget's worth per tick and
//!    deferring the remainder into the next tick's changeset.
//!
//! Rendering then asks [`VisibilityMap::is_culled`] and
//! [`Space::query_region`](crate::Space::query_region) and touches nothing
//! else.

#![no_std]

extern crate alloc;

mod ops;
pub mod pipeline;
mod scene;
mod source;
mod visibility;

pub use ops::CullOps;
pub use scene::{Camera, Element, PartitionId, Scene, Space};
pub use source::{CullSource, CullSourceSet, CullSourceSetIter};
pub use visibility::VisibilityMap;

/// Change-reason hints used by the spatial pipeline.
pub mod hints {
    use canopy_state::Hint;

    /// Bounds or partition changed.
    pub const GEOMETRY: Hint = Hint::new(1);
    /// Detail classification changed.
    pub const DETAIL: Hint = Hint::new(2);
    /// Effective visibility flipped.
    pub const VISIBILITY: Hint = Hint::new(3);
}
