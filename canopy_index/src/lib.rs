// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Index: a keyed 2D AABB index for visibility and hit queries.
//!
//! The index maps application keys to axis-aligned bounding boxes and answers
//! "which keys are at this point" and "which keys are in this region". It is
//! the spatial half of viewport culling: a region query against the viewport
//! yields the in-view set, and diffing that set between frames yields the
//! cull/reveal work.
//!
//! - [`SpatialIndex`]: the keyed front end with slot recycling and batched
//!   updates.
//! - [`Backend`]: the spatial-structure abstraction behind it.
//! - [`FlatVec`]: linear-scan backend; good for tiny sets.
//! - [`Grid`]: uniform hash-grid backend; good general default.
//!
//! ## Quick Start
//!
//! ```rust
//! use canopy_index::{GridIndex, RegionMode};
//! use kurbo::Rect;
//!
//! let mut index = GridIndex::<u32>::new();
//! index.update_batch([
//!     (1, Rect::new(0.0, 0.0, 10.0, 10.0)),
//!     (2, Rect::new(100.0, 0.0, 110.0, 10.0)),
//! ]);
//!
//! let hits = index.query_region(Rect::new(-5.0, -5.0, 50.0, 50.0), RegionMode::Intersects);
//! assert_eq!(hits, vec![1]);
//! ```
//!
//! Boxes are closed: a query touching only an edge still reports the key.
//! Float inputs are assumed finite (no NaNs).
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. Enable the `libm` feature
//! instead of `std` for no_std targets.

#![no_std]

extern crate alloc;

mod backend;
mod backends;
mod index;

pub use backend::Backend;
pub use backends::flatvec::FlatVec;
pub use backends::grid::Grid;
pub use index::{RegionMode, SpatialIndex};

/// [`SpatialIndex`] over the linear-scan backend.
pub type FlatIndex<K> = SpatialIndex<K, FlatVec>;

/// [`SpatialIndex`] over the uniform-grid backend.
pub type GridIndex<K> = SpatialIndex<K, Grid>;

use kurbo::Rect;

/// Closed-interval intersection test.
pub(crate) fn rects_intersect(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Returns `true` if `inner` lies entirely within `outer`.
pub(crate) fn rect_contains_rect(outer: &Rect, inner: &Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

/// Closed-interval point containment test.
pub(crate) fn rect_contains_point(r: &Rect, x: f64, y: f64) -> bool {
    r.x0 <= x && x <= r.x1 && r.y0 <= y && y <= r.y1
}
