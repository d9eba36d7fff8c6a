// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform hash-grid backend. Good general default for editor canvases.

use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::HashMap;
use kurbo::Rect;
use smallvec::SmallVec;

use crate::backend::Backend;
use crate::{rect_contains_point, rects_intersect};

/// Default grid cell size in world units.
const DEFAULT_CELL: f64 = 256.0;

/// Inclusive range of grid cells covered by an AABB.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct CellRange {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

#[derive(Clone, Debug)]
struct SlotEntry {
    aabb: Rect,
    range: CellRange,
}

/// Uniform hash-grid backend.
///
/// AABBs are bucketed into fixed-size cells keyed by integer coordinates;
/// queries touch only the cells the query region covers. A slot spanning
/// several cells is deduplicated at visit time by reporting it from the
/// first covered cell inside the query range, so no per-query allocation is
/// needed.
pub struct Grid {
    cell: f64,
    cells: HashMap<(i64, i64), SmallVec<[usize; 4]>>,
    slots: Vec<Option<SlotEntry>>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(DEFAULT_CELL)
    }
}

impl Debug for Grid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let alive = self.slots.iter().filter(|e| e.is_some()).count();
        f.debug_struct("Grid")
            .field("cell", &self.cell)
            .field("occupied_cells", &self.cells.len())
            .field("alive", &alive)
            .finish_non_exhaustive()
    }
}

impl Grid {
    /// Creates a grid with the given cell size in world units.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not strictly positive.
    #[must_use]
    pub fn new(cell: f64) -> Self {
        assert!(cell > 0.0, "grid cell size must be positive");
        Self {
            cell,
            cells: HashMap::new(),
            slots: Vec::new(),
        }
    }

    fn range_of(&self, rect: &Rect) -> CellRange {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "world coordinates fit cell indices for any plausible canvas"
        )]
        let cell_of = |v: f64| -> i64 { (v / self.cell) as i64 - i64::from(v < 0.0 && v % self.cell != 0.0) };
        CellRange {
            x0: cell_of(rect.x0),
            y0: cell_of(rect.y0),
            x1: cell_of(rect.x1),
            y1: cell_of(rect.y1),
        }
    }

    fn link(&mut self, slot: usize, range: CellRange) {
        for cx in range.x0..=range.x1 {
            for cy in range.y0..=range.y1 {
                self.cells.entry((cx, cy)).or_default().push(slot);
            }
        }
    }

    fn unlink(&mut self, slot: usize, range: CellRange) {
        for cx in range.x0..=range.x1 {
            for cy in range.y0..=range.y1 {
                if let Some(bucket) = self.cells.get_mut(&(cx, cy)) {
                    bucket.retain(|&mut s| s != slot);
                    if bucket.is_empty() {
                        self.cells.remove(&(cx, cy));
                    }
                }
            }
        }
    }
}

impl Backend for Grid {
    fn insert(&mut self, slot: usize, aabb: Rect) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
        let range = self.range_of(&aabb);
        self.slots[slot] = Some(SlotEntry { aabb, range });
        self.link(slot, range);
    }

    fn update(&mut self, slot: usize, aabb: Rect) {
        let new_range = self.range_of(&aabb);
        let Some(Some(entry)) = self.slots.get_mut(slot) else {
            return;
        };
        let old_range = entry.range;
        entry.aabb = aabb;
        entry.range = new_range;
        if new_range != old_range {
            self.unlink(slot, old_range);
            self.link(slot, new_range);
        }
    }

    fn remove(&mut self, slot: usize) {
        let Some(entry) = self.slots.get_mut(slot).and_then(Option::take) else {
            return;
        };
        self.unlink(slot, entry.range);
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.slots.clear();
    }

    fn visit_point<F: FnMut(usize)>(&self, x: f64, y: f64, mut f: F) {
        let probe = self.range_of(&Rect::new(x, y, x, y));
        let Some(bucket) = self.cells.get(&(probe.x0, probe.y0)) else {
            return;
        };
        for &slot in bucket {
            if let Some(Some(entry)) = self.slots.get(slot)
                && rect_contains_point(&entry.aabb, x, y)
            {
                f(slot);
            }
        }
    }

    fn visit_rect<F: FnMut(usize)>(&self, rect: Rect, mut f: F) {
        let query = self.range_of(&rect);
        for cx in query.x0..=query.x1 {
            for cy in query.y0..=query.y1 {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for &slot in bucket {
                    let Some(Some(entry)) = self.slots.get(slot) else {
                        continue;
                    };
                    // Report a multi-cell slot only from the first covered
                    // cell inside the query range.
                    let home_x = entry.range.x0.max(query.x0);
                    let home_y = entry.range.y0.max(query.y0);
                    if (cx, cy) != (home_x, home_y) {
                        continue;
                    }
                    if rects_intersect(&entry.aabb, &rect) {
                        f(slot);
                    }
                }
            }
        }
    }
}
