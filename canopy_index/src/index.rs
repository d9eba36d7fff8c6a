// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyed front end over a spatial backend.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;
use kurbo::Rect;

use crate::backend::Backend;
use crate::backends::grid::Grid;
use crate::rect_contains_rect;

/// How a region query matches element boxes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegionMode {
    /// Match elements whose box overlaps the region at all.
    Intersects,
    /// Match only elements whose box lies entirely within the region.
    Contains,
}

/// A keyed 2D AABB index.
///
/// Maps application keys to bounding boxes and answers point and region
/// queries. Keys map to dense backend slots internally; slots are recycled
/// after removal, so long-lived indices stay compact under churn.
///
/// Use one index per rendering partition: elements sharing a transform
/// parent move as a group and are best partitioned independently.
///
/// # Example
///
/// ```
/// use canopy_index::{FlatIndex, RegionMode};
/// use kurbo::Rect;
///
/// let mut index = FlatIndex::<u32>::new();
/// index.insert(7, Rect::new(0.0, 0.0, 10.0, 10.0));
/// index.insert(8, Rect::new(5.0, 5.0, 30.0, 30.0));
///
/// let mut hits = index.query_region(Rect::new(0.0, 0.0, 12.0, 12.0), RegionMode::Intersects);
/// hits.sort_unstable();
/// assert_eq!(hits, vec![7, 8]);
///
/// let contained = index.query_region(Rect::new(0.0, 0.0, 12.0, 12.0), RegionMode::Contains);
/// assert_eq!(contained, vec![7]);
/// ```
#[derive(Debug)]
pub struct SpatialIndex<K, B = Grid>
where
    K: Copy + Eq + Hash,
    B: Backend,
{
    backend: B,
    /// Slot -> (key, box); `None` marks a recyclable slot.
    slots: Vec<Option<(K, Rect)>>,
    free: Vec<usize>,
    by_key: HashMap<K, usize>,
}

impl<K, B> Default for SpatialIndex<K, B>
where
    K: Copy + Eq + Hash,
    B: Backend + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, B> SpatialIndex<K, B>
where
    K: Copy + Eq + Hash,
    B: Backend + Default,
{
    /// Creates an empty index with a default backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_backend(B::default())
    }
}

impl<K, B> SpatialIndex<K, B>
where
    K: Copy + Eq + Hash,
    B: Backend,
{
    /// Creates an empty index over the given backend.
    #[must_use]
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            slots: Vec::new(),
            free: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    /// Returns the number of keys in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Returns `true` if the index holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Returns `true` if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: K) -> bool {
        self.by_key.contains_key(&key)
    }

    /// Returns the key's bounding box, if present.
    #[must_use]
    pub fn bounds(&self, key: K) -> Option<Rect> {
        let slot = *self.by_key.get(&key)?;
        self.slots.get(slot).copied().flatten().map(|(_, aabb)| aabb)
    }

    /// Adds the key or updates its bounding box.
    ///
    /// Returns `true` if the key was newly added.
    pub fn insert(&mut self, key: K, aabb: Rect) -> bool {
        if let Some(&slot) = self.by_key.get(&key) {
            self.slots[slot] = Some((key, aabb));
            self.backend.update(slot, aabb);
            return false;
        }
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some((key, aabb));
                slot
            }
            None => {
                self.slots.push(Some((key, aabb)));
                self.slots.len() - 1
            }
        };
        self.by_key.insert(key, slot);
        self.backend.insert(slot, aabb);
        true
    }

    /// Removes the key.
    ///
    /// Returns `true` if it was present.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(slot) = self.by_key.remove(&key) else {
            return false;
        };
        self.slots[slot] = None;
        self.free.push(slot);
        self.backend.remove(slot);
        true
    }

    /// Adds or updates a batch of keys.
    pub fn update_batch(&mut self, batch: impl IntoIterator<Item = (K, Rect)>) {
        for (key, aabb) in batch {
            self.insert(key, aabb);
        }
    }

    /// Removes a batch of keys. Absent keys are skipped.
    pub fn remove_batch(&mut self, batch: impl IntoIterator<Item = K>) {
        for key in batch {
            self.remove(key);
        }
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.backend.clear();
        self.slots.clear();
        self.free.clear();
        self.by_key.clear();
    }

    /// Visits keys whose box contains the point.
    pub fn visit_point<F: FnMut(K)>(&self, x: f64, y: f64, mut f: F) {
        self.backend.visit_point(x, y, |slot| {
            if let Some(Some((key, _))) = self.slots.get(slot) {
                f(*key);
            }
        });
    }

    /// Visits keys matching the region under the given mode.
    pub fn visit_region<F: FnMut(K)>(&self, rect: Rect, mode: RegionMode, mut f: F) {
        self.backend.visit_rect(rect, |slot| {
            if let Some(Some((key, aabb))) = self.slots.get(slot) {
                match mode {
                    RegionMode::Intersects => f(*key),
                    RegionMode::Contains => {
                        if rect_contains_rect(&rect, aabb) {
                            f(*key);
                        }
                    }
                }
            }
        });
    }

    /// Collects keys whose box contains the point.
    #[must_use]
    pub fn query_point(&self, x: f64, y: f64) -> Vec<K> {
        let mut out = Vec::new();
        self.visit_point(x, y, |k| out.push(k));
        out
    }

    /// Collects keys matching the region under the given mode.
    #[must_use]
    pub fn query_region(&self, rect: Rect, mode: RegionMode) -> Vec<K> {
        let mut out = Vec::new();
        self.visit_region(rect, mode, |k| out.push(k));
        out
    }

    /// Returns an iterator over all keys and their boxes.
    pub fn iter(&self) -> impl Iterator<Item = (K, Rect)> + '_ {
        self.slots.iter().filter_map(|s| *s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::flatvec::FlatVec;

    type Index = SpatialIndex<u32, FlatVec>;

    #[test]
    fn insert_update_remove() {
        let mut index = Index::new();
        assert!(index.insert(1, Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(!index.insert(1, Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert_eq!(index.len(), 1);
        assert_eq!(index.bounds(1), Some(Rect::new(5.0, 5.0, 15.0, 15.0)));

        assert!(index.remove(1));
        assert!(!index.remove(1));
        assert!(index.is_empty());
        assert_eq!(index.bounds(1), None);
    }

    #[test]
    fn slots_are_recycled() {
        let mut index = Index::new();
        index.insert(1, Rect::new(0.0, 0.0, 1.0, 1.0));
        index.insert(2, Rect::new(2.0, 0.0, 3.0, 1.0));
        index.remove(1);
        index.insert(3, Rect::new(4.0, 0.0, 5.0, 1.0));
        // The freed slot was reused rather than growing the table.
        assert_eq!(index.slots.len(), 2);
    }

    #[test]
    fn point_query() {
        let mut index = Index::new();
        index.insert(1, Rect::new(0.0, 0.0, 10.0, 10.0));
        index.insert(2, Rect::new(5.0, 5.0, 20.0, 20.0));

        let mut hits = index.query_point(7.0, 7.0);
        hits.sort_unstable();
        assert_eq!(hits, [1, 2]);
        assert_eq!(index.query_point(15.0, 15.0), [2]);
        assert!(index.query_point(50.0, 50.0).is_empty());
    }

    #[test]
    fn region_modes() {
        let mut index = Index::new();
        index.insert(1, Rect::new(0.0, 0.0, 10.0, 10.0));
        index.insert(2, Rect::new(8.0, 8.0, 30.0, 30.0));

        let region = Rect::new(-1.0, -1.0, 12.0, 12.0);
        let mut overlapping = index.query_region(region, RegionMode::Intersects);
        overlapping.sort_unstable();
        assert_eq!(overlapping, [1, 2]);
        assert_eq!(index.query_region(region, RegionMode::Contains), [1]);
    }

    #[test]
    fn batched_updates() {
        let mut index = Index::new();
        index.update_batch([
            (1, Rect::new(0.0, 0.0, 1.0, 1.0)),
            (2, Rect::new(2.0, 0.0, 3.0, 1.0)),
            (3, Rect::new(4.0, 0.0, 5.0, 1.0)),
        ]);
        assert_eq!(index.len(), 3);

        index.remove_batch([1, 3, 9]);
        assert_eq!(index.len(), 1);
        assert!(index.contains_key(2));
    }

    #[test]
    fn edge_touch_counts_as_intersecting() {
        let mut index = Index::new();
        index.insert(1, Rect::new(0.0, 0.0, 10.0, 10.0));
        let hits = index.query_region(Rect::new(10.0, 10.0, 20.0, 20.0), RegionMode::Intersects);
        assert_eq!(hits, [1]);
    }
}
