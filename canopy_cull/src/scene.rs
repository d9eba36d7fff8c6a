// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Container values for the spatial pipeline: scene, space, camera.

use alloc::vec::Vec;
use core::fmt;

use canopy_index::{GridIndex, RegionMode};
use canopy_view::ViewKey;
use hashbrown::HashMap;
use kurbo::Rect;

/// Names one rendering partition.
///
/// Elements sharing a transform parent move as a group, so each parent gets
/// its own spatial index; a group drag re-indexes one partition, not the
/// whole canvas.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct PartitionId(u32);

impl PartitionId {
    /// Creates a new partition id with the given index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the index of this id.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PartitionId").field(&self.0).finish()
    }
}

/// One displayed element as the pipeline sees it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Element {
    /// World-space bounding box.
    pub bounds: Rect,
    /// Rendering partition the element belongs to.
    pub partition: PartitionId,
    /// Fine detail that drops out below the zoom threshold (pin labels,
    /// badges).
    pub fine_detail: bool,
}

impl Element {
    /// Creates a coarse (always-rendered) element.
    #[must_use]
    pub fn new(bounds: Rect, partition: PartitionId) -> Self {
        Self {
            bounds,
            partition,
            fine_detail: false,
        }
    }

    /// Marks the element as fine detail.
    #[must_use]
    pub fn with_fine_detail(mut self) -> Self {
        self.fine_detail = true;
        self
    }
}

/// The partitioning container's value: every displayed element.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    elements: HashMap<ViewKey, Element>,
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the scene has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Adds or replaces an element.
    pub fn insert(&mut self, key: ViewKey, element: Element) -> Option<Element> {
        self.elements.insert(key, element)
    }

    /// Removes an element.
    pub fn remove(&mut self, key: ViewKey) -> Option<Element> {
        self.elements.remove(&key)
    }

    /// Returns an element, if present.
    #[must_use]
    pub fn get(&self, key: ViewKey) -> Option<&Element> {
        self.elements.get(&key)
    }

    /// Returns an element mutably, if present.
    pub fn get_mut(&mut self, key: ViewKey) -> Option<&mut Element> {
        self.elements.get_mut(&key)
    }

    /// Returns an iterator over all elements.
    pub fn iter(&self) -> impl Iterator<Item = (ViewKey, &Element)> + '_ {
        self.elements.iter().map(|(k, e)| (*k, e))
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.elements.clear();
    }
}

/// The space container's value: one spatial index per partition.
#[derive(Debug, Default)]
pub struct Space {
    indices: HashMap<PartitionId, GridIndex<ViewKey>>,
    partition_of: HashMap<ViewKey, PartitionId>,
}

impl Space {
    /// Creates an empty space.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of indexed keys across all partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partition_of.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partition_of.is_empty()
    }

    /// Returns `true` if the key is indexed.
    #[must_use]
    pub fn contains(&self, key: ViewKey) -> bool {
        self.partition_of.contains_key(&key)
    }

    /// Returns the key's partition, if indexed.
    #[must_use]
    pub fn partition(&self, key: ViewKey) -> Option<PartitionId> {
        self.partition_of.get(&key).copied()
    }

    /// Returns the key's bounding box, if indexed.
    #[must_use]
    pub fn bounds(&self, key: ViewKey) -> Option<Rect> {
        let partition = self.partition(key)?;
        self.indices.get(&partition)?.bounds(key)
    }

    /// Adds the key or updates its box, moving it between partitions if
    /// needed.
    pub fn insert(&mut self, key: ViewKey, partition: PartitionId, bounds: Rect) {
        if let Some(old) = self.partition_of.get(&key).copied()
            && old != partition
            && let Some(index) = self.indices.get_mut(&old)
        {
            index.remove(key);
        }
        self.partition_of.insert(key, partition);
        self.indices.entry(partition).or_default().insert(key, bounds);
    }

    /// Removes the key.
    ///
    /// Returns `true` if it was indexed.
    pub fn remove(&mut self, key: ViewKey) -> bool {
        let Some(partition) = self.partition_of.remove(&key) else {
            return false;
        };
        if let Some(index) = self.indices.get_mut(&partition) {
            index.remove(key);
        }
        true
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.indices.clear();
        self.partition_of.clear();
    }

    /// Visits keys matching the region under the given mode, across all
    /// partitions.
    pub fn visit_region<F: FnMut(ViewKey)>(&self, rect: Rect, mode: RegionMode, mut f: F) {
        for index in self.indices.values() {
            index.visit_region(rect, mode, &mut f);
        }
    }

    /// Collects keys matching the region, across all partitions.
    #[must_use]
    pub fn query_region(&self, rect: Rect, mode: RegionMode) -> Vec<ViewKey> {
        let mut out = Vec::new();
        self.visit_region(rect, mode, |k| out.push(k));
        out
    }

    /// Collects keys whose box contains the point, across all partitions.
    ///
    /// Used for hit testing and "what's near this point" layout heuristics.
    #[must_use]
    pub fn query_point(&self, x: f64, y: f64) -> Vec<ViewKey> {
        let mut out = Vec::new();
        for index in self.indices.values() {
            index.visit_point(x, y, |k| out.push(k));
        }
        out
    }
}

/// The camera container's value: viewport and zoom.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    /// World-space rectangle currently on screen.
    pub viewport: Rect,
    /// Scale factor; smaller is further out.
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            viewport: Rect::new(0.0, 0.0, 0.0, 0.0),
            zoom: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_state::EntityId;
    use canopy_view::ViewContext;

    const MAIN: PartitionId = PartitionId::new(0);
    const GROUP: PartitionId = PartitionId::new(1);

    fn key(raw: u64) -> ViewKey {
        ViewKey::new(EntityId::from_raw(raw), ViewContext::new(0))
    }

    #[test]
    fn space_moves_keys_between_partitions() {
        let mut space = Space::new();
        space.insert(key(1), MAIN, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(space.partition(key(1)), Some(MAIN));

        space.insert(key(1), GROUP, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(space.partition(key(1)), Some(GROUP));
        assert_eq!(space.len(), 1);

        // The old partition no longer reports the key.
        let hits = space.query_region(Rect::new(-1.0, -1.0, 11.0, 11.0), RegionMode::Intersects);
        assert_eq!(hits, [key(1)]);
    }

    #[test]
    fn queries_span_partitions() {
        let mut space = Space::new();
        space.insert(key(1), MAIN, Rect::new(0.0, 0.0, 10.0, 10.0));
        space.insert(key(2), GROUP, Rect::new(5.0, 5.0, 15.0, 15.0));

        let mut hits = space.query_region(Rect::new(0.0, 0.0, 20.0, 20.0), RegionMode::Intersects);
        hits.sort_unstable();
        assert_eq!(hits, [key(1), key(2)]);

        let mut hits = space.query_point(7.0, 7.0);
        hits.sort_unstable();
        assert_eq!(hits, [key(1), key(2)]);
    }

    #[test]
    fn remove_clears_bookkeeping() {
        let mut space = Space::new();
        space.insert(key(1), MAIN, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(space.remove(key(1)));
        assert!(!space.remove(key(1)));
        assert!(space.is_empty());
        assert_eq!(space.bounds(key(1)), None);
    }
}
