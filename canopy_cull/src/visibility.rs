// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element visibility state: visible iff no culling source applies.

use canopy_view::ViewKey;
use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::source::{CullSource, CullSourceSet};

/// Multi-source visibility bookkeeping, one entry per culled view instance.
///
/// The state machine per key is: `Visible` (no entry) or culled by a
/// non-empty set of sources. Marking is idempotent per source, and the
/// element only becomes visible again once *every* source has been cleared —
/// clearing zoom culling must not reveal an element that is still outside
/// the viewport.
///
/// # Example
///
/// ```
/// use canopy_cull::{CullSource, VisibilityMap};
/// use canopy_state::EntityId;
/// use canopy_view::{ViewContext, ViewKey};
///
/// let key = ViewKey::new(EntityId::from_raw(1), ViewContext::new(0));
/// let mut map = VisibilityMap::new();
///
/// map.mark_culled(key, CullSource::ZOOM);
/// map.mark_culled(key, CullSource::VIEWPORT);
///
/// map.mark_revealed(key, CullSource::ZOOM);
/// assert!(map.is_culled(key)); // still outside the viewport
///
/// map.mark_revealed(key, CullSource::VIEWPORT);
/// assert!(!map.is_culled(key));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityMap {
    culled: HashMap<ViewKey, CullSourceSet>,
}

impl VisibilityMap {
    /// Creates a map in which everything is visible.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if any source culls the key.
    #[must_use]
    pub fn is_culled(&self, key: ViewKey) -> bool {
        self.culled.contains_key(&key)
    }

    /// Returns the set of sources culling the key (empty when visible).
    #[must_use]
    pub fn sources(&self, key: ViewKey) -> CullSourceSet {
        self.culled.get(&key).copied().unwrap_or_default()
    }

    /// Adds a culling source for the key.
    ///
    /// Idempotent; returns `true` if the source was newly added.
    pub fn mark_culled(&mut self, key: ViewKey, source: CullSource) -> bool {
        let set = self.culled.entry(key).or_default();
        if set.contains(source) {
            return false;
        }
        set.insert(source);
        true
    }

    /// Removes a culling source for the key.
    ///
    /// Idempotent; returns `true` if the source was present. The key becomes
    /// visible only once its last source is removed.
    pub fn mark_revealed(&mut self, key: ViewKey, source: CullSource) -> bool {
        let Entry::Occupied(mut entry) = self.culled.entry(key) else {
            return false;
        };
        if !entry.get().contains(source) {
            return false;
        }
        entry.get_mut().remove(source);
        if entry.get().is_empty() {
            entry.remove();
        }
        true
    }

    /// Drops all state for the key (the element no longer exists).
    ///
    /// Returns `true` if the key had culling state.
    pub fn remove_key(&mut self, key: ViewKey) -> bool {
        self.culled.remove(&key).is_some()
    }

    /// Returns the number of culled keys.
    #[must_use]
    pub fn culled_len(&self) -> usize {
        self.culled.len()
    }

    /// Returns an iterator over culled keys and their sources.
    pub fn iter(&self) -> impl Iterator<Item = (ViewKey, CullSourceSet)> + '_ {
        self.culled.iter().map(|(k, s)| (*k, *s))
    }

    /// Forgets everything (everything becomes visible).
    pub fn clear(&mut self) {
        self.culled.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_state::EntityId;
    use canopy_view::ViewContext;

    fn key(raw: u64) -> ViewKey {
        ViewKey::new(EntityId::from_raw(raw), ViewContext::new(0))
    }

    #[test]
    fn visible_by_default() {
        let map = VisibilityMap::new();
        assert!(!map.is_culled(key(1)));
        assert!(map.sources(key(1)).is_empty());
    }

    #[test]
    fn sources_clear_independently_in_any_order() {
        for first in [CullSource::VIEWPORT, CullSource::ZOOM] {
            let second = if first == CullSource::VIEWPORT {
                CullSource::ZOOM
            } else {
                CullSource::VIEWPORT
            };
            let mut map = VisibilityMap::new();
            map.mark_culled(key(1), CullSource::VIEWPORT);
            map.mark_culled(key(1), CullSource::ZOOM);

            assert!(map.mark_revealed(key(1), first));
            assert!(map.is_culled(key(1)), "one source still applies");
            assert!(map.mark_revealed(key(1), second));
            assert!(!map.is_culled(key(1)));
        }
    }

    #[test]
    fn marking_is_idempotent_per_source() {
        let mut map = VisibilityMap::new();
        assert!(map.mark_culled(key(1), CullSource::ZOOM));
        assert!(!map.mark_culled(key(1), CullSource::ZOOM));
        assert!(map.mark_revealed(key(1), CullSource::ZOOM));
        assert!(!map.mark_revealed(key(1), CullSource::ZOOM));
    }

    #[test]
    fn revealing_an_absent_source_is_a_noop() {
        let mut map = VisibilityMap::new();
        map.mark_culled(key(1), CullSource::VIEWPORT);
        assert!(!map.mark_revealed(key(1), CullSource::ZOOM));
        assert!(map.is_culled(key(1)));
    }

    #[test]
    fn remove_key_drops_state() {
        let mut map = VisibilityMap::new();
        map.mark_culled(key(1), CullSource::VIEWPORT);
        assert!(map.remove_key(key(1)));
        assert!(!map.remove_key(key(1)));
        assert!(!map.is_culled(key(1)));
        assert_eq!(map.culled_len(), 0);
    }
}
