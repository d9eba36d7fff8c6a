// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The cull/reveal changeset payload.

use canopy_state::ChangePayload;
use canopy_view::ViewKey;
use hashbrown::HashMap;

use crate::source::{CullSource, CullSourceSet};

/// Per-tick cull and reveal operations, carried as a changeset payload.
///
/// Ops are recorded on actual state transitions only, which is what makes
/// cancellation sound: if the same key/source pair is culled in one version
/// and revealed in another within an aggregation window, the element is back
/// in its pre-window state and the pair nets to no-op — the toggle analogue
/// of an entity that is added and then deleted.
///
/// [`reverse`](ChangePayload::reverse) swaps the two maps, mirroring the
/// added/deleted swap of the entity entries, so an undo step replays reveals
/// as culls and vice versa.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CullOps {
    to_cull: HashMap<ViewKey, CullSourceSet>,
    to_reveal: HashMap<ViewKey, CullSourceSet>,
}

/// Removes `source` from `map[key]` if present, dropping empty entries.
///
/// Returns `true` if something was removed.
fn erase(map: &mut HashMap<ViewKey, CullSourceSet>, key: ViewKey, source: CullSource) -> bool {
    let Some(set) = map.get_mut(&key) else {
        return false;
    };
    if !set.contains(source) {
        return false;
    }
    set.remove(source);
    if set.is_empty() {
        map.remove(&key);
    }
    true
}

impl CullOps {
    /// Creates an empty op set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records "cull `key` for `source`".
    ///
    /// A pending reveal of the same pair cancels instead.
    pub fn record_cull(&mut self, key: ViewKey, source: CullSource) {
        if !erase(&mut self.to_reveal, key, source) {
            self.to_cull.entry(key).or_default().insert(source);
        }
    }

    /// Records "reveal `key` for `source`".
    ///
    /// A pending cull of the same pair cancels instead.
    pub fn record_reveal(&mut self, key: ViewKey, source: CullSource) {
        if !erase(&mut self.to_cull, key, source) {
            self.to_reveal.entry(key).or_default().insert(source);
        }
    }

    /// Returns the pending cull sources for a key.
    #[must_use]
    pub fn cull_sources(&self, key: ViewKey) -> CullSourceSet {
        self.to_cull.get(&key).copied().unwrap_or_default()
    }

    /// Returns the pending reveal sources for a key.
    #[must_use]
    pub fn reveal_sources(&self, key: ViewKey) -> CullSourceSet {
        self.to_reveal.get(&key).copied().unwrap_or_default()
    }

    /// Returns an iterator over keys with pending culls.
    pub fn cull_iter(&self) -> impl Iterator<Item = (ViewKey, CullSourceSet)> + '_ {
        self.to_cull.iter().map(|(k, s)| (*k, *s))
    }

    /// Returns an iterator over keys with pending reveals.
    pub fn reveal_iter(&self) -> impl Iterator<Item = (ViewKey, CullSourceSet)> + '_ {
        self.to_reveal.iter().map(|(k, s)| (*k, *s))
    }

    /// Returns the total number of pending per-source operations.
    #[must_use]
    pub fn op_count(&self) -> usize {
        let culls: u32 = self.to_cull.values().map(|s| s.len()).sum();
        let reveals: u32 = self.to_reveal.values().map(|s| s.len()).sum();
        (culls + reveals) as usize
    }
}

impl ChangePayload<ViewKey> for CullOps {
    fn absorb_older<F: Fn(ViewKey) -> bool>(&mut self, older: &Self, dead: F) {
        // Ops for an id the window ultimately deletes are moot.
        for (&key, &set) in &older.to_cull {
            if dead(key) {
                continue;
            }
            for source in set {
                // A newer reveal of the same pair cancels both.
                if !erase(&mut self.to_reveal, key, source) {
                    self.to_cull.entry(key).or_default().insert(source);
                }
            }
        }
        for (&key, &set) in &older.to_reveal {
            if dead(key) {
                continue;
            }
            for source in set {
                if !erase(&mut self.to_cull, key, source) {
                    self.to_reveal.entry(key).or_default().insert(source);
                }
            }
        }
    }

    fn reverse(&mut self) {
        core::mem::swap(&mut self.to_cull, &mut self.to_reveal);
    }

    fn is_empty(&self) -> bool {
        self.to_cull.is_empty() && self.to_reveal.is_empty()
    }
}
