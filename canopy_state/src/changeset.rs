// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-version delta records and the pairwise reduction used to merge them.

use core::hash::Hash;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::hint::HintSet;

/// How much of a container changed at a given version.
///
/// The ordering is by severity, so `a.max(b)` is "the stronger of the two".
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum UpdateKind {
    /// Nothing changed.
    #[default]
    None,
    /// A bounded set of entities changed; the changeset enumerates them.
    Partial,
    /// The container changed structurally (e.g. a document was reloaded);
    /// consumers must treat all prior knowledge as stale.
    Complete,
}

/// The net effect of an aggregation window on one entity.
///
/// A sealed changeset holds at most one `Change` per id, which is what keeps
/// "an id appears in at most one of added/changed/deleted" true by
/// construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Change {
    /// The entity came into existence within the window.
    Added,
    /// The entity existed before the window and changed, for these reasons.
    Changed(HintSet),
    /// The entity existed before the window and is gone.
    Deleted,
}

/// Reduces two per-entity effects into their net effect.
///
/// `older` happened before `newer`. `None` means the entity was created and
/// destroyed entirely within the window, leaving no externally visible trace.
///
/// This reduction is deliberately not associative: `delete, add, delete`
/// collapses to `Deleted` only when folded newest to oldest (the newer pair
/// reduces first). Folding oldest to newest reduces the older pair first and
/// nets the sequence to nothing, which would drop a real deletion.
fn net(older: Change, newer: Change) -> Option<Change> {
    match (older, newer) {
        // Created then destroyed within the window.
        (Change::Added, Change::Deleted) => None,
        // Hints on a brand-new entity are absorbed by the creation.
        (Change::Added, _) => Some(Change::Added),
        (Change::Changed(a), Change::Changed(b)) => Some(Change::Changed(a | b)),
        // A plain change is superseded by a lifecycle event.
        (Change::Changed(_), lifecycle) => Some(lifecycle),
        // Destroyed then recreated nets to a brand-new entity.
        (Change::Deleted, Change::Added) => Some(Change::Added),
        (Change::Deleted, _) => Some(Change::Deleted),
    }
}

/// Domain payload carried alongside a changeset's entity entries.
///
/// Payloads hold the non-set-like parts of a delta: scalar "last writer wins"
/// fields (e.g. which entity requests a rename) or domain-specific op maps.
/// The unit payload `()` is zero-cost for containers that need none.
///
/// Payload folding runs *after* the entity entries of the whole window have
/// been folded, so `dead` reports membership in the window's final deleted
/// set and a newer value for a dead id correctly yields to an older live one.
pub trait ChangePayload<K: Copy + Eq + Hash>: Default + Clone {
    /// Folds an older payload into this newer one.
    ///
    /// Implementations should keep their own newer values and only adopt
    /// values from `older` for fields still unset, skipping anything keyed by
    /// an id for which `dead` returns `true`.
    fn absorb_older<F: Fn(K) -> bool>(&mut self, older: &Self, dead: F);

    /// Flips the payload for the opposite direction (undo vs redo).
    ///
    /// The default does nothing; payloads with directional content override
    /// this.
    fn reverse(&mut self) {}

    /// Returns `true` if the payload carries no information.
    fn is_empty(&self) -> bool;
}

impl<K: Copy + Eq + Hash> ChangePayload<K> for () {
    fn absorb_older<F: Fn(K) -> bool>(&mut self, _older: &Self, _dead: F) {}

    fn is_empty(&self) -> bool {
        true
    }
}

/// A delta of added/changed/deleted entities, sealed under one version.
///
/// Changesets accumulate while an [`Updater`](crate::Updater) scope is open
/// and become immutable once sealed into a [`ChangesetLog`](crate::ChangesetLog).
/// Recording the same id repeatedly within one scope applies the same
/// reduction as cross-version aggregation, so a scope that adds and then
/// deletes an id seals an empty delta.
///
/// # Example
///
/// ```
/// use canopy_state::{Changeset, EntityId, Hint};
///
/// let e = EntityId::from_raw(7);
/// let mut cs = Changeset::<EntityId>::new();
///
/// cs.record_added(e);
/// cs.record_changed(e, Hint::UNSPECIFIED); // absorbed: e is brand new
/// assert!(cs.is_added(e));
///
/// cs.record_deleted(e); // created then destroyed: no net effect
/// assert!(cs.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct Changeset<K, P = ()>
where
    K: Copy + Eq + Hash,
    P: ChangePayload<K>,
{
    /// Net effect per entity.
    entries: HashMap<K, Change>,
    /// Domain payload (scalar fields, op maps).
    payload: P,
}

impl<K, P> Default for Changeset<K, P>
where
    K: Copy + Eq + Hash,
    P: ChangePayload<K>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, P> Changeset<K, P>
where
    K: Copy + Eq + Hash,
    P: ChangePayload<K>,
{
    /// Creates an empty changeset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            payload: P::default(),
        }
    }

    /// Returns `true` if the changeset records nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.payload.is_empty()
    }

    /// Returns the number of entities with a recorded effect.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the recorded effect for an entity, if any.
    #[must_use]
    pub fn entry(&self, id: K) -> Option<Change> {
        self.entries.get(&id).copied()
    }

    /// Returns `true` if the entity nets to added.
    #[must_use]
    pub fn is_added(&self, id: K) -> bool {
        matches!(self.entries.get(&id), Some(Change::Added))
    }

    /// Returns `true` if the entity nets to changed.
    #[must_use]
    pub fn is_changed(&self, id: K) -> bool {
        matches!(self.entries.get(&id), Some(Change::Changed(_)))
    }

    /// Returns `true` if the entity nets to deleted.
    #[must_use]
    pub fn is_deleted(&self, id: K) -> bool {
        matches!(self.entries.get(&id), Some(Change::Deleted))
    }

    /// Returns an iterator over entities that net to added.
    pub fn added(&self) -> impl Iterator<Item = K> + '_ {
        self.entries
            .iter()
            .filter(|(_, c)| matches!(c, Change::Added))
            .map(|(k, _)| *k)
    }

    /// Returns an iterator over entities that net to changed, with their hints.
    pub fn changed(&self) -> impl Iterator<Item = (K, HintSet)> + '_ {
        self.entries.iter().filter_map(|(k, c)| match c {
            Change::Changed(hints) => Some((*k, *hints)),
            _ => None,
        })
    }

    /// Returns an iterator over entities that net to deleted.
    pub fn deleted(&self) -> impl Iterator<Item = K> + '_ {
        self.entries
            .iter()
            .filter(|(_, c)| matches!(c, Change::Deleted))
            .map(|(k, _)| *k)
    }

    /// Returns an iterator over every entity the changeset touches.
    pub fn touched(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.keys().copied()
    }

    /// Returns the domain payload.
    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Returns the domain payload mutably.
    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    pub(crate) fn set_payload(&mut self, payload: P) {
        self.payload = payload;
    }

    /// Records that an entity was created.
    pub fn record_added(&mut self, id: K) {
        self.record(id, Change::Added);
    }

    /// Records that an entity changed, with the given hints.
    pub fn record_changed(&mut self, id: K, hints: impl Into<HintSet>) {
        self.record(id, Change::Changed(hints.into()));
    }

    /// Records that an entity was deleted.
    pub fn record_deleted(&mut self, id: K) {
        self.record(id, Change::Deleted);
    }

    /// Records a new effect, reducing against whatever is already recorded.
    fn record(&mut self, id: K, op: Change) {
        match self.entries.entry(id) {
            Entry::Occupied(mut e) => match net(*e.get(), op) {
                Some(c) => {
                    e.insert(c);
                }
                None => {
                    e.remove();
                }
            },
            Entry::Vacant(v) => {
                v.insert(op);
            }
        }
    }

    /// Folds an older changeset's entries into this newer one.
    ///
    /// Aggregation walks a version range newest to oldest, calling this once
    /// per older changeset; see [`net`] for why the direction matters.
    /// Payloads are not folded here —
    /// [`ChangesetLog::aggregate`](crate::ChangesetLog::aggregate) folds them
    /// in a second pass against the final deleted set.
    pub fn absorb_older(&mut self, older: &Self) {
        for (&id, &older_change) in &older.entries {
            match self.entries.entry(id) {
                Entry::Occupied(mut e) => match net(older_change, *e.get()) {
                    Some(c) => {
                        e.insert(c);
                    }
                    None => {
                        e.remove();
                    }
                },
                Entry::Vacant(v) => {
                    v.insert(older_change);
                }
            }
        }
    }

    /// Flips the changeset in place: added becomes deleted and vice versa.
    ///
    /// Lets one changeset serve both the undo and redo directions without
    /// recomputation.
    pub fn reverse(&mut self) {
        for change in self.entries.values_mut() {
            *change = match *change {
                Change::Added => Change::Deleted,
                Change::Deleted => Change::Added,
                keep => keep,
            };
        }
        self.payload.reverse();
    }

    /// Returns the flipped changeset; see [`reverse`](Self::reverse).
    #[must_use]
    pub fn reversed(mut self) -> Self {
        self.reverse();
        self
    }
}
