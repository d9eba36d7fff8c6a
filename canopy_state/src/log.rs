// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered log of sealed changesets, indexed by version.

use alloc::collections::VecDeque;
use core::hash::Hash;

use crate::changeset::{ChangePayload, Changeset, UpdateKind};

#[derive(Clone, Debug)]
struct Sealed<K, P>
where
    K: Copy + Eq + Hash,
    P: ChangePayload<K>,
{
    version: u64,
    kind: UpdateKind,
    changeset: Changeset<K, P>,
}

/// An ordered log of sealed changesets plus the pending one being accumulated.
///
/// Each completed mutation scope of a
/// [`StateContainer`](crate::StateContainer) seals the pending changeset
/// under the version it produced. Consumers that last saw version `v` catch
/// up with [`aggregate`](Self::aggregate), which folds every changeset in
/// `(v, current]` into one net delta, walking newest to oldest.
///
/// Old entries can be pruned once every consumer has seen them
/// ([`prune_through`](Self::prune_through)); aggregation over a range that is
/// no longer fully retained returns `None`, which callers must treat as
/// "rebuild from scratch" — a pruned log never silently skips updates.
#[derive(Clone, Debug)]
pub struct ChangesetLog<K, P = ()>
where
    K: Copy + Eq + Hash,
    P: ChangePayload<K>,
{
    /// Changeset being accumulated for the version currently in progress.
    pending: Changeset<K, P>,
    /// Severity of the in-progress scope.
    pending_kind: UpdateKind,
    /// Sealed entries in strictly increasing version order.
    sealed: VecDeque<Sealed<K, P>>,
    /// Highest version no longer covered: aggregation must start at or above
    /// this.
    floor: u64,
}

impl<K, P> Default for ChangesetLog<K, P>
where
    K: Copy + Eq + Hash,
    P: ChangePayload<K>,
{
    fn default() -> Self {
        Self::new(0)
    }
}

impl<K, P> ChangesetLog<K, P>
where
    K: Copy + Eq + Hash,
    P: ChangePayload<K>,
{
    /// Creates an empty log whose coverage starts after `floor`.
    #[must_use]
    pub fn new(floor: u64) -> Self {
        Self {
            pending: Changeset::new(),
            pending_kind: UpdateKind::None,
            sealed: VecDeque::new(),
            floor,
        }
    }

    /// Returns the changeset being accumulated for the in-progress version.
    #[must_use]
    pub fn pending(&self) -> &Changeset<K, P> {
        &self.pending
    }

    /// Returns the in-progress changeset mutably.
    pub fn pending_mut(&mut self) -> &mut Changeset<K, P> {
        &mut self.pending
    }

    /// Returns the severity of the in-progress scope.
    #[must_use]
    pub fn pending_kind(&self) -> UpdateKind {
        self.pending_kind
    }

    /// Raises the in-progress severity to at least `kind`.
    pub fn raise_pending(&mut self, kind: UpdateKind) {
        self.pending_kind = self.pending_kind.max(kind);
    }

    /// Seals the pending changeset under `version` and starts a fresh one.
    ///
    /// The sealed severity is at least [`UpdateKind::Partial`]; a scope that
    /// sealed is a scope in which mutators ran.
    pub fn seal(&mut self, version: u64) {
        let changeset = core::mem::take(&mut self.pending);
        let kind = self.pending_kind.max(UpdateKind::Partial);
        self.pending_kind = UpdateKind::None;
        self.push(version, kind, changeset);
    }

    /// Seals an externally built changeset under `version`.
    ///
    /// Used by undo/redo, where the delta was computed once and reversed
    /// rather than re-accumulated.
    pub fn seal_external(&mut self, version: u64, kind: UpdateKind, changeset: Changeset<K, P>) {
        self.push(version, kind.max(UpdateKind::Partial), changeset);
    }

    fn push(&mut self, version: u64, kind: UpdateKind, changeset: Changeset<K, P>) {
        debug_assert!(
            self.sealed.back().is_none_or(|s| s.version < version) && version > self.floor,
            "sealed versions must be strictly increasing"
        );
        self.sealed.push_back(Sealed {
            version,
            kind,
            changeset,
        });
    }

    /// Returns the number of sealed entries retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sealed.len()
    }

    /// Returns `true` if no sealed entries are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sealed.is_empty()
    }

    /// Returns the oldest retained version, if any.
    #[must_use]
    pub fn oldest_retained(&self) -> Option<u64> {
        self.sealed.front().map(|s| s.version)
    }

    /// Drops sealed entries at or below `version`.
    ///
    /// Call once every consumer's last-seen version is at least `version`.
    pub fn prune_through(&mut self, version: u64) {
        while self.sealed.front().is_some_and(|s| s.version <= version) {
            self.sealed.pop_front();
        }
        self.floor = self.floor.max(version);
    }

    /// Drops all sealed entries and moves the coverage floor to `floor`.
    ///
    /// Used when the container's value is replaced wholesale; history from
    /// before the replacement can no longer be aggregated.
    pub fn clear_through(&mut self, floor: u64) {
        self.sealed.clear();
        self.pending = Changeset::new();
        self.pending_kind = UpdateKind::None;
        self.floor = floor;
    }

    /// Summarizes how much changed in `(since, upto]`.
    ///
    /// Returns [`UpdateKind::Complete`] when the range is not fully retained
    /// or contains a structural change, [`UpdateKind::None`] when the range
    /// is empty.
    #[must_use]
    pub fn kind_since(&self, since: u64, upto: u64) -> UpdateKind {
        if since >= upto {
            return UpdateKind::None;
        }
        if since < self.floor {
            return UpdateKind::Complete;
        }
        let mut kind = UpdateKind::None;
        for entry in self.range(since, upto) {
            kind = kind.max(entry.kind);
            if kind == UpdateKind::Complete {
                break;
            }
        }
        kind
    }

    /// Folds every changeset in `(since, upto]` into one net delta.
    ///
    /// Walks newest to oldest: entity entries first, then payloads against
    /// the final deleted set, so a scalar written for an id that the window
    /// ultimately deletes falls back to an older live candidate.
    ///
    /// Returns `None` when the range is not fully retained or contains a
    /// [`UpdateKind::Complete`] entry; callers must then rebuild from the
    /// container's current value instead.
    #[must_use]
    pub fn aggregate(&self, since: u64, upto: u64) -> Option<Changeset<K, P>> {
        if since >= upto {
            return Some(Changeset::new());
        }
        if since < self.floor {
            return None;
        }
        let mut out = Changeset::new();
        for entry in self.range(since, upto).rev() {
            if entry.kind == UpdateKind::Complete {
                return None;
            }
            out.absorb_older(&entry.changeset);
        }
        let mut payload = P::default();
        for entry in self.range(since, upto).rev() {
            payload.absorb_older(entry.changeset.payload(), |id| out.is_deleted(id));
        }
        out.set_payload(payload);
        Some(out)
    }

    /// Sealed entries with versions in `(since, upto]`, oldest first.
    fn range(
        &self,
        since: u64,
        upto: u64,
    ) -> impl DoubleEndedIterator<Item = &Sealed<K, P>> + '_ {
        let start = self.sealed.partition_point(|s| s.version <= since);
        let end = self.sealed.partition_point(|s| s.version <= upto);
        self.sealed.range(start..end)
    }
}
