// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-(observer, input) version bookkeeping.

use core::hash::Hash;

use canopy_state::{ChangePayload, Delta, StateContainer, UpdateKind};

/// Tracks the last version of one input container an observer consumed.
///
/// A cursor is the observer-side half of incremental catch-up: it remembers
/// the last version actually consumed, asks the container what happened since
/// then, and detects container replacement via the epoch. Observers own their
/// cursors as plain fields, which is what makes pause/resume cheap — an
/// unregistered observer keeps its bookkeeping, and resuming aggregates
/// incrementally instead of rebuilding, unless the container was replaced or
/// its history pruned in the meantime.
///
/// # Example
///
/// ```
/// use canopy_observe::Cursor;
/// use canopy_state::{Delta, EntityId, StateContainer, UpdateKind};
///
/// let mut c = StateContainer::<u32, EntityId>::new(0);
/// let mut cursor = Cursor::new();
///
/// // Peek without committing to work.
/// assert_eq!(cursor.peek(&c), UpdateKind::None);
///
/// {
///     let mut u = c.update();
///     u.mark_added(EntityId::from_raw(1));
/// }
/// assert_eq!(cursor.peek(&c), UpdateKind::Partial);
///
/// // Pull aggregates and advances.
/// assert!(matches!(cursor.pull(&c), Delta::Partial(_)));
/// assert_eq!(cursor.peek(&c), UpdateKind::None);
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct Cursor {
    last_seen: u64,
    epoch: u64,
}

impl Cursor {
    /// Creates a cursor that has seen nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last version this cursor consumed.
    #[must_use]
    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// Summarizes what happened since the last consumed version, without
    /// committing to it.
    ///
    /// Use this to defer work until a precondition holds: peeking never
    /// advances the cursor, so a deferred tick is retried in full on the
    /// next one.
    #[must_use]
    pub fn peek<T, K, P>(&self, container: &StateContainer<T, K, P>) -> UpdateKind
    where
        K: Copy + Eq + Hash,
        P: ChangePayload<K>,
    {
        if self.epoch != container.epoch() {
            return UpdateKind::Complete;
        }
        container.update_since(self.last_seen)
    }

    /// Computes the pending delta without advancing the cursor.
    ///
    /// Pair with [`mark_seen`](Self::mark_seen) once the delta has actually
    /// been applied; returning early instead leaves the cursor untouched, so
    /// the same delta (plus anything newer) is seen again next tick.
    #[must_use]
    pub fn preview<T, K, P>(&self, container: &StateContainer<T, K, P>) -> Delta<K, P>
    where
        K: Copy + Eq + Hash,
        P: ChangePayload<K>,
    {
        if self.epoch != container.epoch() {
            return Delta::Complete;
        }
        container.changes_since(self.last_seen)
    }

    /// Computes the pending delta and advances to the container's current
    /// version.
    #[must_use]
    pub fn pull<T, K, P>(&mut self, container: &StateContainer<T, K, P>) -> Delta<K, P>
    where
        K: Copy + Eq + Hash,
        P: ChangePayload<K>,
    {
        let delta = self.preview(container);
        self.mark_seen(container);
        delta
    }

    /// Advances to the container's current version without reading a delta.
    ///
    /// Used after a full rebuild, or after applying a delta obtained via
    /// [`preview`](Self::preview).
    pub fn mark_seen<T, K, P>(&mut self, container: &StateContainer<T, K, P>)
    where
        K: Copy + Eq + Hash,
        P: ChangePayload<K>,
    {
        self.last_seen = container.version();
        self.epoch = container.epoch();
    }
}
