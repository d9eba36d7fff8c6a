// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observer registration and the per-tick dependency-ordered run.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

use crate::handle::{ContainerId, ObserverId};

/// A unit of incremental work driven once per tick.
///
/// An observer declares which containers it reads and which it writes; the
/// engine uses the declarations for ordering only and never touches the
/// containers itself. Within `observe`, the expected shape is: peek or pull
/// each input via a [`Cursor`](crate::Cursor), decide between skip /
/// incremental apply / full rebuild, then commit effects to the declared
/// outputs through their own updater scopes. Observers are conventionally the
/// only mutators of their declared outputs.
///
/// An observer must tolerate ids that no longer resolve — an input's delta
/// may mention an entity a producer earlier in the same tick already deleted.
/// Missing ids are skips, not errors.
pub trait Observer<W> {
    /// Containers this observer reads.
    fn reads(&self) -> &[ContainerId];

    /// Containers this observer writes.
    fn writes(&self) -> &[ContainerId];

    /// Performs one tick's worth of work.
    fn observe(&mut self, world: &mut W);
}

/// Error returned when registering an observer would create a dependency
/// cycle.
///
/// A cycle between observers is a wiring error — there is no order in which
/// the tick could run them — so it is rejected when the graph is built
/// rather than resolved at runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleError {
    /// Observers participating in the cycle (the rejected one included).
    pub involved: Vec<ObserverId>,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "observer dependency cycle involving {} observer(s)",
            self.involved.len()
        )
    }
}

impl core::error::Error for ScheduleError {}

struct Entry<W> {
    id: ObserverId,
    observer: Box<dyn Observer<W>>,
    paused: bool,
}

impl<W> fmt::Debug for Entry<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

/// Runs registered observers once per tick, in dependency order.
///
/// Ordering follows the edges "A writes a container that B reads": A runs
/// before B. Among unordered observers, registration order is kept, so runs
/// are deterministic. An observer reading and writing the same container is
/// allowed — the self-edge is ignored — which is how an observer defers
/// leftover work into its input's next version.
///
/// Pausing keeps the observer registered but skips it during ticks; its
/// cursors are untouched, so resuming continues incrementally.
/// Unregistering returns the boxed observer for the same reason — a view
/// that tears down and comes back can re-register the same observer object
/// and pick up where it left off.
#[derive(Debug)]
pub struct Engine<W> {
    entries: Vec<Entry<W>>,
    /// Tick order as indices into `entries`; rebuilt on (un)registration.
    order: Vec<usize>,
    next_id: u32,
}

impl<W> Default for Engine<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> Engine<W> {
    /// Creates an engine with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            order: Vec::new(),
            next_id: 0,
        }
    }

    /// Returns the number of registered observers (paused ones included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no observers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers an observer, wiring it into the tick order.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError`] if the observer's declared reads/writes
    /// would create a dependency cycle; the observer is not registered in
    /// that case.
    pub fn register(&mut self, observer: Box<dyn Observer<W>>) -> Result<ObserverId, ScheduleError> {
        let id = ObserverId(self.next_id);
        self.entries.push(Entry {
            id,
            observer,
            paused: false,
        });
        match self.compute_order() {
            Ok(order) => {
                self.next_id += 1;
                self.order = order;
                Ok(id)
            }
            Err(err) => {
                self.entries.pop();
                Err(err)
            }
        }
    }

    /// Unregisters an observer, returning it so it can be re-registered
    /// later with its bookkeeping intact.
    pub fn unregister(&mut self, id: ObserverId) -> Option<Box<dyn Observer<W>>> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        let entry = self.entries.remove(idx);
        // Removal cannot introduce a cycle.
        self.order = self
            .compute_order()
            .expect("removing an observer keeps the schedule acyclic");
        Some(entry.observer)
    }

    /// Pauses an observer: it stays registered but is skipped during ticks.
    ///
    /// Returns `false` if the id is unknown.
    pub fn pause(&mut self, id: ObserverId) -> bool {
        self.set_paused(id, true)
    }

    /// Resumes a paused observer.
    ///
    /// Returns `false` if the id is unknown.
    pub fn resume(&mut self, id: ObserverId) -> bool {
        self.set_paused(id, false)
    }

    /// Returns whether the observer is paused, or `None` if the id is
    /// unknown.
    #[must_use]
    pub fn is_paused(&self, id: ObserverId) -> Option<bool> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.paused)
    }

    fn set_paused(&mut self, id: ObserverId, paused: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(e) => {
                e.paused = paused;
                true
            }
            None => false,
        }
    }

    /// Runs one tick: every unpaused observer, in dependency order.
    pub fn tick(&mut self, world: &mut W) {
        for i in 0..self.order.len() {
            let idx = self.order[i];
            let entry = &mut self.entries[idx];
            if !entry.paused {
                entry.observer.observe(world);
            }
        }
    }

    /// Kahn's algorithm over "writer before reader" edges, keeping
    /// registration order among simultaneously ready observers.
    fn compute_order(&self) -> Result<Vec<usize>, ScheduleError> {
        let n = self.entries.len();
        let mut edges: Vec<SmallVec<[usize; 4]>> = (0..n).map(|_| SmallVec::new()).collect();
        let mut in_degree: Vec<usize> = (0..n).map(|_| 0).collect();

        for (a, ea) in self.entries.iter().enumerate() {
            for (b, eb) in self.entries.iter().enumerate() {
                if a == b {
                    continue;
                }
                let writes = ea.observer.writes();
                let depends = eb.observer.reads().iter().any(|r| writes.contains(r));
                if depends {
                    edges[a].push(b);
                    in_degree[b] += 1;
                }
            }
        }

        let mut order = Vec::with_capacity(n);
        let mut ready: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        // `ready` is consumed front to back and refilled in index order, so
        // ties resolve to registration order.
        let mut cursor = 0;
        while cursor < ready.len() {
            let i = ready[cursor];
            cursor += 1;
            order.push(i);
            for &dep in &edges[i] {
                in_degree[dep] -= 1;
                if in_degree[dep] == 0 {
                    ready.push(dep);
                }
            }
        }

        if order.len() < n {
            let involved = (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.entries[i].id)
                .collect();
            return Err(ScheduleError { involved });
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// Observer that appends its tag to a shared trace.
    struct Tagged {
        tag: u32,
        reads: Vec<ContainerId>,
        writes: Vec<ContainerId>,
    }

    impl Observer<Vec<u32>> for Tagged {
        fn reads(&self) -> &[ContainerId] {
            &self.reads
        }
        fn writes(&self) -> &[ContainerId] {
            &self.writes
        }
        fn observe(&mut self, trace: &mut Vec<u32>) {
            trace.push(self.tag);
        }
    }

    const A: ContainerId = ContainerId::new(0);
    const B: ContainerId = ContainerId::new(1);
    const C: ContainerId = ContainerId::new(2);

    fn tagged(tag: u32, reads: &[ContainerId], writes: &[ContainerId]) -> Box<Tagged> {
        Box::new(Tagged {
            tag,
            reads: reads.to_vec(),
            writes: writes.to_vec(),
        })
    }

    #[test]
    fn producers_run_before_consumers() {
        let mut engine = Engine::new();
        // Register the consumer first; ordering must still put the producer
        // ahead of it.
        engine.register(tagged(2, &[B], &[C])).unwrap();
        engine.register(tagged(1, &[A], &[B])).unwrap();

        let mut trace = Vec::new();
        engine.tick(&mut trace);
        assert_eq!(trace, vec![1, 2]);
    }

    #[test]
    fn unordered_observers_keep_registration_order() {
        let mut engine = Engine::new();
        engine.register(tagged(1, &[A], &[])).unwrap();
        engine.register(tagged(2, &[A], &[])).unwrap();
        engine.register(tagged(3, &[A], &[])).unwrap();

        let mut trace = Vec::new();
        engine.tick(&mut trace);
        assert_eq!(trace, vec![1, 2, 3]);
    }

    #[test]
    fn cycle_is_rejected_at_registration() {
        let mut engine = Engine::new();
        engine.register(tagged(1, &[A], &[B])).unwrap();
        let err = engine.register(tagged(2, &[B], &[A])).unwrap_err();
        assert_eq!(err.involved.len(), 2);
        // The rejected observer was not kept.
        assert_eq!(engine.len(), 1);
        let mut trace = Vec::new();
        engine.tick(&mut trace);
        assert_eq!(trace, vec![1]);
    }

    #[test]
    fn self_edge_is_allowed() {
        let mut engine = Engine::new();
        // Reads and writes the same container: the deferral pattern.
        engine.register(tagged(1, &[A], &[A, B])).unwrap();
        engine.register(tagged(2, &[B], &[])).unwrap();

        let mut trace = Vec::new();
        engine.tick(&mut trace);
        assert_eq!(trace, vec![1, 2]);
    }

    #[test]
    fn pause_skips_resume_restores() {
        let mut engine = Engine::new();
        let one = engine.register(tagged(1, &[A], &[])).unwrap();
        engine.register(tagged(2, &[A], &[])).unwrap();

        assert!(engine.pause(one));
        let mut trace = Vec::new();
        engine.tick(&mut trace);
        assert_eq!(trace, vec![2]);

        assert!(engine.resume(one));
        trace.clear();
        engine.tick(&mut trace);
        assert_eq!(trace, vec![1, 2]);
    }

    #[test]
    fn unregister_returns_observer_and_reorders() {
        let mut engine = Engine::new();
        let producer = engine.register(tagged(1, &[A], &[B])).unwrap();
        engine.register(tagged(2, &[B], &[])).unwrap();

        let boxed = engine.unregister(producer).expect("registered above");
        assert_eq!(engine.len(), 1);

        let mut trace = Vec::new();
        engine.tick(&mut trace);
        assert_eq!(trace, vec![2]);

        // Re-registering the same object wires it back in.
        engine.register(boxed).unwrap();
        trace.clear();
        engine.tick(&mut trace);
        assert_eq!(trace, vec![1, 2]);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut engine = Engine::<Vec<u32>>::new();
        let id = engine.register(tagged(1, &[A], &[])).unwrap();
        engine.unregister(id);
        assert!(!engine.pause(id));
        assert!(engine.is_paused(id).is_none());
        assert!(engine.unregister(id).is_none());
    }
}
