// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Observe: a tick-driven observer engine for versioned state.
//!
//! Observers are units of work that read some state containers and mutate
//! others. Once per tick the [`Engine`] runs every registered observer, in an
//! order consistent with the read/write dependencies the observers declare,
//! so that a container's producer always runs before its consumers within the
//! same tick.
//!
//! - [`ContainerId`]: compile-time handle naming one container for dependency
//!   declarations.
//! - [`Cursor`]: per-(observer, input) version bookkeeping; peeks cheaply,
//!   pulls aggregated deltas, survives pause/resume, and detects container
//!   replacement.
//! - [`Observer`]: the unit-of-work trait.
//! - [`Engine`]: registration, pause/resume, and the per-tick run.
//!
//! ## Quick Start
//!
//! ```rust
//! use canopy_observe::{ContainerId, Cursor, Engine, Observer};
//! use canopy_state::{Delta, EntityId, StateContainer};
//!
//! const SOURCE: ContainerId = ContainerId::new(0);
//! const SINK: ContainerId = ContainerId::new(1);
//!
//! struct World {
//!     source: StateContainer<Vec<EntityId>, EntityId>,
//!     sink: StateContainer<usize, EntityId>,
//! }
//!
//! /// Counts entities that ever appeared in the source.
//! struct Counter {
//!     cursor: Cursor,
//! }
//!
//! impl Observer<World> for Counter {
//!     fn reads(&self) -> &[ContainerId] {
//!         &[SOURCE]
//!     }
//!     fn writes(&self) -> &[ContainerId] {
//!         &[SINK]
//!     }
//!     fn observe(&mut self, world: &mut World) {
//!         match self.cursor.pull(&world.source) {
//!             Delta::Unchanged => {}
//!             Delta::Partial(cs) => {
//!                 let n = cs.added().count();
//!                 if n > 0 {
//!                     let mut u = world.sink.update();
//!                     *u.value_mut() += n;
//!                 }
//!             }
//!             Delta::Complete => {
//!                 let mut u = world.sink.update();
//!                 *u.value_mut() = world.source.value().len();
//!             }
//!         }
//!     }
//! }
//!
//! let mut world = World {
//!     source: StateContainer::new(Vec::new()),
//!     sink: StateContainer::new(0),
//! };
//! let mut engine = Engine::new();
//! engine.register(Box::new(Counter { cursor: Cursor::new() })).unwrap();
//!
//! {
//!     let mut u = world.source.update();
//!     u.value_mut().push(EntityId::from_raw(1));
//!     u.mark_added(EntityId::from_raw(1));
//! }
//! engine.tick(&mut world);
//! assert_eq!(*world.sink.value(), 1);
//! ```
//!
//! ## Ordering and cycles
//!
//! Observers run in topological order of the edges "A writes a container B
//! reads". A cycle between observers is a wiring error and is rejected at
//! registration time with [`ScheduleError`]. An observer may read and write
//! the *same* container — the self-edge is ignored for ordering — which is
//! how work is deferred into the container's next version (see the budgeted
//! reveal in `canopy_cull`).
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod cursor;
mod engine;
mod handle;

pub use cursor::Cursor;
pub use engine::{Engine, Observer, ScheduleError};
pub use handle::{ContainerId, ObserverId};
