// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy State: versioned state containers and changeset primitives.
//!
//! This crate is the synchronization core of an incremental editor: state is
//! held in [`StateContainer`]s, every completed mutation scope seals a
//! [`Changeset`] under a new version, and downstream consumers catch up by
//! aggregating the changesets they have not yet seen. It models
//! synchronization as a combination of:
//!
//! - **Entity identity** ([`EntityId`], [`EntityIdAllocator`]): cheap, stable
//!   ids that are never reused within a session.
//! - **Change hints** ([`Hint`], [`HintSet`]): small opaque tags describing
//!   *why* an entity changed (geometry, visibility, ...).
//! - **Changesets** ([`Changeset`], [`Change`]): per-version deltas of
//!   added/changed/deleted ids plus an optional domain payload
//!   ([`ChangePayload`]).
//! - **Aggregation** ([`ChangesetLog`]): folding any contiguous range of
//!   sealed changesets into one net delta, newest to oldest.
//! - **Containers** ([`StateContainer`], [`Updater`], [`Delta`]): one owner
//!   per slice of state, mutated only through scoped updaters.
//!
//! ## Quick Start
//!
//! ```rust
//! use canopy_state::{EntityId, Hint, StateContainer, Delta};
//!
//! let e1 = EntityId::from_raw(1);
//!
//! // A container holding a plain list of ids as its domain value.
//! let mut container = StateContainer::<Vec<EntityId>, EntityId>::new(Vec::new());
//! assert_eq!(container.version(), 0);
//!
//! {
//!     let mut u = container.update();
//!     u.value_mut().push(e1);
//!     u.mark_added(e1);
//! } // scope exit seals the changeset and bumps the version
//! assert_eq!(container.version(), 1);
//!
//! // A consumer that last saw version 0 aggregates what it missed.
//! match container.changes_since(0) {
//!     Delta::Partial(cs) => assert!(cs.is_added(e1)),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! ## Aggregation direction
//!
//! [`ChangesetLog::aggregate`] folds newest to oldest. The pairwise reduction
//! is not associative for delete/recreate/delete sequences, and only the
//! newest-to-oldest fold collapses them to a net deletion; see
//! [`Changeset::absorb_older`].
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod changeset;
mod container;
mod hint;
mod id;
mod log;

pub use changeset::{Change, ChangePayload, Changeset, UpdateKind};
pub use container::{Delta, StateContainer, Updater};
pub use hint::{Hint, HintSet, HintSetIter};
pub use id::{EntityId, EntityIdAllocator};
pub use log::ChangesetLog;
