// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View identity: contexts, keys, and view ids.

use core::fmt;

use canopy_state::EntityId;

/// Names one place views can live (a canvas, an inspector panel, ...).
///
/// The same entity can have an independent view instance per context, so
/// spatial and visibility bookkeeping key on [`ViewKey`], never on the bare
/// entity.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewContext(u32);

impl ViewContext {
    /// Creates a new context with the given index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the index of this context.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ViewContext").field(&self.0).finish()
    }
}

/// One view instance: an entity as displayed in one context.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewKey {
    /// The displayed entity.
    pub entity: EntityId,
    /// Where it is displayed.
    pub context: ViewContext,
}

impl ViewKey {
    /// Creates a key for `entity` displayed in `context`.
    #[must_use]
    pub const fn new(entity: EntityId, context: ViewContext) -> Self {
        Self { entity, context }
    }
}

impl fmt::Debug for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewKey({:?} @ {:?})", self.entity, self.context)
    }
}

/// Opaque identifier of a constructed view object.
///
/// What it indexes into is up to the host (widget arena, retained tree, ...).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u64);

impl ViewId {
    /// Creates a view id from its raw representation.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw representation of this id.
    #[must_use]
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ViewId").field(&self.0).finish()
    }
}
