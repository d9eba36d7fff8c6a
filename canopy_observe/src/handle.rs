// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handles naming containers and observers.

use core::fmt;

/// Names one state container for dependency declarations.
///
/// A container id is a lightweight handle (a single `u16`) that hosts define
/// as constants, one per container in their world, and that observers return
/// from [`Observer::reads`](crate::Observer::reads) and
/// [`Observer::writes`](crate::Observer::writes). The engine never touches
/// containers itself — ids exist purely so it can order observers.
///
/// # Example
///
/// ```
/// use canopy_observe::ContainerId;
///
/// const SCENE: ContainerId = ContainerId::new(0);
/// const SPACE: ContainerId = ContainerId::new(1);
/// const CULL: ContainerId = ContainerId::new(2);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(u16);

impl ContainerId {
    /// Creates a new container id with the given index.
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the index of this id.
    #[must_use]
    pub const fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContainerId").field(&self.0).finish()
    }
}

/// Identifies a registered observer within an [`Engine`](crate::Engine).
///
/// Ids stay valid across pause/resume and are never reused after
/// unregistration.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u32);

impl fmt::Debug for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObserverId").field(&self.0).finish()
    }
}
