// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-tag keyed view factories with explicit fallback chains.

use core::fmt;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::key::ViewKey;

/// A type tag identifying one model variant.
///
/// Model code assigns each variant a tag at startup; the tag stands in for
/// runtime type inspection. A variant's *fallback chain* — the ordered list
/// of tags to try when the variant itself has no factory — is likewise
/// explicit, written out where the variant is defined instead of discovered
/// by walking a type hierarchy.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct TypeTag(u16);

impl TypeTag {
    /// Creates a new tag with the given index.
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the index of this tag.
    #[must_use]
    pub const fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeTag").field(&self.0).finish()
    }
}

/// Error returned by [`FactoryRegistry::register`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegisterError {
    /// A factory with the same tag and the same priority already exists.
    ///
    /// Two registrations tied on priority have no deterministic winner, so
    /// this is rejected outright; registries are populated at startup, where
    /// the failure is immediately actionable.
    PriorityTie {
        /// The contested tag.
        tag: TypeTag,
        /// The tied priority.
        priority: u8,
    },
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PriorityTie { tag, priority } => write!(
                f,
                "factory for {tag:?} already registered at priority {priority}"
            ),
        }
    }
}

impl core::error::Error for RegisterError {}

struct Registration<V> {
    priority: u8,
    make: fn(ViewKey) -> V,
}

impl<V> fmt::Debug for Registration<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Maps type tags to view factories, populated once at startup.
///
/// Lookup takes the model's fallback chain — the variant's own tag first,
/// then progressively more generic tags — and returns the first registered
/// factory. Re-registering a tag keeps whichever registration has the higher
/// priority; a tie is a hard error.
///
/// # Example
///
/// ```
/// use canopy_state::EntityId;
/// use canopy_view::{FactoryRegistry, TypeTag, ViewContext, ViewKey};
///
/// const PROCESS_NODE: TypeTag = TypeTag::new(0);
/// const ANY_NODE: TypeTag = TypeTag::new(1);
///
/// #[derive(Debug, PartialEq)]
/// enum Widget {
///     Node,
/// }
///
/// let mut factories = FactoryRegistry::new();
/// factories.register(ANY_NODE, 0, |_key| Widget::Node).unwrap();
///
/// // No factory for the specific variant: the chain falls back.
/// let key = ViewKey::new(EntityId::from_raw(1), ViewContext::new(0));
/// let widget = factories.create(&[PROCESS_NODE, ANY_NODE], key);
/// assert_eq!(widget, Some(Widget::Node));
/// ```
#[derive(Debug)]
pub struct FactoryRegistry<V> {
    factories: HashMap<TypeTag, Registration<V>>,
}

impl<V> Default for FactoryRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FactoryRegistry<V> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a factory for a tag at the given priority.
    ///
    /// A higher-priority registration replaces a lower one; a lower one is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::PriorityTie`] if the tag already has a
    /// factory at exactly this priority.
    pub fn register(
        &mut self,
        tag: TypeTag,
        priority: u8,
        make: fn(ViewKey) -> V,
    ) -> Result<(), RegisterError> {
        match self.factories.entry(tag) {
            Entry::Vacant(slot) => {
                slot.insert(Registration { priority, make });
                Ok(())
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get().priority;
                if existing == priority {
                    return Err(RegisterError::PriorityTie { tag, priority });
                }
                if priority > existing {
                    slot.insert(Registration { priority, make });
                }
                Ok(())
            }
        }
    }

    /// Returns `true` if the tag has a registered factory.
    #[must_use]
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.factories.contains_key(&tag)
    }

    /// Returns the first tag in the chain that has a factory.
    #[must_use]
    pub fn resolve(&self, chain: &[TypeTag]) -> Option<TypeTag> {
        chain.iter().copied().find(|t| self.contains(*t))
    }

    /// Builds a view for `key` using the first factory found along the chain.
    #[must_use]
    pub fn create(&self, chain: &[TypeTag], key: ViewKey) -> Option<V> {
        let tag = self.resolve(chain)?;
        let registration = self.factories.get(&tag)?;
        Some((registration.make)(key))
    }
}
