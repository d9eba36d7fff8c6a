// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The owned "find the view for this model" map.

use canopy_state::EntityId;
use hashbrown::HashMap;

use crate::key::{ViewId, ViewKey};

/// Maps view keys to constructed views.
///
/// This is an ordinary owned object: the root view creates one and hands
/// references to whoever needs lookup. Keeping it explicit (rather than a
/// process-wide map) means a second editor window is just a second registry.
///
/// # Example
///
/// ```
/// use canopy_state::EntityId;
/// use canopy_view::{ViewContext, ViewId, ViewKey, ViewRegistry};
///
/// const CANVAS: ViewContext = ViewContext::new(0);
///
/// let mut registry = ViewRegistry::new();
/// let key = ViewKey::new(EntityId::from_raw(1), CANVAS);
///
/// assert_eq!(registry.register(key, ViewId::from_raw(10)), None);
/// assert_eq!(registry.get(key), Some(ViewId::from_raw(10)));
///
/// assert_eq!(registry.remove(key), Some(ViewId::from_raw(10)));
/// assert_eq!(registry.get(key), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ViewRegistry {
    views: HashMap<ViewKey, ViewId>,
}

impl ViewRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Returns `true` if no views are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Registers the view for a key, returning the displaced view if the key
    /// was already bound.
    pub fn register(&mut self, key: ViewKey, view: ViewId) -> Option<ViewId> {
        self.views.insert(key, view)
    }

    /// Removes the binding for a key.
    pub fn remove(&mut self, key: ViewKey) -> Option<ViewId> {
        self.views.remove(&key)
    }

    /// Returns the view bound to a key, if any.
    #[must_use]
    pub fn get(&self, key: ViewKey) -> Option<ViewId> {
        self.views.get(&key).copied()
    }

    /// Returns `true` if the key has a bound view.
    #[must_use]
    pub fn contains(&self, key: ViewKey) -> bool {
        self.views.contains_key(&key)
    }

    /// Returns every view of the given entity, across contexts.
    pub fn views_of(&self, entity: EntityId) -> impl Iterator<Item = (ViewKey, ViewId)> + '_ {
        self.views
            .iter()
            .filter(move |(k, _)| k.entity == entity)
            .map(|(k, v)| (*k, *v))
    }

    /// Removes every view of the given entity, across contexts.
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.views.retain(|k, _| k.entity != entity);
    }

    /// Returns an iterator over all bindings.
    pub fn iter(&self) -> impl Iterator<Item = (ViewKey, ViewId)> + '_ {
        self.views.iter().map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ViewContext;

    const CANVAS: ViewContext = ViewContext::new(0);
    const INSPECTOR: ViewContext = ViewContext::new(1);

    fn key(raw: u64, context: ViewContext) -> ViewKey {
        ViewKey::new(EntityId::from_raw(raw), context)
    }

    #[test]
    fn contexts_are_independent() {
        let mut registry = ViewRegistry::new();
        registry.register(key(1, CANVAS), ViewId::from_raw(10));
        registry.register(key(1, INSPECTOR), ViewId::from_raw(11));

        assert_eq!(registry.get(key(1, CANVAS)), Some(ViewId::from_raw(10)));
        assert_eq!(registry.get(key(1, INSPECTOR)), Some(ViewId::from_raw(11)));
        assert_eq!(registry.views_of(EntityId::from_raw(1)).count(), 2);
    }

    #[test]
    fn register_displaces() {
        let mut registry = ViewRegistry::new();
        assert_eq!(registry.register(key(1, CANVAS), ViewId::from_raw(10)), None);
        assert_eq!(
            registry.register(key(1, CANVAS), ViewId::from_raw(20)),
            Some(ViewId::from_raw(10))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_entity_clears_all_contexts() {
        let mut registry = ViewRegistry::new();
        registry.register(key(1, CANVAS), ViewId::from_raw(10));
        registry.register(key(1, INSPECTOR), ViewId::from_raw(11));
        registry.register(key(2, CANVAS), ViewId::from_raw(12));

        registry.remove_entity(EntityId::from_raw(1));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(key(2, CANVAS)));
    }
}
