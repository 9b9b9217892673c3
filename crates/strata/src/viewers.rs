//! Id-keyed lookup of live viewers.
//!
//! Tools hold a [`ViewerId`] instead of a reference to the viewer they act on
//! and resolve it through the registry when needed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Viewer;

/// Opaque handle to a registered viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewerId(u64);

impl ViewerId {
    /// Returns the raw id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer#{}", self.0)
    }
}

/// Owns viewers and hands out ids that are never reused.
#[derive(Debug)]
pub struct ViewerRegistry<T = Viewer> {
    entries: BTreeMap<ViewerId, T>,
    next_id: u64,
}

impl<T> Default for ViewerRegistry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<T> ViewerRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a viewer and returns its id.
    pub fn insert(&mut self, viewer: T) -> ViewerId {
        let id = ViewerId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, viewer);
        log::info!("registered {id}");
        id
    }

    /// Looks up a viewer.
    pub fn get(&self, id: ViewerId) -> Option<&T> {
        self.entries.get(&id)
    }

    /// Looks up a viewer mutably.
    pub fn get_mut(&mut self, id: ViewerId) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    /// Unregisters a viewer, returning it if it was present.
    pub fn remove(&mut self, id: ViewerId) -> Option<T> {
        let removed = self.entries.remove(&id);
        if removed.is_some() {
            log::info!("removed {id}");
        }
        removed
    }

    /// Returns whether `id` is registered.
    pub fn contains(&self, id: ViewerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Ids of all registered viewers, oldest first.
    pub fn ids(&self) -> Vec<ViewerId> {
        self.entries.keys().copied().collect()
    }

    /// Number of registered viewers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no viewer is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_not_reused() {
        let mut registry: ViewerRegistry<&str> = ViewerRegistry::new();
        let a = registry.insert("a");
        let b = registry.insert("b");
        assert_ne!(a, b);
        assert_eq!(registry.remove(a), Some("a"));
        assert_eq!(registry.remove(a), None);

        let c = registry.insert("c");
        assert_ne!(a, c);
        assert_eq!(registry.ids(), vec![b, c]);
        assert_eq!(registry.get(c), Some(&"c"));
        assert!(!registry.contains(a));
    }

    #[test]
    fn test_len_tracks_inserts_and_removes() {
        let mut registry = ViewerRegistry::new();
        assert!(registry.is_empty());
        let id = registry.insert(());
        registry.insert(());
        assert_eq!(registry.len(), 2);
        registry.remove(id);
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_get_mut() {
        let mut registry = ViewerRegistry::new();
        let id = registry.insert(1);
        *registry.get_mut(id).unwrap() += 1;
        assert_eq!(registry.get(id), Some(&2));
        assert_eq!(id.to_string(), "viewer#0");
    }
}
