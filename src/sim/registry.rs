//! Session-owned object registry
//!
//! Live objects (bodies, effects) keyed by a stable id. Collision events and
//! debugging tools look objects up here instead of through global handles;
//! a lookup for an id that was never registered or already removed simply
//! yields nothing.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Identifier of a registered object, unique within one registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId(pub u32);

/// Objects of one kind, iterated in id (creation) order
#[derive(Debug, Clone, Serialize)]
pub struct Registry<T> {
    next_id: u32,
    items: BTreeMap<EntityId, T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            items: BTreeMap::new(),
        }
    }

    /// Register an object and return its new id
    pub fn insert(&mut self, item: T) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.items.insert(id, item);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        self.items.remove(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.items.iter_mut().map(|(id, item)| (*id, item))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    /// Keep only objects matching `keep`; returns the ids removed
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<EntityId>
    where
        F: FnMut(EntityId, &T) -> bool,
    {
        let removed: Vec<EntityId> = self
            .items
            .iter()
            .filter(|(id, item)| !keep(**id, *item))
            .map(|(id, _)| *id)
            .collect();
        for id in &removed {
            self.items.remove(id);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Turns per-tick overlap lists into contact-start events
#[derive(Debug, Default, Clone)]
pub struct ContactTracker {
    touching: BTreeSet<(EntityId, EntityId)>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs in `current` that were not touching last time
    pub fn begin(&mut self, current: Vec<(EntityId, EntityId)>) -> Vec<(EntityId, EntityId)> {
        let current: BTreeSet<(EntityId, EntityId)> = current
            .into_iter()
            .map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
            .collect();
        let started = current.difference(&self.touching).copied().collect();
        self.touching = current;
        started
    }

    pub fn clear(&mut self) {
        self.touching.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_not_reused() {
        let mut reg = Registry::new();
        let a = reg.insert("a");
        reg.remove(a);
        let b = reg.insert("b");
        assert_ne!(a, b);
        assert!(reg.get(a).is_none());
        assert_eq!(reg.get(b), Some(&"b"));
    }

    #[test]
    fn test_retain_reports_removed() {
        let mut reg = Registry::new();
        let a = reg.insert(1);
        let b = reg.insert(2);
        let c = reg.insert(3);
        let removed = reg.retain(|_, v| *v != 2);
        assert_eq!(removed, vec![b]);
        let ids: Vec<EntityId> = reg.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, c]);
    }
}
