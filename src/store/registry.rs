//! Listener registry shared between a store and the subscription handles it hands out.

use super::{Collection, Listener, RawRecord};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

/// Registered listeners per collection, plus the last list each collection published.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: HashMap<Collection, Vec<(u64, Listener)>>,
    last_published: HashMap<Collection, Vec<RawRecord>>,
}

impl ListenerRegistry {
    /// Adds a listener and returns its id.
    pub fn add(&mut self, collection: Collection, listener: Listener) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.listeners
            .entry(collection)
            .or_default()
            .push((id, listener));
        id
    }

    /// Removes a listener; unknown ids are ignored.
    pub fn remove(&mut self, collection: Collection, id: u64) {
        if let Some(list) = self.listeners.get_mut(&collection) {
            list.retain(|(listener_id, _)| *listener_id != id);
            if list.is_empty() {
                self.listeners.remove(&collection);
                self.last_published.remove(&collection);
            }
        }
    }

    /// Clones out the listeners of a collection so they can run without the lock held.
    #[must_use]
    pub fn listeners(&self, collection: Collection) -> Vec<Listener> {
        self.listeners
            .get(&collection)
            .map(|list| list.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default()
    }

    /// Number of listeners registered for a collection
    #[must_use]
    pub fn listener_count(&self, collection: Collection) -> usize {
        self.listeners.get(&collection).map_or(0, Vec::len)
    }

    /// Collections with at least one listener
    #[must_use]
    pub fn subscribed_collections(&self) -> Vec<Collection> {
        let mut collections: Vec<Collection> = self.listeners.keys().copied().collect();
        collections.sort();
        collections
    }

    /// Remembers `records` as the latest published list. Returns `true` if it differs from
    /// the previous one.
    pub fn record_published(&mut self, collection: Collection, records: &[RawRecord]) -> bool {
        if self
            .last_published
            .get(&collection)
            .is_some_and(|last| last.as_slice() == records)
        {
            return false;
        }
        self.last_published.insert(collection, records.to_vec());
        true
    }
}

pub(crate) type SharedRegistry = Arc<Mutex<ListenerRegistry>>;

/// Locks the registry, recovering from poisoning; listener panics never run under this lock.
pub(crate) fn lock(registry: &Mutex<ListenerRegistry>) -> MutexGuard<'_, ListenerRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Active subscription to one collection. Dropping it stops further deliveries.
pub struct Subscription {
    collection: Collection,
    id: u64,
    registry: Weak<Mutex<ListenerRegistry>>,
}

impl Subscription {
    pub(crate) fn new(collection: Collection, id: u64, registry: &SharedRegistry) -> Self {
        Self {
            collection,
            id,
            registry: Arc::downgrade(registry),
        }
    }

    /// Collection this subscription delivers
    #[must_use]
    pub const fn collection(&self) -> Collection {
        self.collection
    }

    /// Stops deliveries now. Writes already dispatched still complete.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).remove(self.collection, self.id);
            tracing::debug!(collection = %self.collection, id = self.id, "Listener removed");
        }
        self.registry = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("collection", &self.collection)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
