//! List synchronization - a live, ordered mirror of one collection.
//!
//! A [`ListSync`] subscribes to its record type's collection and, on every change the store
//! pushes, decodes and re-sorts the whole list and hands it to every observer. Nothing is
//! diffed: each delivery replaces the previous list outright.

use crate::{
    core::CollectionRecord,
    errors::StoreError,
    store::{Listener, RawRecord, RemoteStore},
};
use std::{
    fmt,
    marker::PhantomData,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, info, warn};

/// Callback receiving each freshly sorted snapshot
pub type Observer<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

/// Handle for removing an observer again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct Mirror<T> {
    snapshot: Vec<T>,
    loaded: bool,
    next_id: u64,
    observers: Vec<(u64, Observer<T>)>,
}

impl<T> Default for Mirror<T> {
    fn default() -> Self {
        Self {
            snapshot: Vec::new(),
            loaded: false,
            next_id: 0,
            observers: Vec::new(),
        }
    }
}

fn lock<T>(mirror: &Mutex<Mirror<T>>) -> MutexGuard<'_, Mirror<T>> {
    mirror.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decodes and sorts a raw store list. Records that fail to decode are logged and skipped.
#[must_use]
pub fn rebuild<T: CollectionRecord>(records: &[RawRecord]) -> Vec<T> {
    let mut list: Vec<T> = records
        .iter()
        .filter_map(|raw| match T::from_raw(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping undecodable record: {}", e);
                None
            }
        })
        .collect();
    T::sort_snapshot(&mut list);
    list
}

fn apply_change<T: CollectionRecord>(mirror: &Mutex<Mirror<T>>, records: &[RawRecord]) {
    let list = rebuild::<T>(records);
    let observers: Vec<Observer<T>> = {
        let mut mirror = lock(mirror);
        mirror.snapshot.clone_from(&list);
        mirror.loaded = true;
        mirror.observers.iter().map(|(_, o)| Arc::clone(o)).collect()
    };

    debug!(
        collection = %T::COLLECTION,
        records = list.len(),
        observers = observers.len(),
        "Snapshot rebuilt"
    );
    for observer in observers {
        observer(&list);
    }
}

/// Live mirror of the collection holding `T`.
pub struct ListSync<T: CollectionRecord, S: RemoteStore> {
    store: Arc<S>,
    mirror: Arc<Mutex<Mirror<T>>>,
    subscription: Option<S::Subscription>,
    _record: PhantomData<fn() -> T>,
}

impl<T: CollectionRecord, S: RemoteStore> ListSync<T, S> {
    /// Creates an unmounted mirror over `store`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            mirror: Arc::default(),
            subscription: None,
            _record: PhantomData,
        }
    }

    /// Starts listening to the collection. Mounting an already mounted mirror does nothing.
    ///
    /// # Errors
    /// Returns the store's error if the initial load fails; the mirror stays unmounted.
    pub async fn mount(&mut self) -> Result<(), StoreError> {
        if self.subscription.is_some() {
            debug!(collection = %T::COLLECTION, "Already mounted");
            return Ok(());
        }

        let mirror = Arc::clone(&self.mirror);
        let listener: Listener =
            Arc::new(move |records: &[RawRecord]| apply_change(&mirror, records));
        let subscription = self.store.subscribe(T::COLLECTION, listener).await?;
        self.subscription = Some(subscription);

        info!(collection = %T::COLLECTION, "List sync mounted");
        Ok(())
    }

    /// Stops listening. The last snapshot stays readable.
    pub fn unmount(&mut self) {
        if self.subscription.take().is_some() {
            info!(collection = %T::COLLECTION, "List sync unmounted");
        }
    }

    /// Whether a subscription is active
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// True until the first snapshot has arrived
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !lock(&self.mirror).loaded
    }

    /// The latest sorted snapshot
    #[must_use]
    pub fn current(&self) -> Vec<T> {
        lock(&self.mirror).snapshot.clone()
    }

    /// Registers an observer. If a snapshot has already arrived, the observer receives it
    /// right away.
    pub fn observe(&self, observer: impl Fn(&[T]) + Send + Sync + 'static) -> ObserverId {
        let observer: Observer<T> = Arc::new(observer);
        let (id, initial) = {
            let mut mirror = lock(&self.mirror);
            mirror.next_id += 1;
            let id = mirror.next_id;
            mirror.observers.push((id, Arc::clone(&observer)));
            (id, mirror.loaded.then(|| mirror.snapshot.clone()))
        };

        if let Some(snapshot) = initial {
            observer(&snapshot);
        }
        ObserverId(id)
    }

    /// Removes an observer. Returns `false` if it was not registered.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut mirror = lock(&self.mirror);
        let before = mirror.observers.len();
        mirror.observers.retain(|(observer_id, _)| *observer_id != id.0);
        mirror.observers.len() != before
    }
}

impl<T: CollectionRecord, S: RemoteStore> fmt::Debug for ListSync<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListSync")
            .field("collection", &T::COLLECTION)
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}
