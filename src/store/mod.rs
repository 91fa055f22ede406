//! Remote store adapter - subscribe/create/update/delete against named record collections.
//!
//! The store holds each collection as a flat tree of `id -> fields`. Consumers see it as an
//! ordered list of [`RawRecord`]s and never touch the tree layout directly. Writes are not
//! serialized on the client: concurrent updates to the same record race and the last one wins.

/// Listener bookkeeping and subscription handles
pub mod registry;
/// SeaORM-backed realtime store
pub mod realtime;
/// Conversions between the stored field tree and record lists
pub mod tree;

pub use realtime::RealtimeStore;
pub use registry::Subscription;

use crate::errors::StoreError;
use serde::{Deserialize, Serialize};
use std::{fmt, future::Future, sync::Arc};

/// Flat field map of a single record
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Field holding the creation timestamp, written once by the store
pub const CREATED_AT: &str = "createdAt";
/// Field holding the last-update timestamp, refreshed on every update
pub const UPDATED_AT: &str = "updatedAt";
/// Reserved key; ids live beside the fields, never inside them
pub const ID: &str = "id";
/// Need status field, defaulted on creation
pub const STATUS: &str = "status";

/// A named group of records of one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Warehouse stock
    Products,
    /// Lab purchase requests
    Needs,
}

impl Collection {
    /// Name of the collection in the stored tree
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Needs => "needs",
        }
    }

    /// Fields written on creation when the caller did not supply them.
    #[must_use]
    pub fn creation_defaults(self) -> Fields {
        let mut defaults = Fields::new();
        if self == Self::Needs {
            defaults.insert(STATUS.to_string(), "pending".into());
        }
        defaults
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record as delivered by the store: its id plus untyped fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Store-assigned id
    pub id: String,
    /// Flat field map
    pub fields: Fields,
}

/// Callback invoked with the full current list of a collection.
pub type Listener = Arc<dyn Fn(&[RawRecord]) + Send + Sync>;

/// Contract of a realtime record store.
///
/// Implementations push the full list of a collection to every listener each time it
/// changes; the initial load counts as a change.
pub trait RemoteStore: Send + Sync + 'static {
    /// Handle returned by [`RemoteStore::subscribe`]; dropping it unsubscribes.
    type Subscription: Send + Sync + 'static;

    /// Registers `listener` for `collection` and delivers the current list to it once.
    fn subscribe(
        &self,
        collection: Collection,
        listener: Listener,
    ) -> impl Future<Output = Result<Self::Subscription, StoreError>> + Send;

    /// Writes a new record and returns its generated id.
    fn create(
        &self,
        collection: Collection,
        fields: Fields,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Merges `fields` into an existing record. Omitted fields are kept.
    fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes a record. Deleting a missing id succeeds.
    fn delete(
        &self,
        collection: Collection,
        id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
