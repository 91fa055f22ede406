//! Realtime record store on top of `SeaORM`.
//!
//! Every committed write is followed by a re-read of the affected collection, which is then
//! pushed to every listener of that collection. Deliveries are serialized: a list read later
//! is never delivered before one read earlier, so a deleted record cannot reappear through a
//! stale delivery racing a concurrent add. Changes made by other processes sharing the
//! database are picked up by [`RealtimeStore::spawn_change_poller`].

use super::{
    Collection, Fields, Listener, RawRecord, RemoteStore, UPDATED_AT,
    registry::{self, SharedRegistry, Subscription},
    tree,
};
use crate::{
    entities::{Record, record},
    errors::StoreError,
};
use chrono::{SecondsFormat, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::{
    sync::{Arc, Weak},
    time::Duration,
};
use tokio::{sync::Mutex as AsyncMutex, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, error, info, instrument};

/// Store-assigned timestamp, RFC 3339 in UTC with microseconds.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Realtime store backed by a `SeaORM` connection.
pub struct RealtimeStore {
    db: DatabaseConnection,
    registry: SharedRegistry,
    delivery: AsyncMutex<()>,
    merges: AsyncMutex<()>,
}

impl RealtimeStore {
    /// Wraps an open connection. Tables must already exist.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            registry: SharedRegistry::default(),
            delivery: AsyncMutex::new(()),
            merges: AsyncMutex::new(()),
        }
    }

    /// Underlying database connection
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Number of live listeners on a collection
    #[must_use]
    pub fn listener_count(&self, collection: Collection) -> usize {
        registry::lock(&self.registry).listener_count(collection)
    }

    /// Reads the full current list of a collection, ordered by id.
    ///
    /// # Errors
    /// Returns `StoreError::Database` if the query fails.
    pub async fn snapshot(&self, collection: Collection) -> Result<Vec<RawRecord>, StoreError> {
        let rows = Record::find()
            .filter(record::Column::Collection.eq(collection.as_str()))
            .order_by_asc(record::Column::Id)
            .all(&self.db)
            .await?;

        Ok(tree::records_from_rows(
            collection,
            rows.into_iter().map(|row| (row.id, row.fields)),
        ))
    }

    /// Re-reads a collection and delivers it to all of its listeners.
    ///
    /// Runs after a committed write, so a failed re-read is logged rather than returned:
    /// the write itself succeeded.
    async fn publish(&self, collection: Collection) {
        let _delivery = self.delivery.lock().await;
        match self.snapshot(collection).await {
            Ok(records) => {
                self.deliver(collection, &records, true);
            }
            Err(e) => error!(%collection, "Failed to re-read collection after write: {}", e),
        };
    }

    /// Hands `records` to every listener. With `force == false`, nothing is delivered when
    /// the list matches what was last published. Returns whether a delivery happened.
    fn deliver(&self, collection: Collection, records: &[RawRecord], force: bool) -> bool {
        let listeners = {
            let mut registry = registry::lock(&self.registry);
            let changed = registry.record_published(collection, records);
            if !changed && !force {
                return false;
            }
            registry.listeners(collection)
        };

        debug!(
            %collection,
            records = records.len(),
            listeners = listeners.len(),
            "Delivering snapshot"
        );
        for listener in listeners {
            listener(records);
        }
        true
    }

    /// Re-reads every subscribed collection and delivers the ones that changed since the
    /// last delivery. Returns how many collections were delivered.
    pub async fn poll_changes(&self) -> usize {
        let collections = registry::lock(&self.registry).subscribed_collections();
        let mut delivered = 0;

        for collection in collections {
            let _delivery = self.delivery.lock().await;
            match self.snapshot(collection).await {
                Ok(records) => {
                    if self.deliver(collection, &records, false) {
                        delivered += 1;
                    }
                }
                // The subscription stays registered; the next poll retries
                Err(e) => error!(%collection, "Change poll failed: {}", e),
            }
        }
        delivered
    }

    /// Starts a background task that calls [`RealtimeStore::poll_changes`] every `period`.
    ///
    /// The task ends on its own once the store is dropped.
    pub fn spawn_change_poller(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        info!("Polling for external changes every {:?}", period);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    debug!("Store dropped, stopping change poller");
                    break;
                };
                store.poll_changes().await;
            }
        })
    }
}

impl RemoteStore for RealtimeStore {
    type Subscription = Subscription;

    #[instrument(skip(self, listener))]
    async fn subscribe(
        &self,
        collection: Collection,
        listener: Listener,
    ) -> Result<Subscription, StoreError> {
        let _delivery = self.delivery.lock().await;
        let records = self.snapshot(collection).await?;

        let id = {
            let mut registry = registry::lock(&self.registry);
            registry.record_published(collection, &records);
            registry.add(collection, Arc::clone(&listener))
        };
        listener(&records);

        debug!(%collection, id, "Listener registered");
        Ok(Subscription::new(collection, id, &self.registry))
    }

    #[instrument(skip(self, fields))]
    async fn create(&self, collection: Collection, fields: Fields) -> Result<String, StoreError> {
        let id = ulid::Ulid::new().to_string();
        let fields = tree::prepare_new_fields(collection, fields, &now_timestamp());

        let row = record::ActiveModel {
            collection: Set(collection.as_str().to_string()),
            id: Set(id.clone()),
            fields: Set(Json::Object(fields)),
        };
        Record::insert(row).exec_without_returning(&self.db).await?;
        info!(%collection, %id, "Record created");

        self.publish(collection).await;
        Ok(id)
    }

    #[instrument(skip(self, fields))]
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        // Merges run one at a time so no update writes back fields it read stale
        let merge = self.merges.lock().await;
        let existing = Record::find_by_id((collection.as_str().to_string(), id.to_string()))
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::RecordNotFound {
                collection,
                id: id.to_string(),
            })?;

        let mut merged = match &existing.fields {
            Json::Object(current) => current.clone(),
            other => {
                return Err(StoreError::MalformedPayload {
                    collection,
                    id: id.to_string(),
                    message: format!("expected an object, found {other}"),
                });
            }
        };
        tree::merge_fields(&mut merged, fields);
        merged.insert(UPDATED_AT.to_string(), Json::String(now_timestamp()));

        let mut row: record::ActiveModel = existing.into();
        row.fields = Set(Json::Object(merged));
        row.update(&self.db).await?;
        drop(merge);
        info!(%collection, %id, "Record updated");

        self.publish(collection).await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let result = Record::delete_by_id((collection.as_str().to_string(), id.to_string()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            debug!(%collection, %id, "Delete of missing record ignored");
            return Ok(());
        }
        info!(%collection, %id, "Record deleted");

        self.publish(collection).await;
        Ok(())
    }
}
