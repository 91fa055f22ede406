//! Shared test utilities for `WarehouseBuddy`.
//!
//! Helpers for setting up an in-memory store, building field maps and records with sensible
//! defaults, and a recording fake of the remote store.
#![allow(clippy::unwrap_used, dead_code)]

use crate::{
    core::{Need, NeedStatus, Priority, Product},
    entities::{Record, record},
    errors::{Result, StoreError},
    store::{Collection, Fields, Listener, RawRecord, RealtimeStore, RemoteStore},
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set};
use serde_json::Value;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;

/// Password used by gate tests
pub const TEST_SECRET: &str = "test-secret";

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a realtime store over a fresh in-memory database.
pub async fn setup_test_store() -> Result<RealtimeStore> {
    Ok(RealtimeStore::new(setup_test_db().await?))
}

/// Turns a `json!` object literal into a field map.
///
/// # Panics
/// If `value` is not an object.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// A listener that records every list it receives.
pub fn snapshot_sink() -> (Arc<Mutex<Vec<Vec<RawRecord>>>>, Listener) {
    let deliveries: Arc<Mutex<Vec<Vec<RawRecord>>>> = Arc::default();
    let sink = Arc::clone(&deliveries);
    let listener: Listener = Arc::new(move |records: &[RawRecord]| {
        sink.lock().unwrap().push(records.to_vec());
    });
    (deliveries, listener)
}

/// Writes a row straight into the table, bypassing the store. Listeners are not notified,
/// so this stands in for a write made by another client.
pub async fn insert_raw(
    store: &RealtimeStore,
    collection: Collection,
    id: &str,
    value: Value,
) -> Result<()> {
    let row = record::ActiveModel {
        collection: Set(collection.as_str().to_string()),
        id: Set(id.to_string()),
        fields: Set(value),
    };
    Record::insert(row)
        .exec_without_returning(store.connection())
        .await?;
    Ok(())
}

/// Parses an RFC 3339 timestamp.
pub fn timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
}

/// A product with only the fields sorting and grouping care about.
pub fn sample_product(id: &str, created_at: Option<&str>, category: Option<&str>) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        category: category.map(str::to_string),
        quantity: 1,
        supplier: None,
        arrival_date: None,
        notes: None,
        photo: None,
        created_at: created_at.map(timestamp),
        updated_at: None,
    }
}

/// A pending need with the given priority and creation time.
pub fn sample_need(id: &str, priority: Priority, created_at: &str) -> Need {
    Need {
        id: id.to_string(),
        name: format!("Need {id}"),
        quantity: 1,
        priority,
        status: NeedStatus::Pending,
        link: None,
        notes: None,
        created_at: Some(timestamp(created_at)),
        updated_at: None,
    }
}

/// A store call seen by [`RecordingStore`]
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Subscribe { collection: Collection },
    Create { collection: Collection, fields: Fields },
    Update { collection: Collection, id: String, fields: Fields },
    Delete { collection: Collection, id: String },
}

/// A fake store that records every call and never holds any data.
#[derive(Debug, Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<StoreCall>>,
    fail_writes: bool,
    hold: Option<Arc<Semaphore>>,
    waiting: AtomicUsize,
}

impl RecordingStore {
    /// A store whose writes all fail
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// A store whose writes each wait for a permit from `hold`
    pub fn held(hold: Arc<Semaphore>) -> Self {
        Self {
            hold: Some(hold),
            ..Self::default()
        }
    }

    /// Writes currently waiting on the hold
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Calls seen so far, oldest first
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, call: StoreCall) -> std::result::Result<(), StoreError> {
        if let Some(hold) = &self.hold {
            self.waiting.fetch_add(1, Ordering::SeqCst);
            let _permit = hold.acquire().await;
            self.waiting.fetch_sub(1, Ordering::SeqCst);
        }
        self.calls.lock().unwrap().push(call);
        if self.fail_writes {
            return Err(DbErr::Custom("write rejected".to_string()).into());
        }
        Ok(())
    }
}

impl RemoteStore for RecordingStore {
    type Subscription = ();

    async fn subscribe(
        &self,
        collection: Collection,
        listener: Listener,
    ) -> std::result::Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Subscribe { collection });
        listener(&[]);
        Ok(())
    }

    async fn create(
        &self,
        collection: Collection,
        fields: Fields,
    ) -> std::result::Result<String, StoreError> {
        self.record(StoreCall::Create { collection, fields }).await?;
        Ok(format!("generated-{}", self.calls.lock().unwrap().len()))
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> std::result::Result<(), StoreError> {
        self.record(StoreCall::Update {
            collection,
            id: id.to_string(),
            fields,
        })
        .await
    }

    async fn delete(
        &self,
        collection: Collection,
        id: &str,
    ) -> std::result::Result<(), StoreError> {
        self.record(StoreCall::Delete {
            collection,
            id: id.to_string(),
        })
        .await
    }
}
