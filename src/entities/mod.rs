//! Entity module - SeaORM entity definitions for the record store.
//! Every collection shares a single table; rows are keyed by collection name and record id.

pub mod record;

pub use record::{Column as RecordColumn, Entity as Record, Model as RecordModel};
