//! Record entity - one row per stored product or need.
//!
//! The store keeps records as a flat key-value tree: each row holds the collection it belongs
//! to, its generated id, and a JSON object with the record's fields. Typed decoding happens
//! above the store, so adding a field to a record type never touches this table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Record database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "records")]
pub struct Model {
    /// Collection name (`products` or `needs`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection: String,
    /// Generated record id, unique within the collection
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Flat field map of the record, always a JSON object
    pub fields: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
