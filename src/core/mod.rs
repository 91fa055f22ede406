//! Core business logic - framework-agnostic record types, validation, ordering and derived views.

/// Lab purchase requests
pub mod need;
/// Warehouse stock
pub mod product;
/// Typed records and their mapping to stored fields
pub mod record;
/// Dashboard figures
pub mod report;
/// Lenient deserializers for fields written by older clients
pub mod serde_helpers;

pub use need::{Need, NeedDraft, NeedPatch, NeedStatus, Priority};
pub use product::{CategoryFilter, Product, ProductDraft, ProductPatch};
pub use record::CollectionRecord;
