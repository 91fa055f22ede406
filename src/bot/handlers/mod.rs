//! Discord interaction handlers
//!
//! Handlers for Discord interactions other than commands, such as autocomplete.

/// Autocomplete handlers for product ids, need ids, categories and suppliers
pub mod autocomplete;
