//! Typed records and their mapping to and from the stored field tree.

use crate::{
    errors::{Error, Result, StoreError},
    store::{Collection, Fields, RawRecord},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A record type living in one store collection.
pub trait CollectionRecord: Clone + Send + Sync + 'static {
    /// Collection this record type is stored in
    const COLLECTION: Collection;

    /// Decodes a raw store record.
    ///
    /// # Errors
    /// Returns `StoreError::MalformedPayload` if the fields don't describe this type.
    fn from_raw(raw: &RawRecord) -> std::result::Result<Self, StoreError>;

    /// Store-assigned id
    fn id(&self) -> &str;

    /// Name shown to users when asking them to confirm a change
    fn display_name(&self) -> &str;

    /// Puts a freshly decoded list into display order.
    fn sort_snapshot(records: &mut [Self]);
}

/// Deserializes the fields of `raw` into `T`.
pub(crate) fn decode_fields<T: DeserializeOwned>(
    collection: Collection,
    raw: &RawRecord,
) -> std::result::Result<T, StoreError> {
    serde_json::from_value(Value::Object(raw.fields.clone())).map_err(|e| {
        StoreError::MalformedPayload {
            collection,
            id: raw.id.clone(),
            message: e.to_string(),
        }
    })
}

/// Trims a required name, rejecting blank input.
pub(crate) fn required_name(name: &str, what: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{what} name cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trims optional text; blank input counts as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Inserts optional text into a new record's fields, skipping absent values.
pub(crate) fn put_optional(fields: &mut Fields, key: &str, value: Option<String>) {
    if let Some(text) = optional_text(value) {
        fields.insert(key.to_string(), Value::String(text));
    }
}

/// Inserts optional text into a patch. A blank value becomes `null`, which clears the field.
pub(crate) fn patch_optional(fields: &mut Fields, key: &str, value: Option<String>) {
    if let Some(text) = value {
        let cleared = optional_text(Some(text)).map_or(Value::Null, Value::String);
        fields.insert(key.to_string(), cleared);
    }
}

/// Checks that an embedded photo is an image `data:` URL.
pub(crate) fn validate_photo(photo: &str) -> Result<()> {
    if photo.starts_with("data:image/") && photo.contains(";base64,") {
        Ok(())
    } else {
        Err(Error::validation("Photo must be an embedded image"))
    }
}
