//! Translation between the stored `id -> fields` tree and record lists.

use super::{CREATED_AT, Collection, Fields, ID, RawRecord};
use serde_json::Value;
use tracing::warn;

/// Converts stored rows into an ordered record list.
///
/// Rows whose value is not a JSON object cannot be represented as flat records; they are
/// logged and left out.
pub fn records_from_rows(
    collection: Collection,
    rows: impl IntoIterator<Item = (String, Value)>,
) -> Vec<RawRecord> {
    rows.into_iter()
        .filter_map(|(id, value)| match value {
            Value::Object(fields) => Some(RawRecord { id, fields }),
            other => {
                warn!(
                    %collection,
                    %id,
                    "Skipping record whose payload is not an object: {other}"
                );
                None
            }
        })
        .collect()
}

/// Builds the field map written for a new record.
///
/// Null values and a stray `id` key are dropped, the creation timestamp is stamped, and the
/// collection's defaults fill in anything the caller left out.
#[must_use]
pub fn prepare_new_fields(collection: Collection, fields: Fields, now: &str) -> Fields {
    let mut prepared: Fields = fields
        .into_iter()
        .filter(|(key, value)| key != ID && !value.is_null())
        .collect();

    for (key, value) in collection.creation_defaults() {
        prepared.entry(key).or_insert(value);
    }
    prepared.insert(CREATED_AT.to_string(), Value::String(now.to_string()));
    prepared
}

/// Shallow-merges `patch` into `target`.
///
/// Present keys overwrite, `null` removes the key, keys absent from the patch are kept.
/// `id` and the creation timestamp can never be changed through a patch.
pub fn merge_fields(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        if key == ID || key == CREATED_AT {
            continue;
        }
        if value.is_null() {
            target.remove(&key);
        } else {
            target.insert(key, value);
        }
    }
}
