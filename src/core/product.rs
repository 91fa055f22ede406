//! Product business logic - warehouse stock records.
//!
//! This module defines the typed product record, the drafts and patches used to create and
//! edit products, and the derived views the warehouse screen needs (category list, category
//! filter). Products are listed newest first.

use super::{
    record::{
        CollectionRecord, decode_fields, optional_text, patch_optional, put_optional,
        required_name, validate_photo,
    },
    serde_helpers::{empty_as_none, lenient_date, lenient_timestamp},
};
use crate::{
    errors::{Error, Result, StoreError},
    store::{Collection, Fields, RawRecord},
};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Format of `arrivalDate` in the stored tree
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A product as read from the store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned id
    #[serde(skip)]
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-form category used for grouping
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<String>,
    /// Units in stock
    #[serde(default)]
    pub quantity: u32,
    /// Where the stock came from
    #[serde(default, deserialize_with = "empty_as_none")]
    pub supplier: Option<String>,
    /// Day the stock arrived
    #[serde(default, deserialize_with = "lenient_date")]
    pub arrival_date: Option<NaiveDate>,
    /// Description
    #[serde(default, deserialize_with = "empty_as_none")]
    pub notes: Option<String>,
    /// Embedded image as a `data:` URL
    #[serde(default, deserialize_with = "empty_as_none")]
    pub photo: Option<String>,
    /// Set by the store on creation
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Set by the store on every update
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CollectionRecord for Product {
    const COLLECTION: Collection = Collection::Products;

    fn from_raw(raw: &RawRecord) -> std::result::Result<Self, StoreError> {
        let mut product: Self = decode_fields(Self::COLLECTION, raw)?;
        product.id.clone_from(&raw.id);
        Ok(product)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    /// Newest first; products without a creation time go last.
    fn sort_snapshot(records: &mut [Self]) {
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

/// Input for creating a product
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    /// Required, trimmed
    pub name: String,
    /// Optional category
    pub category: Option<String>,
    /// Units in stock
    pub quantity: u32,
    /// Optional supplier
    pub supplier: Option<String>,
    /// Defaults to today when absent
    pub arrival_date: Option<NaiveDate>,
    /// Optional description
    pub notes: Option<String>,
    /// Optional embedded image (`data:image/...;base64,...`)
    pub photo: Option<String>,
}

impl ProductDraft {
    /// Draft with just a name and quantity
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
            ..Self::default()
        }
    }

    /// Validates the draft and converts it into the field map written to the store.
    ///
    /// # Errors
    /// Returns `Error::Validation` if the name is blank or the photo is not an embedded image.
    pub fn into_fields(self) -> Result<Fields> {
        let name = required_name(&self.name, "Product")?;
        let photo = optional_text(self.photo);
        if let Some(photo) = &photo {
            validate_photo(photo)?;
        }
        let arrival = self
            .arrival_date
            .unwrap_or_else(|| Local::now().date_naive());

        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::String(name));
        put_optional(&mut fields, "category", self.category);
        fields.insert("quantity".to_string(), Value::from(self.quantity));
        put_optional(&mut fields, "supplier", self.supplier);
        fields.insert(
            "arrivalDate".to_string(),
            Value::String(arrival.format(DATE_FORMAT).to_string()),
        );
        put_optional(&mut fields, "notes", self.notes);
        put_optional(&mut fields, "photo", photo);
        Ok(fields)
    }
}

/// Partial edit of a product. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    /// New name; must not be blank
    pub name: Option<String>,
    /// New category; blank clears it
    pub category: Option<String>,
    /// New quantity
    pub quantity: Option<u32>,
    /// New supplier; blank clears it
    pub supplier: Option<String>,
    /// New arrival date
    pub arrival_date: Option<NaiveDate>,
    /// New description; blank clears it
    pub notes: Option<String>,
    /// `Some(None)` removes the photo
    pub photo: Option<Option<String>>,
}

impl ProductPatch {
    /// Whether the patch changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validates the patch and converts it into the partial field map merged by the store.
    ///
    /// # Errors
    /// Returns `Error::Validation` if the patch is empty, the new name is blank, or the new
    /// photo is not an embedded image.
    pub fn into_fields(self) -> Result<Fields> {
        if self.is_empty() {
            return Err(Error::validation("Nothing to update"));
        }

        let mut fields = Fields::new();
        if let Some(name) = self.name {
            fields.insert(
                "name".to_string(),
                Value::String(required_name(&name, "Product")?),
            );
        }
        patch_optional(&mut fields, "category", self.category);
        if let Some(quantity) = self.quantity {
            fields.insert("quantity".to_string(), Value::from(quantity));
        }
        patch_optional(&mut fields, "supplier", self.supplier);
        if let Some(date) = self.arrival_date {
            fields.insert(
                "arrivalDate".to_string(),
                Value::String(date.format(DATE_FORMAT).to_string()),
            );
        }
        patch_optional(&mut fields, "notes", self.notes);
        match self.photo {
            Some(Some(photo)) => {
                validate_photo(&photo)?;
                fields.insert("photo".to_string(), Value::String(photo));
            }
            Some(None) => {
                fields.insert("photo".to_string(), Value::Null);
            }
            None => {}
        }
        Ok(fields)
    }
}

/// Which products the warehouse view shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Every product
    #[default]
    All,
    /// Only products in this exact category
    Only(String),
}

impl CategoryFilter {
    /// Builds a filter from optional user input; blank or "all" means no filtering.
    #[must_use]
    pub fn from_input(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            None | Some("") => Self::All,
            Some(value) if value.eq_ignore_ascii_case("all") => Self::All,
            Some(value) => Self::Only(value.to_string()),
        }
    }

    /// Whether `product` passes the filter
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => product.category.as_deref() == Some(category.as_str()),
        }
    }
}

/// Unique non-blank categories, sorted.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .filter_map(|p| p.category.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(ToString::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Number of products per category, keyed and ordered by category name.
#[must_use]
pub fn category_counts(products: &[Product]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for category in products.iter().filter_map(|p| p.category.as_deref()) {
        *counts.entry(category.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Products passing `filter`, in their original order.
#[must_use]
pub fn filter_by_category(products: &[Product], filter: &CategoryFilter) -> Vec<Product> {
    products
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect()
}

/// Finds a product in a snapshot by id
#[must_use]
pub fn find_by_id<'a>(products: &'a [Product], id: &str) -> Option<&'a Product> {
    products.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{fields, sample_product, timestamp};
    use serde_json::json;

    #[test]
    fn test_draft_validation() {
        let result = ProductDraft::new("   ", 1).into_fields();
        assert!(matches!(result, Err(Error::Validation { .. })));

        let mut draft = ProductDraft::new("Gloves", 1);
        draft.photo = Some("not-an-image".to_string());
        assert!(matches!(draft.into_fields(), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_draft_into_fields() {
        let draft = ProductDraft {
            name: "  Nitrile gloves ".to_string(),
            category: Some("Consumables".to_string()),
            quantity: 0,
            supplier: Some("   ".to_string()),
            arrival_date: NaiveDate::from_ymd_opt(2025, 2, 14),
            notes: None,
            photo: None,
        };

        let fields = draft.into_fields().unwrap();
        assert_eq!(
            Value::Object(fields),
            json!({
                "name": "Nitrile gloves",
                "category": "Consumables",
                "quantity": 0,
                "arrivalDate": "2025-02-14"
            })
        );
    }

    #[test]
    fn test_draft_defaults_arrival_to_today() {
        let fields = ProductDraft::new("Tape", 3).into_fields().unwrap();
        let today = Local::now().date_naive().format(DATE_FORMAT).to_string();
        assert_eq!(fields.get("arrivalDate"), Some(&Value::String(today)));
    }

    #[test]
    fn test_patch_into_fields() {
        assert!(matches!(
            ProductPatch::default().into_fields(),
            Err(Error::Validation { .. })
        ));

        let patch = ProductPatch {
            quantity: Some(7),
            notes: Some(String::new()),
            photo: Some(None),
            ..ProductPatch::default()
        };
        assert_eq!(
            Value::Object(patch.into_fields().unwrap()),
            json!({"quantity": 7, "notes": null, "photo": null})
        );

        let blank_name = ProductPatch {
            name: Some(" ".to_string()),
            ..ProductPatch::default()
        };
        assert!(blank_name.into_fields().is_err());
    }

    #[test]
    fn test_from_raw_is_lenient_with_legacy_fields() {
        let raw = RawRecord {
            id: "-Nabc".to_string(),
            fields: fields(json!({
                "name": "Scalpel",
                "category": "",
                "quantity": 5,
                "arrivalDate": "2024-11-02T00:00:00.000Z",
                "createdAt": "2024-11-02T09:15:00.000Z",
                "characteristics": {}
            })),
        };

        let product = Product::from_raw(&raw).unwrap();
        assert_eq!(product.id, "-Nabc");
        assert_eq!(product.category, None);
        assert_eq!(product.arrival_date, NaiveDate::from_ymd_opt(2024, 11, 2));
        assert_eq!(product.created_at, Some(timestamp("2024-11-02T09:15:00Z")));
    }

    #[test]
    fn test_from_raw_rejects_missing_name() {
        let raw = RawRecord {
            id: "x".to_string(),
            fields: fields(json!({"quantity": 1})),
        };
        assert!(matches!(
            Product::from_raw(&raw),
            Err(StoreError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_sort_newest_first_missing_last() {
        let mut products = vec![
            sample_product("old", Some("2025-01-01T00:00:00Z"), None),
            sample_product("undated", None, None),
            sample_product("new", Some("2025-03-01T00:00:00Z"), None),
        ];
        Product::sort_snapshot(&mut products);

        let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
    }

    #[test]
    fn test_categories_and_filter() {
        let products = vec![
            sample_product("a", None, Some("Reagents")),
            sample_product("b", None, Some("Glassware")),
            sample_product("c", None, None),
            sample_product("d", None, Some("Reagents")),
        ];

        assert_eq!(categories(&products), vec!["Glassware", "Reagents"]);
        assert_eq!(category_counts(&products).get("Reagents"), Some(&2));

        let reagents = filter_by_category(&products, &CategoryFilter::from_input(Some("Reagents")));
        let ids: Vec<&str> = reagents.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);

        assert_eq!(CategoryFilter::from_input(Some(" all ")), CategoryFilter::All);
        assert_eq!(
            filter_by_category(&products, &CategoryFilter::All).len(),
            products.len()
        );
        assert_eq!(find_by_id(&products, "b").unwrap().id, "b");
    }
}
