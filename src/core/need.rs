//! Need business logic - purchase requests for the lab.
//!
//! Needs are listed by priority (high first), then newest first. The status field follows an
//! informal pending → ordered → received workflow, but no transition is enforced: an edit
//! may set any status from any other.

use super::{
    record::{
        CollectionRecord, decode_fields, patch_optional, put_optional, required_name,
    },
    serde_helpers::{empty_as_none, lenient_timestamp},
};
use crate::{
    errors::{Error, Result, StoreError},
    store::{Collection, Fields, RawRecord},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

/// How urgently a need should be bought
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait
    Low,
    /// Default for new requests
    #[default]
    Medium,
    /// Buy first
    High,
}

impl Priority {
    /// Sort weight: high=3, medium=2, low=1
    #[must_use]
    pub const fn weight(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Stored name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(Error::validation(format!("Unknown priority '{other}'"))),
        }
    }
}

/// Where a purchase request stands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeedStatus {
    /// Requested, not ordered yet
    #[default]
    Pending,
    /// Ordered from a supplier
    Ordered,
    /// Arrived at the lab
    Received,
}

impl NeedStatus {
    /// Stored name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ordered => "ordered",
            Self::Received => "received",
        }
    }
}

impl fmt::Display for NeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NeedStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "ordered" => Ok(Self::Ordered),
            "received" => Ok(Self::Received),
            other => Err(Error::validation(format!("Unknown status '{other}'"))),
        }
    }
}

const fn default_quantity() -> u32 {
    1
}

/// A need as read from the store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Need {
    /// Store-assigned id
    #[serde(skip)]
    pub id: String,
    /// What to buy
    pub name: String,
    /// How many
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Urgency
    #[serde(default)]
    pub priority: Priority,
    /// Workflow state
    #[serde(default)]
    pub status: NeedStatus,
    /// Shop URL
    #[serde(default, deserialize_with = "empty_as_none")]
    pub link: Option<String>,
    /// Free-form notes
    #[serde(default, deserialize_with = "empty_as_none")]
    pub notes: Option<String>,
    /// Set by the store on creation
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Set by the store on every update
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CollectionRecord for Need {
    const COLLECTION: Collection = Collection::Needs;

    fn from_raw(raw: &RawRecord) -> std::result::Result<Self, StoreError> {
        let mut need: Self = decode_fields(Self::COLLECTION, raw)?;
        need.id.clone_from(&raw.id);
        Ok(need)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    /// Highest priority first, then newest first; needs without a creation time go last
    /// within their priority.
    fn sort_snapshot(records: &mut [Self]) {
        records.sort_by(|a, b| {
            b.priority
                .weight()
                .cmp(&a.priority.weight())
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
    }
}

fn validate_quantity(quantity: u32) -> Result<u32> {
    if quantity == 0 {
        return Err(Error::validation("Quantity must be at least 1"));
    }
    Ok(quantity)
}

/// Input for creating a need. New needs always start as pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedDraft {
    /// Required, trimmed
    pub name: String,
    /// At least 1
    pub quantity: u32,
    /// Urgency
    pub priority: Priority,
    /// Optional shop URL
    pub link: Option<String>,
    /// Optional notes
    pub notes: Option<String>,
}

impl NeedDraft {
    /// Draft with a name, quantity 1 and medium priority
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: 1,
            priority: Priority::default(),
            link: None,
            notes: None,
        }
    }

    /// Validates the draft and converts it into the field map written to the store.
    ///
    /// # Errors
    /// Returns `Error::Validation` if the name is blank or the quantity is zero.
    pub fn into_fields(self) -> Result<Fields> {
        let mut fields = Fields::new();
        fields.insert(
            "name".to_string(),
            Value::String(required_name(&self.name, "Need")?),
        );
        fields.insert(
            "quantity".to_string(),
            Value::from(validate_quantity(self.quantity)?),
        );
        fields.insert(
            "priority".to_string(),
            Value::from(self.priority.as_str()),
        );
        put_optional(&mut fields, "link", self.link);
        put_optional(&mut fields, "notes", self.notes);
        Ok(fields)
    }
}

/// Partial edit of a need. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeedPatch {
    /// New name; must not be blank
    pub name: Option<String>,
    /// New quantity; at least 1
    pub quantity: Option<u32>,
    /// New priority
    pub priority: Option<Priority>,
    /// Any status may replace any other
    pub status: Option<NeedStatus>,
    /// New link; blank clears it
    pub link: Option<String>,
    /// New notes; blank clears them
    pub notes: Option<String>,
}

impl NeedPatch {
    /// Whether the patch changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validates the patch and converts it into the partial field map merged by the store.
    ///
    /// # Errors
    /// Returns `Error::Validation` if the patch is empty, the new name is blank, or the new
    /// quantity is zero.
    pub fn into_fields(self) -> Result<Fields> {
        if self.is_empty() {
            return Err(Error::validation("Nothing to update"));
        }

        let mut fields = Fields::new();
        if let Some(name) = self.name {
            fields.insert(
                "name".to_string(),
                Value::String(required_name(&name, "Need")?),
            );
        }
        if let Some(quantity) = self.quantity {
            fields.insert(
                "quantity".to_string(),
                Value::from(validate_quantity(quantity)?),
            );
        }
        if let Some(priority) = self.priority {
            fields.insert("priority".to_string(), Value::from(priority.as_str()));
        }
        if let Some(status) = self.status {
            fields.insert("status".to_string(), Value::from(status.as_str()));
        }
        patch_optional(&mut fields, "link", self.link);
        patch_optional(&mut fields, "notes", self.notes);
        Ok(fields)
    }
}

/// Number of needs in each status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    /// Not ordered yet
    pub pending: usize,
    /// Ordered, not arrived
    pub ordered: usize,
    /// Arrived
    pub received: usize,
}

/// Counts needs per status.
#[must_use]
pub fn status_summary(needs: &[Need]) -> StatusSummary {
    needs
        .iter()
        .fold(StatusSummary::default(), |mut summary, need| {
            match need.status {
                NeedStatus::Pending => summary.pending += 1,
                NeedStatus::Ordered => summary.ordered += 1,
                NeedStatus::Received => summary.received += 1,
            }
            summary
        })
}

/// Finds a need in a snapshot by id
#[must_use]
pub fn find_by_id<'a>(needs: &'a [Need], id: &str) -> Option<&'a Need> {
    needs.iter().find(|n| n.id == id)
}
