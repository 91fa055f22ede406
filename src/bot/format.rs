//! Reply formatting for the Discord commands.
//!
//! Kept free of Discord types so the texts can be tested without a gateway connection.

use crate::{
    core::{Need, NeedStatus, Priority, Product, report::DashboardSummary},
    errors::{Error, Result},
    gate::{ConfirmationPrompt, MutationKind, MutationOutcome},
    store::Collection,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::collections::BTreeMap;

/// Discord allows at most 25 fields per embed
pub const MAX_EMBED_FIELDS: usize = 25;

/// Largest photo accepted as an attachment (2 MiB)
pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

/// Discord caps the combined text of an embed at 6000 characters
pub const MAX_EMBED_CHARS: usize = 6000;

const MAX_FIELD_NAME: usize = 256;
const MAX_FIELD_VALUE: usize = 1024;
// Room kept free for a "Showing x of y" footer
const FOOTER_ROOM: usize = 64;

const fn record_noun(collection: Collection) -> &'static str {
    match collection {
        Collection::Products => "product",
        Collection::Needs => "need",
    }
}

/// Text asking the user to confirm a parked change.
#[must_use]
pub fn prompt_message(prompt: &ConfirmationPrompt) -> String {
    format!(
        "🔒 Confirm {} of {} **{}** with `/confirm <password>`, or `/cancel` to drop it.",
        match prompt.action {
            MutationKind::Create => "adding",
            MutationKind::Update => "the edit",
            MutationKind::Delete => "deleting",
        },
        record_noun(prompt.collection),
        prompt.context
    )
}

/// Text reporting an applied change.
#[must_use]
pub fn outcome_message(outcome: &MutationOutcome) -> String {
    match outcome {
        MutationOutcome::Created { collection, id } => {
            format!("✅ {} added (id `{id}`).", capitalized(record_noun(*collection)))
        }
        MutationOutcome::Updated { collection, id } => {
            format!("✅ {} `{id}` updated.", capitalized(record_noun(*collection)))
        }
        MutationOutcome::Deleted { collection, id } => {
            format!("🗑️ {} `{id}` deleted.", capitalized(record_noun(*collection)))
        }
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Embed field (title, body) for one product.
#[must_use]
pub fn product_field(product: &Product) -> (String, String) {
    let mut title = format!("{} × {}", product.name, product.quantity);
    if product.photo.is_some() {
        title.push_str(" 📷");
    }

    let mut lines = vec![format!("ID: `{}`", product.id)];
    if let Some(category) = &product.category {
        lines.push(format!("Category: {category}"));
    }
    if let Some(supplier) = &product.supplier {
        lines.push(format!("Supplier: {supplier}"));
    }
    if let Some(date) = product.arrival_date {
        lines.push(format!("Arrived: {}", date.format("%Y-%m-%d")));
    }
    if let Some(notes) = &product.notes {
        lines.push(notes.clone());
    }
    (
        truncate(&title, MAX_FIELD_NAME),
        truncate(&lines.join("\n"), MAX_FIELD_VALUE),
    )
}

const fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "🔴",
        Priority::Medium => "🟡",
        Priority::Low => "🟢",
    }
}

const fn status_label(status: NeedStatus) -> &'static str {
    match status {
        NeedStatus::Pending => "⏳ pending",
        NeedStatus::Ordered => "📦 ordered",
        NeedStatus::Received => "✅ received",
    }
}

/// Embed field (title, body) for one need.
#[must_use]
pub fn need_field(need: &Need) -> (String, String) {
    let title = format!(
        "{} {} × {}",
        priority_marker(need.priority),
        need.name,
        need.quantity
    );

    let mut lines = vec![
        format!("ID: `{}`", need.id),
        format!("Status: {}", status_label(need.status)),
    ];
    if let Some(link) = &need.link {
        lines.push(format!("Link: {link}"));
    }
    if let Some(notes) = &need.notes {
        lines.push(notes.clone());
    }
    (
        truncate(&title, MAX_FIELD_NAME),
        truncate(&lines.join("\n"), MAX_FIELD_VALUE),
    )
}

/// Leading fields that fit in one embed titled `title`.
///
/// Stops at [`MAX_EMBED_FIELDS`] or before the text would pass [`MAX_EMBED_CHARS`], leaving
/// room for a footer.
#[must_use]
pub fn fit_embed(
    title: &str,
    fields: impl IntoIterator<Item = (String, String)>,
) -> Vec<(String, String)> {
    let mut budget = MAX_EMBED_CHARS.saturating_sub(title.chars().count() + FOOTER_ROOM);
    let mut kept = Vec::new();
    for (name, value) in fields.into_iter().take(MAX_EMBED_FIELDS) {
        let size = name.chars().count() + value.chars().count();
        if size > budget {
            break;
        }
        budget -= size;
        kept.push((name, value));
    }
    kept
}

/// Embed fields for the dashboard.
#[must_use]
pub fn dashboard_fields(
    summary: &DashboardSummary,
    category_counts: &BTreeMap<String, usize>,
) -> Vec<(String, String, bool)> {
    let mut fields = vec![
        (
            "Products".to_string(),
            format!(
                "{} records, {} units",
                summary.product_count, summary.total_units
            ),
            true,
        ),
        (
            "Needs".to_string(),
            format!(
                "{} total\n⏳ {} pending\n📦 {} ordered\n✅ {} received",
                summary.need_count,
                summary.needs_by_status.pending,
                summary.needs_by_status.ordered,
                summary.needs_by_status.received
            ),
            true,
        ),
    ];

    if !category_counts.is_empty() {
        let lines: Vec<String> = category_counts
            .iter()
            .map(|(category, count)| format!("{category}: {count}"))
            .collect();
        fields.push((
            format!("Categories ({})", summary.category_count),
            truncate(&lines.join("\n"), MAX_FIELD_VALUE),
            false,
        ));
    }
    fields
}

/// Encodes an uploaded image as a `data:` URL for storage.
///
/// # Errors
/// Returns `Error::Validation` if the upload isn't an image or is too large.
pub fn photo_data_url(content_type: Option<&str>, bytes: &[u8]) -> Result<String> {
    let content_type = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
        .filter(|ct| ct.starts_with("image/"))
        .ok_or_else(|| Error::validation("Photo must be an image attachment"))?;
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(Error::validation(format!(
            "Photo is too large ({} KiB, limit {} KiB)",
            bytes.len() / 1024,
            MAX_PHOTO_BYTES / 1024
        )));
    }
    Ok(format!("data:{content_type};base64,{}", STANDARD.encode(bytes)))
}

/// Decodes a stored photo into a file name extension and its bytes.
#[must_use]
pub fn decode_photo(data_url: &str) -> Option<(String, Vec<u8>)> {
    let rest = data_url.strip_prefix("data:image/")?;
    let (subtype, payload) = rest.split_once(";base64,")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    let extension = match subtype {
        "jpeg" => "jpg",
        "svg+xml" => "svg",
        other => other,
    };
    Some((extension.to_string(), bytes))
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit - 1).collect();
    cut.push('…');
    cut
}
