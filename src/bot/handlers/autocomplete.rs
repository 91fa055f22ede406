//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions come from the live mirrors, so they never hit the database. Records are
//! offered by name but submitted by id, since names are not unique.

use crate::{
    bot::BotData,
    core::{CollectionRecord, product},
    errors::Error,
};
use poise::serenity_prelude as serenity;
use std::collections::BTreeSet;

/// Discord shows at most 25 suggestions
const LIMIT: usize = 25;

fn matches(candidate: &str, partial_lower: &str) -> bool {
    candidate.to_lowercase().contains(partial_lower)
}

fn record_choices<T: CollectionRecord>(
    records: &[T],
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let partial_lower = partial.to_lowercase();
    records
        .iter()
        .filter(|r| matches(r.display_name(), &partial_lower) || r.id().starts_with(partial))
        .take(LIMIT)
        .map(|r| {
            serenity::AutocompleteChoice::new(r.display_name().to_string(), r.id().to_string())
        })
        .collect()
}

/// Suggests products by name; the submitted value is the product id.
pub async fn autocomplete_product(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    record_choices(&ctx.data().products.current(), partial)
}

/// Suggests needs by name; the submitted value is the need id.
pub async fn autocomplete_need(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    record_choices(&ctx.data().needs.current(), partial)
}

/// Suggests the categories already in use.
pub async fn autocomplete_category(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    product::categories(&ctx.data().products.current())
        .into_iter()
        .filter(|c| matches(c, &partial_lower))
        .take(LIMIT)
        .collect()
}

/// Suggests the suppliers already in use.
pub async fn autocomplete_supplier(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    ctx.data()
        .products
        .current()
        .into_iter()
        .filter_map(|p| p.supplier)
        .filter(|s| matches(s, &partial_lower))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(LIMIT)
        .collect()
}
