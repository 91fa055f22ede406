//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// `/confirm` and `/cancel`
pub mod confirm;

/// Spreadsheet export command
pub mod export;

/// General utility commands
pub mod general;

/// Lab purchase request commands
pub mod need;

/// Warehouse product commands
pub mod product;

// Export commands
pub use confirm::*;
pub use export::*;
pub use general::*;
pub use need::*;
pub use product::*;

use crate::{
    bot::{BotData, format},
    core::serde_helpers::parse_date,
    errors::{Error, Result},
    gate::Mutation,
};
use chrono::NaiveDate;
use poise::serenity_prelude as serenity;

/// Parks `mutation` in the caller's gate and asks them for the password.
pub(crate) async fn ask_confirmation(
    ctx: poise::Context<'_, BotData, Error>,
    mutation: Mutation,
    context: String,
) -> Result<()> {
    let prompt = ctx
        .data()
        .request_confirmation(ctx.author().id, mutation, context)
        .await;
    ctx.send(
        poise::CreateReply::default()
            .content(format::prompt_message(&prompt))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Downloads an image attachment and encodes it for storage.
pub(crate) async fn attachment_photo(attachment: &serenity::Attachment) -> Result<String> {
    if usize::try_from(attachment.size).unwrap_or(usize::MAX) > format::MAX_PHOTO_BYTES {
        return Err(Error::validation(format!(
            "Photo '{}' is larger than {} KiB",
            attachment.filename,
            format::MAX_PHOTO_BYTES / 1024
        )));
    }
    let bytes = attachment.download().await?;
    format::photo_data_url(attachment.content_type.as_deref(), &bytes)
}

/// Parses a user-typed `YYYY-MM-DD` date.
pub(crate) fn user_date(input: Option<&str>) -> Result<Option<NaiveDate>> {
    input
        .map(|text| {
            parse_date(text)
                .ok_or_else(|| Error::validation(format!("'{text}' is not a YYYY-MM-DD date")))
        })
        .transpose()
}

/// Replies ephemerally with `text`.
pub(crate) async fn reply_private(
    ctx: poise::Context<'_, BotData, Error>,
    text: impl Into<String>,
) -> Result<()> {
    ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
        .await?;
    Ok(())
}
