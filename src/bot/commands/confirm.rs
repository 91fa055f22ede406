//! Confirmation commands - `/confirm` and `/cancel`.
//!
//! Replies are ephemeral so the typed password and the outcome stay with the caller.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::reply_private, format},
        errors::{ConfirmationError, Error, Result},
    };

    /// Applies your pending add, edit or delete after checking the password.
    #[poise::command(slash_command, ephemeral)]
    pub async fn confirm(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Shared confirmation password"] password: String,
    ) -> Result<()> {
        let outcome = ctx.data().confirm(ctx.author().id, &password).await;

        let message = match outcome {
            Ok(outcome) => format::outcome_message(&outcome),
            Err(Error::Confirmation(ConfirmationError::SecretMismatch { action })) => {
                format!("❌ Wrong password. The {action} was cancelled; run the command again.")
            }
            Err(Error::Confirmation(ConfirmationError::NothingPending)) => {
                "ℹ️ Nothing is waiting for confirmation.".to_string()
            }
            Err(e) => return Err(e),
        };
        reply_private(ctx, message).await
    }

    /// Drops your pending add, edit or delete.
    #[poise::command(slash_command, ephemeral)]
    pub async fn cancel(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let message = match ctx.data().cancel(ctx.author().id).await {
            Some(pending) => format!(
                "🚫 Cancelled the {} of **{}**.",
                pending.mutation.kind(),
                pending.context
            ),
            None => "ℹ️ Nothing is waiting for confirmation.".to_string(),
        };
        reply_private(ctx, message).await
    }
}

// Re-export all commands
pub use inner::*;
