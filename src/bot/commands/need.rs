//! Need Discord commands - `/need add|list|edit|delete`.
//!
//! Needs are the lab's purchase requests. They are listed by priority, most urgent first,
//! and their status can be set to any value at any time.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::{ask_confirmation, reply_private},
            format,
            handlers::autocomplete,
        },
        core::{NeedDraft, NeedPatch, NeedStatus, Priority, need::find_by_id},
        errors::{Error, Result},
        gate::Mutation,
    };
    use poise::serenity_prelude as serenity;

    /// Priority as offered in Discord's option picker
    #[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
    pub enum PriorityChoice {
        #[name = "high"]
        High,
        #[name = "medium"]
        Medium,
        #[name = "low"]
        Low,
    }

    impl From<PriorityChoice> for Priority {
        fn from(choice: PriorityChoice) -> Self {
            match choice {
                PriorityChoice::High => Self::High,
                PriorityChoice::Medium => Self::Medium,
                PriorityChoice::Low => Self::Low,
            }
        }
    }

    /// Status as offered in Discord's option picker
    #[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
    pub enum StatusChoice {
        #[name = "pending"]
        Pending,
        #[name = "ordered"]
        Ordered,
        #[name = "received"]
        Received,
    }

    impl From<StatusChoice> for NeedStatus {
        fn from(choice: StatusChoice) -> Self {
            match choice {
                StatusChoice::Pending => Self::Pending,
                StatusChoice::Ordered => Self::Ordered,
                StatusChoice::Received => Self::Received,
            }
        }
    }

    /// Parent command for lab purchase requests.
    #[poise::command(
        slash_command,
        subcommands("need_add", "need_list", "need_edit", "need_delete"),
        subcommand_required
    )]
    pub async fn need(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Requests something for the lab (asks for confirmation).
    #[poise::command(slash_command, rename = "add")]
    pub async fn need_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "What is needed"] name: String,
        #[description = "How many (defaults to 1)"]
        #[min = 1]
        quantity: Option<u32>,
        #[description = "How urgent (defaults to medium)"] priority: Option<PriorityChoice>,
        #[description = "Where to buy it"] link: Option<String>,
        #[description = "Notes"] notes: Option<String>,
    ) -> Result<()> {
        let mut draft = NeedDraft::new(name);
        if let Some(quantity) = quantity {
            draft.quantity = quantity;
        }
        if let Some(priority) = priority {
            draft.priority = priority.into();
        }
        draft.link = link;
        draft.notes = notes;
        let context = draft.name.trim().to_string();

        ask_confirmation(ctx, Mutation::create_need(draft)?, context).await
    }

    /// Lists needs, most urgent first.
    #[poise::command(slash_command, rename = "list")]
    pub async fn need_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only show this status"] status: Option<StatusChoice>,
    ) -> Result<()> {
        let data = ctx.data();
        if data.needs.is_loading() {
            ctx.say("⏳ Needs are still loading, try again in a moment.")
                .await?;
            return Ok(());
        }

        let status = status.map(NeedStatus::from);
        let needs: Vec<_> = data
            .needs
            .current()
            .into_iter()
            .filter(|n| status.is_none_or(|s| n.status == s))
            .collect();
        if needs.is_empty() {
            ctx.say("🧪 Nothing on the shopping list. Use `/need add` to request something!")
                .await?;
            return Ok(());
        }

        let title = status.map_or_else(
            || "**Shopping list**".to_string(),
            |s| format!("**Shopping list - {s}**"),
        );
        let fields = format::fit_embed(&title, needs.iter().map(format::need_field));
        let shown = fields.len();
        let mut embed = serenity::CreateEmbed::default()
            .title(title)
            .color(0x0057_F287)
            .fields(fields.into_iter().map(|(name, value)| (name, value, false)));
        if needs.len() > shown {
            embed = embed.footer(serenity::CreateEmbedFooter::new(format!(
                "Showing {shown} of {} needs",
                needs.len()
            )));
        }

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Edits a need (asks for confirmation). Blank text clears a field.
    #[poise::command(slash_command, rename = "edit")]
    pub async fn need_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Need to edit"]
        #[autocomplete = "autocomplete::autocomplete_need"]
        need: String,
        #[description = "New name"] name: Option<String>,
        #[description = "New quantity"]
        #[min = 1]
        quantity: Option<u32>,
        #[description = "New priority"] priority: Option<PriorityChoice>,
        #[description = "New status"] status: Option<StatusChoice>,
        #[description = "New link"] link: Option<String>,
        #[description = "New notes"] notes: Option<String>,
    ) -> Result<()> {
        let needs = ctx.data().needs.current();
        let Some(existing) = find_by_id(&needs, &need) else {
            reply_private(ctx, format!("❌ Need `{need}` not found.")).await?;
            return Ok(());
        };

        let patch = NeedPatch {
            name,
            quantity,
            priority: priority.map(Priority::from),
            status: status.map(NeedStatus::from),
            link,
            notes,
        };
        let mutation = Mutation::update_need(existing.id.clone(), patch)?;
        ask_confirmation(ctx, mutation, existing.name.clone()).await
    }

    /// Deletes a need (asks for confirmation).
    #[poise::command(slash_command, rename = "delete")]
    pub async fn need_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Need to delete"]
        #[autocomplete = "autocomplete::autocomplete_need"]
        need: String,
    ) -> Result<()> {
        let needs = ctx.data().needs.current();
        let Some(existing) = find_by_id(&needs, &need) else {
            reply_private(ctx, format!("❌ Need `{need}` not found.")).await?;
            return Ok(());
        };

        let mutation = Mutation::delete_need(existing.id.clone());
        ask_confirmation(ctx, mutation, existing.name.clone()).await
    }
}

// Re-export all commands
pub use inner::*;
