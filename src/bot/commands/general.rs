//! General Discord commands - ping, help and the dashboard overview.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, format},
        core::{product::category_counts, report::dashboard_summary},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**WarehouseBuddy Help**\n\
        Warehouse stock and the lab shopping list, kept in sync for everyone.\n\n\
        **Warehouse**\n\
        • `/product list [category]` - Lists products, newest first.\n\
        • `/product add <name> <quantity> [category] [supplier] [arrival_date] [notes] [photo]` - Adds a product.\n\
        • `/product edit <product> [fields...]` - Edits a product; blank text clears a field.\n\
        • `/product delete <product>` - Deletes a product.\n\
        • `/product photo <product>` - Shows a product's photo.\n\n\
        **Shopping list**\n\
        • `/need list [status]` - Lists needs, most urgent first.\n\
        • `/need add <name> [quantity] [priority] [link] [notes]` - Requests something.\n\
        • `/need edit <need> [fields...]` - Edits a need, including its status.\n\
        • `/need delete <need>` - Deletes a need.\n\n\
        **Confirmation**\n\
        Every add, edit and delete waits for `/confirm <password>`. \
        `/cancel` drops the pending change.\n\n\
        **Other**\n\
        • `/export [category] [supplier]` - Downloads products as a CSV spreadsheet.\n\
        • `/dashboard` - Shows stock and shopping list totals.\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows totals for the warehouse and the shopping list.
    #[poise::command(slash_command)]
    pub async fn dashboard(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let products = data.products.current();
        let needs = data.needs.current();

        let summary = dashboard_summary(&products, &needs);
        let fields = format::dashboard_fields(&summary, &category_counts(&products));

        let embed = serenity::CreateEmbed::default()
            .title("📊 **Dashboard**")
            .color(0x0058_65F2)
            .fields(fields);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
