//! Export command - sends the product list as a CSV spreadsheet.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        errors::{Error, Result},
        export::{ExportFilter, export_products},
    };
    use poise::serenity_prelude as serenity;

    /// Exports products as a spreadsheet, optionally filtered.
    #[poise::command(slash_command)]
    pub async fn export(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only export this category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
        #[description = "Only export this supplier"]
        #[autocomplete = "autocomplete::autocomplete_supplier"]
        supplier: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let filter = ExportFilter::from_input(category.as_deref(), supplier.as_deref());
        let today = chrono::Local::now().date_naive();

        let products = data.products.current();
        let file = match export_products(&products, &filter, &data.config.export, today) {
            Ok(file) => file,
            Err(Error::NothingToExport) => {
                ctx.say("📭 Nothing to export.").await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let content = format!("📊 Exported {} products.", file.row_count);
        let attachment = serenity::CreateAttachment::bytes(file.contents, file.name);
        ctx.send(
            poise::CreateReply::default()
                .content(content)
                .attachment(attachment),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
