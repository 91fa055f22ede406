//! Product Discord commands - `/product add|list|edit|delete|photo`.
//!
//! Listing and viewing read the live mirror. Adding, editing and deleting only park the change
//! in the caller's confirmation gate; nothing is written until `/confirm`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::{ask_confirmation, attachment_photo, reply_private, user_date},
            format,
            handlers::autocomplete,
        },
        core::{
            CategoryFilter, ProductDraft, ProductPatch,
            product::{filter_by_category, find_by_id},
        },
        errors::{Error, Result},
        gate::Mutation,
    };
    use poise::serenity_prelude as serenity;

    /// Parent command for warehouse products.
    #[poise::command(
        slash_command,
        subcommands(
            "product_add",
            "product_list",
            "product_edit",
            "product_delete",
            "product_photo"
        ),
        subcommand_required
    )]
    pub async fn product(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Adds a product to the warehouse (asks for confirmation).
    #[allow(clippy::too_many_arguments)]
    #[poise::command(slash_command, rename = "add")]
    pub async fn product_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product name"] name: String,
        #[description = "Units in stock"]
        #[min = 0]
        quantity: u32,
        #[description = "Category (e.g., 'Reagents')"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
        #[description = "Supplier"]
        #[autocomplete = "autocomplete::autocomplete_supplier"]
        supplier: Option<String>,
        #[description = "Arrival date, YYYY-MM-DD (defaults to today)"] arrival_date: Option<
            String,
        >,
        #[description = "Description"] notes: Option<String>,
        #[description = "Photo of the product"] photo: Option<serenity::Attachment>,
    ) -> Result<()> {
        let photo = match &photo {
            Some(attachment) => Some(attachment_photo(attachment).await?),
            None => None,
        };
        let draft = ProductDraft {
            name,
            category,
            quantity,
            supplier,
            arrival_date: user_date(arrival_date.as_deref())?,
            notes,
            photo,
        };
        let context = draft.name.trim().to_string();

        ask_confirmation(ctx, Mutation::create_product(draft)?, context).await
    }

    /// Lists products, newest first.
    #[poise::command(slash_command, rename = "list")]
    pub async fn product_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only show this category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        if data.products.is_loading() {
            ctx.say("⏳ Products are still loading, try again in a moment.")
                .await?;
            return Ok(());
        }

        let filter = CategoryFilter::from_input(category.as_deref());
        let products = filter_by_category(&data.products.current(), &filter);
        if products.is_empty() {
            ctx.say("📦 No products found. Use `/product add` to add one!")
                .await?;
            return Ok(());
        }

        let title = match &filter {
            CategoryFilter::All => "**Warehouse**".to_string(),
            CategoryFilter::Only(category) => format!("**Warehouse - {category}**"),
        };
        let fields = format::fit_embed(&title, products.iter().map(format::product_field));
        let shown = fields.len();
        let mut embed = serenity::CreateEmbed::default()
            .title(title)
            .color(0x0058_65F2)
            .fields(fields.into_iter().map(|(name, value)| (name, value, false)));
        if products.len() > shown {
            embed = embed.footer(serenity::CreateEmbedFooter::new(format!(
                "Showing {shown} of {} products",
                products.len()
            )));
        }

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Edits a product (asks for confirmation). Blank text clears a field.
    #[allow(clippy::too_many_arguments)]
    #[poise::command(slash_command, rename = "edit")]
    pub async fn product_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to edit"]
        #[autocomplete = "autocomplete::autocomplete_product"]
        product: String,
        #[description = "New name"] name: Option<String>,
        #[description = "New quantity"]
        #[min = 0]
        quantity: Option<u32>,
        #[description = "New category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
        #[description = "New supplier"]
        #[autocomplete = "autocomplete::autocomplete_supplier"]
        supplier: Option<String>,
        #[description = "New arrival date, YYYY-MM-DD"] arrival_date: Option<String>,
        #[description = "New description"] notes: Option<String>,
        #[description = "New photo"] photo: Option<serenity::Attachment>,
        #[description = "Remove the current photo"] remove_photo: Option<bool>,
    ) -> Result<()> {
        let products = ctx.data().products.current();
        let Some(existing) = find_by_id(&products, &product) else {
            reply_private(ctx, format!("❌ Product `{product}` not found.")).await?;
            return Ok(());
        };

        let photo = match (&photo, remove_photo) {
            (Some(attachment), _) => Some(Some(attachment_photo(attachment).await?)),
            (None, Some(true)) => Some(None),
            (None, _) => None,
        };
        let patch = ProductPatch {
            name,
            category,
            quantity,
            supplier,
            arrival_date: user_date(arrival_date.as_deref())?,
            notes,
            photo,
        };

        let mutation = Mutation::update_product(existing.id.clone(), patch)?;
        ask_confirmation(ctx, mutation, existing.name.clone()).await
    }

    /// Deletes a product (asks for confirmation).
    #[poise::command(slash_command, rename = "delete")]
    pub async fn product_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to delete"]
        #[autocomplete = "autocomplete::autocomplete_product"]
        product: String,
    ) -> Result<()> {
        let products = ctx.data().products.current();
        let Some(existing) = find_by_id(&products, &product) else {
            reply_private(ctx, format!("❌ Product `{product}` not found.")).await?;
            return Ok(());
        };

        let mutation = Mutation::delete_product(existing.id.clone());
        ask_confirmation(ctx, mutation, existing.name.clone()).await
    }

    /// Shows a product's photo.
    #[poise::command(slash_command, rename = "photo")]
    pub async fn product_photo(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to show"]
        #[autocomplete = "autocomplete::autocomplete_product"]
        product: String,
    ) -> Result<()> {
        let products = ctx.data().products.current();
        let Some(existing) = find_by_id(&products, &product) else {
            reply_private(ctx, format!("❌ Product `{product}` not found.")).await?;
            return Ok(());
        };
        let Some((extension, bytes)) = existing.photo.as_deref().and_then(format::decode_photo)
        else {
            ctx.say(format!("📷 **{}** has no photo.", existing.name))
                .await?;
            return Ok(());
        };

        let file =
            serenity::CreateAttachment::bytes(bytes, format!("{}.{extension}", existing.id));
        ctx.send(
            poise::CreateReply::default()
                .content(format!("📷 **{}**", existing.name))
                .attachment(file),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
