//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for `WarehouseBuddy`, including all slash
//! commands, autocomplete handlers, and the shared bot context.

/// Discord command implementations (product, need, confirm, export, general)
pub mod commands;
/// Reply formatting shared by the commands
pub mod format;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::AppConfig,
    core::{Need, Product},
    errors::{Error, Result},
    gate::{
        ConfirmationPrompt, ConfirmationSecret, GateMap, Mutation, MutationOutcome,
        PendingConfirmation,
    },
    store::RealtimeStore,
    sync::ListSync,
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Per-user confirmation gates in front of the live store
pub type Gates = GateMap<serenity::UserId, RealtimeStore>;

/// Shared data available to all bot commands.
///
/// Each Discord user gets their own confirmation gate, so a pending change from one user
/// can't be confirmed or replaced by another.
pub struct BotData {
    /// Record store every gate writes to
    pub store: Arc<RealtimeStore>,
    /// Live product list, newest first
    pub products: ListSync<Product, RealtimeStore>,
    /// Live need list, by priority then newest first
    pub needs: ListSync<Need, RealtimeStore>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    gates: Gates,
}

impl BotData {
    /// Creates the bot context from already-mounted mirrors.
    #[must_use]
    pub fn new(
        store: Arc<RealtimeStore>,
        products: ListSync<Product, RealtimeStore>,
        needs: ListSync<Need, RealtimeStore>,
        config: Arc<AppConfig>,
        secret: ConfirmationSecret,
    ) -> Self {
        let gates = GateMap::new(Arc::clone(&store), secret);
        Self {
            store,
            products,
            needs,
            config,
            gates,
        }
    }

    /// Parks `mutation` in `user`'s gate, replacing anything they had pending.
    pub async fn request_confirmation(
        &self,
        user: serenity::UserId,
        mutation: Mutation,
        context: impl Into<String>,
    ) -> ConfirmationPrompt {
        self.gates
            .request_confirmation(user, mutation, context)
            .await
    }

    /// Confirms `user`'s pending change with `secret`.
    ///
    /// # Errors
    /// See [`crate::gate::ConfirmationGate::confirm`].
    pub async fn confirm(&self, user: serenity::UserId, secret: &str) -> Result<MutationOutcome> {
        self.gates.confirm(&user, secret).await
    }

    /// Drops `user`'s pending change, if any.
    pub async fn cancel(&self, user: serenity::UserId) -> Option<PendingConfirmation> {
        self.gates.cancel(&user).await
    }
}

pub use handlers::*;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::ProductDraft,
        errors::ConfirmationError,
        store::Collection,
        test_utils::{TEST_SECRET, setup_test_store},
    };

    async fn bot_data() -> Result<BotData> {
        let store = Arc::new(setup_test_store().await?);
        let mut products = ListSync::new(Arc::clone(&store));
        let mut needs = ListSync::new(Arc::clone(&store));
        products.mount().await?;
        needs.mount().await?;
        Ok(BotData::new(
            store,
            products,
            needs,
            Arc::new(AppConfig::default()),
            ConfirmationSecret::new(TEST_SECRET),
        ))
    }

    #[tokio::test]
    async fn test_gates_are_per_user() -> Result<()> {
        let data = bot_data().await?;
        let alice = serenity::UserId::new(1);
        let bob = serenity::UserId::new(2);

        let mutation = Mutation::create_product(ProductDraft::new("Centrifuge tubes", 50))?;
        data.request_confirmation(alice, mutation, "Centrifuge tubes")
            .await;

        // Bob has nothing pending, even with the right password
        assert!(matches!(
            data.confirm(bob, TEST_SECRET).await,
            Err(Error::Confirmation(ConfirmationError::NothingPending))
        ));
        assert!(data.cancel(bob).await.is_none());

        let outcome = data.confirm(alice, TEST_SECRET).await?;
        assert!(matches!(
            outcome,
            MutationOutcome::Created {
                collection: Collection::Products,
                ..
            }
        ));

        let products = data.products.current();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Centrifuge tubes");
        assert_eq!(data.gates.pending_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_leaves_store_untouched() -> Result<()> {
        let data = bot_data().await?;
        let user = serenity::UserId::new(7);

        data.request_confirmation(user, Mutation::delete_need("missing"), "Gloves")
            .await;
        let cancelled = data.cancel(user).await.unwrap();
        assert_eq!(cancelled.context, "Gloves");
        assert!(data.confirm(user, TEST_SECRET).await.is_err());
        assert!(data.needs.current().is_empty());
        assert_eq!(data.gates.pending_count().await, 0);
        Ok(())
    }
}
