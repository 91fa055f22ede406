use dotenvy::dotenv;
use std::{env, sync::Arc, time::Duration};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use warehouse_buddy::{
    bot::{self, BotData},
    config::{self, database},
    core::{Need, Product},
    errors::{Error, Result},
    store::RealtimeStore,
    sync::ListSync,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();

    // 3. Load the application configuration (includes the confirmation secret)
    let app_config = config::load_app_configuration()?;
    let secret = app_config.confirmation_secret()?;

    // 4. Connect to the record store and make sure the table exists
    let db = database::create_connection(&app_config.store.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    info!("Record store ready");

    // 5. Mirror both collections and watch for writes from other clients
    let store = Arc::new(RealtimeStore::new(db));
    let mut products: ListSync<Product, RealtimeStore> = ListSync::new(Arc::clone(&store));
    let mut needs: ListSync<Need, RealtimeStore> = ListSync::new(Arc::clone(&store));
    products.mount().await?;
    needs.mount().await?;

    let poller = (app_config.store.poll_interval_secs > 0).then(|| {
        store.spawn_change_poller(Duration::from_secs(app_config.store.poll_interval_secs))
    });

    // 6. Run the bot; the token is read right before use and never stored in config
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    let data = BotData::new(store, products, needs, Arc::new(app_config), secret);
    let result = bot::run_bot(token, data).await;

    if let Some(poller) = poller {
        poller.abort();
    }
    result.map_err(Error::from)
}
