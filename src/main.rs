mod auth;
mod bot;
mod classify;
mod config;
mod platform;
mod register;
mod replies;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::telegram::TelegramClient;
use crate::platform::PlatformApi;
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,donatebot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Owner: {}", config.telegram.owner_id);
    info!("  Donation log chat: {:?}", config.log_chat_id());
    info!("  Webhook secret: {}", config.webhook_secret().is_some());

    let api = match config.bot_token() {
        Some(token) => {
            let client: Arc<dyn PlatformApi> =
                Arc::new(TelegramClient::new(&config.telegram.api_base, token));
            Some(client)
        }
        None => {
            warn!("No bot token configured, every endpoint will refuse requests");
            None
        }
    };

    let state = Arc::new(AppState::new(&config, api));
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind))?;

    info!("Bot is listening on {}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")?;

    info!("Bot stopped");
    Ok(())
}
