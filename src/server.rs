use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::auth;
use crate::bot::DonateBot;
use crate::config::Config;
use crate::platform::types::Update;
use crate::platform::PlatformApi;
use crate::register::{self, RegistrationError, WEBHOOK_PATH};

pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Present only when a bot token is configured.
struct Platform {
    api: Arc<dyn PlatformApi>,
    bot: Arc<DonateBot>,
}

/// Shared, read-only state of the HTTP endpoints.
pub struct AppState {
    platform: Option<Platform>,
    webhook_secret: Option<String>,
    setup_key: Option<String>,
}

impl AppState {
    /// `api` is `None` when no bot token is configured; every endpoint then
    /// fails closed.
    pub fn new(config: &Config, api: Option<Arc<dyn PlatformApi>>) -> Self {
        let platform = api.map(|api| Platform {
            bot: Arc::new(DonateBot::new(
                api.clone(),
                config.telegram.owner_id,
                config.log_chat_id(),
            )),
            api,
        });

        Self {
            platform,
            webhook_secret: config.webhook_secret().map(str::to_string),
            setup_key: config.setup_key().map(str::to_string),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(handle_webhook))
        .route("/setup", get(handle_setup))
        .route("/healthz", get(health_check))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

/// Acknowledge the delivery at once and process it on a detached task.
///
/// The body is taken as raw bytes so that token and secret checks run before
/// anything about its content is known.
async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let Some(platform) = &state.platform else {
        error!("Rejecting update: bot token is not configured");
        return (StatusCode::SERVICE_UNAVAILABLE, "bot token not configured");
    };

    if let Some(expected) = state.webhook_secret.as_deref() {
        let observed = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !auth::secret_matches(observed, expected) {
            warn!("Rejecting update: webhook secret mismatch");
            return (StatusCode::FORBIDDEN, "forbidden");
        }
    }

    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            debug!(update_id = update.update_id, "Update received");
            let bot = platform.bot.clone();
            tokio::spawn(async move {
                bot.handle_update(update).await;
            });
        }
        // Acknowledged anyway so Telegram does not redeliver it forever.
        Err(e) => warn!("Discarding undecodable update: {}", e),
    }

    (StatusCode::OK, "ok")
}

#[derive(Debug, Deserialize)]
struct SetupQuery {
    key: Option<String>,
}

async fn handle_setup(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SetupQuery>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let Some(platform) = &state.platform else {
        error!("Refusing webhook registration: bot token is not configured");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "bot token not configured".to_string(),
        );
    };

    let result = register::register_webhook(
        platform.api.as_ref(),
        query.key.as_deref(),
        state.setup_key.as_deref(),
        state.webhook_secret.as_deref(),
        &headers,
    )
    .await;

    match result {
        Ok(registration) => {
            info!("Webhook set to {}", registration.url);
            (
                StatusCode::OK,
                format!(
                    "Webhook set to {}\n\nTelegram replied: {}",
                    registration.url, registration.result
                ),
            )
        }
        Err(RegistrationError::Unauthorized) => (StatusCode::FORBIDDEN, "forbidden".to_string()),
        Err(e @ RegistrationError::MissingHost) => (StatusCode::BAD_REQUEST, e.to_string()),
        Err(RegistrationError::Platform(e)) => {
            error!("Webhook registration failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                format!("Webhook registration failed: {}", e.description),
            )
        }
    }
}
