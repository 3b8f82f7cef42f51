//! One-shot binding of Telegram's update delivery to this service.

use axum::http::{header, HeaderMap};
use serde_json::Value;
use tracing::{info, warn};

use crate::auth;
use crate::platform::types::SetWebhook;
use crate::platform::{self, PlatformApi, PlatformApiError};

pub const WEBHOOK_PATH: &str = "/webhook";

/// Update kinds the bot asks Telegram to deliver.
pub const ALLOWED_UPDATES: [&str; 3] = ["message", "callback_query", "pre_checkout_query"];

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("invalid setup key")]
    Unauthorized,
    #[error("request has no host header to derive the webhook URL from")]
    MissingHost,
    #[error(transparent)]
    Platform(#[from] PlatformApiError),
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub url: String,
    pub result: Value,
}

/// First value of a possibly comma-separated proxy header.
fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `<scheme>://<host>/webhook` as seen by the client, honoring reverse
/// proxy headers. Scheme defaults to https.
pub fn public_webhook_url(headers: &HeaderMap) -> Option<String> {
    let scheme = first_value(headers, "x-forwarded-proto").unwrap_or("https");
    let host = first_value(headers, "x-forwarded-host")
        .or_else(|| first_value(headers, header::HOST.as_str()))?;
    Some(format!("{}://{}{}", scheme, host, WEBHOOK_PATH))
}

/// Check `provided_key` and, if it matches, point the webhook at this service.
///
/// Pending updates queued before registration are dropped.
pub async fn register_webhook(
    api: &dyn PlatformApi,
    provided_key: Option<&str>,
    expected_key: Option<&str>,
    secret_token: Option<&str>,
    headers: &HeaderMap,
) -> Result<Registration, RegistrationError> {
    match (provided_key, expected_key) {
        (Some(provided), Some(expected)) if auth::secret_matches(provided, expected) => {}
        _ => {
            warn!("Webhook registration refused: setup key mismatch");
            return Err(RegistrationError::Unauthorized);
        }
    }

    let url = public_webhook_url(headers).ok_or(RegistrationError::MissingHost)?;

    let result = platform::request(
        api,
        "setWebhook",
        &SetWebhook {
            url: url.clone(),
            secret_token: secret_token.map(str::to_string),
            drop_pending_updates: true,
            allowed_updates: ALLOWED_UPDATES.iter().map(|s| s.to_string()).collect(),
        },
    )
    .await?;

    info!("Webhook registered at {}", url);
    Ok(Registration { url, result })
}
