use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{PlatformApi, PlatformApiError};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

/// Bot API client: one `POST {api_base}/bot{token}/{method}` per call.
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_base: &str, bot_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), bot_token),
        }
    }
}

#[async_trait]
impl PlatformApi for TelegramClient {
    async fn call(&self, method: &str, body: Value) -> Result<Value, PlatformApiError> {
        let url = format!("{}/{}", self.base_url, method);

        debug!("Calling Telegram method {}", method);

        // The URL carries the bot token, keep it out of error text.
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                PlatformApiError::new(method, format!("request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| {
            PlatformApiError::new(method, format!("failed to read response: {}", e.without_url()))
        })?;

        match serde_json::from_str::<ApiResponse>(&raw) {
            Ok(ApiResponse {
                ok: true, result, ..
            }) if status.is_success() => Ok(result.unwrap_or(Value::Null)),
            Ok(ApiResponse {
                description: Some(description),
                ..
            }) => Err(PlatformApiError::new(method, description)),
            _ => Err(PlatformApiError::new(
                method,
                format!("unexpected response (HTTP {})", status),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_call_returns_result_payload() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/bottest-token/getMyStarBalance")
                .json_body(json!({}));
            then.status(200)
                .json_body(json!({"ok": true, "result": {"amount": 1500}}));
        });

        let client = TelegramClient::new(&server.base_url(), "test-token");
        let result = client.call("getMyStarBalance", json!({})).await.unwrap();

        mock.assert();
        assert_eq!(result, json!({"amount": 1500}));
    }

    #[tokio::test]
    async fn test_call_surfaces_platform_description() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/bottest-token/sendMessage");
            then.status(400).json_body(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            }));
        });

        let client = TelegramClient::new(&server.base_url(), "test-token");
        let err = client
            .call("sendMessage", json!({"chat_id": 1, "text": "x"}))
            .await
            .unwrap_err();

        assert_eq!(err.method, "sendMessage");
        assert_eq!(err.description, "Bad Request: chat not found");
    }

    #[tokio::test]
    async fn test_call_without_success_flag_fails() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/bottest-token/sendInvoice");
            then.status(200).json_body(json!({"result": true}));
        });

        let client = TelegramClient::new(&server.base_url(), "test-token");
        let err = client.call("sendInvoice", json!({})).await.unwrap_err();

        assert_eq!(err.method, "sendInvoice");
        assert!(err.description.contains("HTTP 200"));
    }

    #[tokio::test]
    async fn test_call_non_json_error_uses_fallback() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/bottest-token/setWebhook");
            then.status(502).body("<html>bad gateway</html>");
        });

        let client = TelegramClient::new(&format!("{}/", server.base_url()), "test-token");
        let err = client.call("setWebhook", json!({})).await.unwrap_err();

        assert!(err.description.contains("HTTP 502"));
        assert!(!err.description.contains("test-token"));
    }

    #[tokio::test]
    async fn test_transport_failure_hides_token() {
        // Nothing listens on port 9 of localhost.
        let client = TelegramClient::new("http://127.0.0.1:9", "secret-token");
        let err = client.call("getMe", json!({})).await.unwrap_err();

        assert_eq!(err.method, "getMe");
        assert!(err.description.starts_with("request failed"));
        assert!(!err.description.contains("secret-token"));
    }
}
