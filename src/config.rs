use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::platform::telegram::DEFAULT_API_BASE;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// The only user allowed to run /balance and /tx. 0 = nobody.
    #[serde(default)]
    pub owner_id: i64,
    /// Chat that receives a line per donation. 0 = disabled.
    #[serde(default)]
    pub log_chat_id: i64,
    /// Echoed by Telegram in `X-Telegram-Bot-Api-Secret-Token`. Empty = unchecked.
    #[serde(default)]
    pub webhook_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Required as `?key=` on /setup. Empty = registration always refused.
    #[serde(default)]
    pub setup_key: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: default_api_base(),
            owner_id: 0,
            log_chat_id: 0,
            webhook_secret: String::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            setup_key: String::new(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

impl Config {
    pub fn bot_token(&self) -> Option<&str> {
        non_empty(&self.telegram.bot_token)
    }

    pub fn log_chat_id(&self) -> Option<i64> {
        (self.telegram.log_chat_id != 0).then_some(self.telegram.log_chat_id)
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        non_empty(&self.telegram.webhook_secret)
    }

    pub fn setup_key(&self) -> Option<&str> {
        non_empty(&self.server.setup_key)
    }

    /// Read `path` if it exists, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override fields from `lookup` (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BOT_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Some(v) = lookup("TELEGRAM_API_BASE") {
            self.telegram.api_base = v;
        }
        if let Some(v) = lookup("OWNER_ID") {
            self.telegram.owner_id = parse_id("OWNER_ID", &v)?;
        }
        if let Some(v) = lookup("LOG_CHAT_ID") {
            self.telegram.log_chat_id = parse_id("LOG_CHAT_ID", &v)?;
        }
        if let Some(v) = lookup("WEBHOOK_SECRET") {
            self.telegram.webhook_secret = v;
        }
        if let Some(v) = lookup("SETUP_KEY") {
            self.server.setup_key = v;
        }
        if let Some(v) = lookup("BIND_ADDR") {
            self.server.bind = v;
        }
        Ok(())
    }
}

fn parse_id(key: &str, value: &str) -> Result<i64> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse()
        .with_context(|| format!("{} must be an integer, got '{}'", key, value))
}
