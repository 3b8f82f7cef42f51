//! Donate bot setup wizard.
//!
//! Asks for the bot token, owner and log chat in the terminal and writes
//! `config.toml` to the project root (or `DONATEBOT_ROOT`). A random setup
//! key and webhook secret are generated when left blank.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

// ── Config formatting ──────────────────────────────────────────────────────────

struct ConfigParams<'a> {
    bot_token: &'a str,
    owner_id: &'a str,
    log_chat_id: &'a str,
    webhook_secret: &'a str,
    bind: &'a str,
    setup_key: &'a str,
}

/// Blank or non-numeric ids become 0, which disables the feature.
fn id_or_zero(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(0)
}

/// Produces a valid config.toml string. Extracted so it can be unit-tested.
fn format_config(p: &ConfigParams<'_>) -> String {
    let bot_token = p.bot_token;
    let owner_id = id_or_zero(p.owner_id);
    let log_chat_id = id_or_zero(p.log_chat_id);
    let webhook_secret = p.webhook_secret;
    let bind = p.bind;
    let setup_key = p.setup_key;

    let log_comment = if log_chat_id == 0 {
        "# Donation log disabled. Set to a chat id to receive one line per donation."
    } else {
        "# Every donation is reported to this chat."
    };

    format!(
        r#"[telegram]
bot_token = "{bot_token}"
api_base = "https://api.telegram.org"
owner_id = {owner_id}
{log_comment}
log_chat_id = {log_chat_id}
webhook_secret = "{webhook_secret}"

[server]
bind = "{bind}"
setup_key = "{setup_key}"
"#
    )
}

/// 32 hex characters; valid as a Telegram secret token and a URL parameter.
fn random_secret() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// ── CLI ────────────────────────────────────────────────────────────────────────

fn run_cli(project_root: &Path) -> Result<()> {
    println!("=== Donate Bot Setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let or_default = |s: String, default: String| {
        if s.is_empty() {
            default
        } else {
            s
        }
    };

    let bot_token = read_line("Telegram bot token: ")?;
    let owner_id = read_line("Owner user ID (allowed to run /balance and /tx): ")?;
    let log_chat_id = read_line("Donation log chat ID (optional): ")?;
    let webhook_secret = or_default(
        read_line("Webhook secret [random]: ")?,
        random_secret(),
    );
    let bind = or_default(
        read_line("Listen address [0.0.0.0:8080]: ")?,
        "0.0.0.0:8080".to_string(),
    );
    let setup_key = or_default(read_line("Setup key [random]: ")?, random_secret());

    let config = format_config(&ConfigParams {
        bot_token: &bot_token,
        owner_id: &owner_id,
        log_chat_id: &log_chat_id,
        webhook_secret: &webhook_secret,
        bind: &bind,
        setup_key: &setup_key,
    });

    let config_path = project_root.join("config.toml");
    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;

    println!("\n✓  config.toml saved to {}", config_path.display());
    println!("   Run the bot with:  cargo run");
    println!("   Then open:         https://<your-host>/setup?key={setup_key}");
    Ok(())
}

fn main() -> Result<()> {
    // Resolve project root: prefer DONATEBOT_ROOT env, fall back to cwd.
    let project_root =
        PathBuf::from(std::env::var("DONATEBOT_ROOT").unwrap_or_else(|_| ".".to_string()));

    run_cli(&project_root)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(bot_token: &str, owner_id: &str, log_chat_id: &str, setup_key: &str) -> String {
        format_config(&ConfigParams {
            bot_token,
            owner_id,
            log_chat_id,
            webhook_secret: "hook-secret",
            bind: "0.0.0.0:8080",
            setup_key,
        })
    }

    #[test]
    fn test_telegram_section_present() {
        let out = cfg("123:abc", "42", "-1001", "key");
        assert!(out.contains("[telegram]"));
        assert!(out.contains(r#"bot_token = "123:abc""#));
        assert!(out.contains("owner_id = 42"));
        assert!(out.contains("log_chat_id = -1001"));
        assert!(out.contains(r#"webhook_secret = "hook-secret""#));
    }

    #[test]
    fn test_server_section_present() {
        let out = cfg("t", "1", "", "letmein");
        assert!(out.contains("[server]"));
        assert!(out.contains(r#"bind = "0.0.0.0:8080""#));
        assert!(out.contains(r#"setup_key = "letmein""#));
    }

    #[test]
    fn test_blank_ids_disable_features() {
        let out = cfg("t", "", "", "k");
        assert!(out.contains("owner_id = 0"));
        assert!(out.contains("log_chat_id = 0"));
        assert!(out.contains("# Donation log disabled"));
    }

    #[test]
    fn test_output_is_valid_toml() {
        let out = cfg("t", "42", "-1001", "k");
        let parsed: toml::Value = toml::from_str(&out).unwrap();
        assert_eq!(parsed["telegram"]["owner_id"].as_integer(), Some(42));
        assert_eq!(parsed["server"]["setup_key"].as_str(), Some("k"));
    }

    #[test]
    fn test_random_secrets_differ() {
        let a = random_secret();
        assert_eq!(a.len(), 32);
        assert_ne!(a, random_secret());
    }
}
