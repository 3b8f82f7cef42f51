//! Reply builders. Everything here is pure: it only shapes request bodies.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::classify::UserIdentity;
use crate::platform::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, Invoice, LabeledPrice, ReplyMessage,
    SuccessfulPayment,
};

/// Every amount an invoice may be created for, ascending.
pub const ALLOWED_AMOUNTS: [u32; 7] = [500, 1000, 1500, 2000, 3000, 4000, 5000];

/// Amounts offered on the donation keyboard, in display order.
pub const MENU_AMOUNTS: [u32; 6] = [500, 1000, 1500, 2000, 3000, 5000];

/// Currency code of Telegram Stars.
pub const STARS_CURRENCY: &str = "XTR";

pub const DONATE_TOKEN_PREFIX: &str = "donate:";

pub const REJECTED_AMOUNT_TEXT: &str = "This amount is not available.";

pub const RESTRICTED_TEXT: &str = "This command is only available to the bot owner.";

/// Telegram rejects messages over 4096 characters.
pub const MAX_MESSAGE_LEN: usize = 4000;

const MENU_COLUMNS: usize = 2;

/// An amount known to be in [`ALLOWED_AMOUNTS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonationAmount(u32);

impl DonationAmount {
    pub fn new(amount: u32) -> Option<Self> {
        ALLOWED_AMOUNTS.contains(&amount).then_some(Self(amount))
    }

    /// Only the exact decimal form this bot emits, e.g. `"500"`; `"+500"` and
    /// `"0500"` are refused.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse::<u32>()
            .ok()
            .filter(|amount| amount.to_string() == raw)
            .and_then(Self::new)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for DonationAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn donate_token(amount: u32) -> String {
    format!("{DONATE_TOKEN_PREFIX}{amount}")
}

/// The amount keyboard, two buttons per row.
pub fn donation_menu(chat_id: i64) -> ReplyMessage {
    let inline_keyboard = MENU_AMOUNTS
        .chunks(MENU_COLUMNS)
        .map(|row| {
            row.iter()
                .map(|&amount| InlineKeyboardButton {
                    text: format!("{amount} ⭐"),
                    callback_data: donate_token(amount),
                })
                .collect()
        })
        .collect();

    ReplyMessage {
        chat_id,
        text: "Thanks for considering a donation! Choose an amount of Stars:".to_string(),
        reply_markup: Some(InlineKeyboardMarkup { inline_keyboard }),
    }
}

/// `donate:<amount>:<unix_millis>:<nonce>`. Opaque to everything downstream.
pub fn invoice_payload(amount: DonationAmount, created_at: DateTime<Utc>, nonce: &str) -> String {
    format!(
        "{DONATE_TOKEN_PREFIX}{}:{}:{}",
        amount,
        created_at.timestamp_millis(),
        nonce
    )
}

pub fn new_invoice_payload(amount: DonationAmount) -> String {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    invoice_payload(amount, Utc::now(), &nonce[..8])
}

/// A Stars invoice: empty provider token, a single price line.
pub fn invoice(chat_id: i64, amount: DonationAmount, payload: String) -> Invoice {
    Invoice {
        chat_id,
        title: format!("Donation of {amount} Stars"),
        description: "Support the development of this bot.".to_string(),
        payload,
        provider_token: String::new(),
        currency: STARS_CURRENCY.to_string(),
        prices: vec![LabeledPrice {
            label: "Donation".to_string(),
            amount: amount.get(),
        }],
    }
}

pub fn thank_you(chat_id: i64, amount: i64) -> ReplyMessage {
    ReplyMessage::text(
        chat_id,
        format!("Thank you for your donation of {amount} ⭐! Your support means a lot."),
    )
}

pub fn payment_log(
    log_chat_id: i64,
    payer: &UserIdentity,
    payment: &SuccessfulPayment,
    captured_at: DateTime<Utc>,
) -> ReplyMessage {
    let mut text = format!(
        "💰 New donation\n\
         From: {payer}\n\
         Amount: {} {}\n\
         Payload: {}\n\
         Charge ID: {}\n",
        payment.total_amount,
        payment.currency,
        payment.invoice_payload,
        payment.telegram_payment_charge_id,
    );
    if let Some(provider_charge) = payment
        .provider_payment_charge_id
        .as_deref()
        .filter(|id| !id.is_empty())
    {
        text.push_str(&format!("Provider charge ID: {}\n", provider_charge));
    }
    text.push_str(&format!("At: {}", captured_at.to_rfc3339()));

    ReplyMessage::text(log_chat_id, text)
}

pub fn restricted(chat_id: i64) -> ReplyMessage {
    ReplyMessage::text(chat_id, RESTRICTED_TEXT)
}

/// Pretty JSON under a title; falls back to the compact form.
pub fn render_resource(title: &str, value: &Value) -> String {
    let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    format!("{title}\n\n{body}")
}

/// A rendered resource as one or more messages that fit Telegram's limit.
pub fn resource_replies(chat_id: i64, title: &str, value: &Value) -> Vec<ReplyMessage> {
    split_message(&render_resource(title, value), MAX_MESSAGE_LEN)
        .into_iter()
        .map(|chunk| ReplyMessage::text(chat_id, chunk))
        .collect()
}

/// Split text into chunks of at most `max_len` bytes, preferring line or
/// word boundaries.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_amount_membership() {
        assert_eq!(DonationAmount::new(1000).map(DonationAmount::get), Some(1000));
        assert_eq!(DonationAmount::new(4000).map(DonationAmount::get), Some(4000));
        assert!(DonationAmount::new(999).is_none());
        assert!(DonationAmount::new(0).is_none());
    }

    #[test]
    fn test_amount_parse_is_canonical() {
        assert_eq!(DonationAmount::parse("500").map(DonationAmount::get), Some(500));
        assert_eq!(DonationAmount::parse("4000").map(DonationAmount::get), Some(4000));
        for raw in ["+500", "0500", " 500", "500 ", "999", "", "abc"] {
            assert!(DonationAmount::parse(raw).is_none(), "{raw:?} was accepted");
        }
    }

    #[test]
    fn test_menu_amounts_are_allowed() {
        assert!(MENU_AMOUNTS.iter().all(|&a| DonationAmount::new(a).is_some()));
    }

    #[test]
    fn test_donation_menu_grid() {
        let menu = donation_menu(77);
        assert_eq!(menu.chat_id, 77);

        let rows: Vec<Vec<&str>> = menu
            .reply_markup
            .as_ref()
            .unwrap()
            .inline_keyboard
            .iter()
            .map(|row| row.iter().map(|b| b.callback_data.as_str()).collect())
            .collect();

        assert_eq!(
            rows,
            vec![
                vec!["donate:500", "donate:1000"],
                vec!["donate:1500", "donate:2000"],
                vec!["donate:3000", "donate:5000"],
            ]
        );
    }

    #[test]
    fn test_invoice_uses_stars() {
        let amount = DonationAmount::new(1000).unwrap();
        let body = serde_json::to_value(invoice(5, amount, "p".to_string())).unwrap();

        assert_eq!(body["provider_token"], "");
        assert_eq!(body["currency"], "XTR");
        assert_eq!(body["payload"], "p");
        assert_eq!(body["prices"], json!([{"label": "Donation", "amount": 1000}]));
    }

    #[test]
    fn test_invoice_payload_layout() {
        let amount = DonationAmount::new(1500).unwrap();
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            invoice_payload(amount, at, "deadbeef"),
            "donate:1500:1700000000123:deadbeef"
        );
    }

    #[test]
    fn test_fresh_payloads_differ() {
        let amount = DonationAmount::new(500).unwrap();
        let a = new_invoice_payload(amount);
        let b = new_invoice_payload(amount);
        assert!(a.starts_with("donate:500:"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_payment_log_fields() {
        let payer = UserIdentity {
            id: 42,
            display_name: Some("Ada Lovelace".to_string()),
            handle: Some("ada".to_string()),
        };
        let payment = SuccessfulPayment {
            currency: "XTR".to_string(),
            total_amount: 500,
            invoice_payload: "donate:500:1:abcd".to_string(),
            telegram_payment_charge_id: "tg-charge-1".to_string(),
            provider_payment_charge_id: None,
        };
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let log = payment_log(-100, &payer, &payment, at);
        assert_eq!(log.chat_id, -100);
        assert!(log.text.contains("Ada Lovelace (@ada, id 42)"));
        assert!(log.text.contains("Amount: 500 XTR"));
        assert!(log.text.contains("donate:500:1:abcd"));
        assert!(log.text.contains("tg-charge-1"));
        assert!(log.text.contains("2023-11-14T22:13:20+00:00"));
    }

    #[test]
    fn test_render_resource_is_legible() {
        let text = render_resource("Balance", &json!({"amount": 1500}));
        assert!(text.starts_with("Balance\n\n"));
        assert!(text.contains("\"amount\": 1500"));
    }

    #[test]
    fn test_resource_replies_split_long_output() {
        let transactions: Vec<Value> = (0..300)
            .map(|i| json!({"id": format!("tx-{i}"), "amount": i}))
            .collect();
        let replies = resource_replies(9, "Transactions", &json!({"transactions": transactions}));

        assert!(replies.len() > 1);
        assert!(replies.iter().all(|r| r.chat_id == 9));
        assert!(replies.iter().all(|r| r.text.len() <= MAX_MESSAGE_LEN));
    }

    #[test]
    fn test_split_message_short_text_untouched() {
        assert_eq!(split_message("hello", 10), vec!["hello".to_string()]);
    }

    #[test]
    fn test_split_message_prefers_newlines() {
        let chunks = split_message("aaaa\nbbbb\ncccc", 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn test_split_message_respects_char_boundaries() {
        let text = "⭐".repeat(10);
        let chunks = split_message(&text, 4);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| c.len() <= 4));
    }
}
