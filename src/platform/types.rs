//! Telegram Bot API wire types.
//!
//! Only the fields this bot reads or writes are modeled; unknown fields in
//! inbound payloads are ignored.

use serde::{Deserialize, Serialize};

/// An incoming update. At most one of the optional payloads is set per delivery.
///
/// See also: <https://core.telegram.org/bots/api#update>.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,

    #[serde(default)]
    pub message: Option<Message>,

    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,

    #[serde(default)]
    pub pre_checkout_query: Option<PreCheckoutQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub from: Option<User>,

    pub chat: Chat,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub successful_payment: Option<SuccessfulPayment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// A button press on an inline keyboard.
///
/// `message` is absent when the originating message is too old to be
/// delivered; Telegram still sends the chat for inaccessible messages.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,

    pub from: User,

    #[serde(default)]
    pub message: Option<CallbackMessage>,

    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackMessage {
    pub chat: Chat,
}

/// <https://core.telegram.org/bots/api#precheckoutquery>
#[derive(Debug, Clone, Deserialize)]
pub struct PreCheckoutQuery {
    pub id: String,

    pub from: User,

    #[serde(default)]
    pub total_amount: i64,

    #[serde(default)]
    pub invoice_payload: String,
}

/// <https://core.telegram.org/bots/api#successfulpayment>
#[derive(Debug, Clone, Deserialize)]
pub struct SuccessfulPayment {
    pub currency: String,

    pub total_amount: i64,

    #[serde(default)]
    pub invoice_payload: String,

    pub telegram_payment_charge_id: String,

    #[serde(default)]
    pub provider_payment_charge_id: Option<String>,
}

/// <https://core.telegram.org/bots/api#inlinekeyboardmarkup>
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,

    /// Data sent back in a callback query when pressed, 1-64 bytes.
    pub callback_data: String,
}

/// Parameters of `sendMessage`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyMessage {
    pub chat_id: i64,

    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl ReplyMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_markup: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledPrice {
    pub label: String,
    pub amount: u32,
}

/// Parameters of `sendInvoice`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    pub chat_id: i64,
    pub title: String,
    pub description: String,
    pub payload: String,
    pub provider_token: String,
    pub currency: String,
    pub prices: Vec<LabeledPrice>,
}

/// Parameters of `answerCallbackQuery`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Parameters of `answerPreCheckoutQuery`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerPreCheckoutQuery {
    pub pre_checkout_query_id: String,
    pub ok: bool,
}

/// Parameters of `getStarTransactions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetStarTransactions {
    pub offset: u32,
    pub limit: u32,
}

/// Parameters of `setWebhook`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetWebhook {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<String>,

    pub drop_pending_updates: bool,

    pub allowed_updates: Vec<String>,
}
