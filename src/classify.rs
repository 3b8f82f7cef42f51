//! Maps one inbound update to the single intent it represents.

use crate::platform::types::{CallbackQuery, Message, SuccessfulPayment, Update, User};
use crate::replies::{DonationAmount, DONATE_TOKEN_PREFIX};

pub const DEFAULT_TX_LIMIT: u32 = 10;
const MAX_TX_LIMIT: u32 = 100;

/// Who acted. Only used for authorization and log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: i64,
    pub display_name: Option<String>,
    pub handle: Option<String>,
}

impl From<&User> for UserIdentity {
    fn from(user: &User) -> Self {
        let full_name = match &user.last_name {
            Some(last) => format!("{} {}", user.first_name, last),
            None => user.first_name.clone(),
        };
        let full_name = full_name.trim();

        Self {
            id: user.id,
            display_name: (!full_name.is_empty()).then(|| full_name.to_string()),
            handle: user.username.clone().filter(|h| !h.is_empty()),
        }
    }
}

impl std::fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.display_name, &self.handle) {
            (Some(name), Some(handle)) => write!(f, "{} (@{}, id {})", name, handle, self.id),
            (Some(name), None) => write!(f, "{} (id {})", name, self.id),
            (None, Some(handle)) => write!(f, "@{} (id {})", handle, self.id),
            (None, None) => write!(f, "id {}", self.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Donate,
    Balance,
    Transactions { limit: u32 },
}

impl Command {
    /// Parse `/name[@bot] [args]`. `/donate`, `/balance` and `/tx` match by prefix.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?.strip_prefix('/')?;
        let name = head.split('@').next().unwrap_or(head);

        if name == "start" {
            Some(Command::Start)
        } else if name.starts_with("donate") {
            Some(Command::Donate)
        } else if name.starts_with("balance") {
            Some(Command::Balance)
        } else if name.starts_with("tx") {
            let limit = parts
                .next()
                .and_then(|arg| arg.parse::<u32>().ok())
                .map(|n| n.clamp(1, MAX_TX_LIMIT))
                .unwrap_or(DEFAULT_TX_LIMIT);
            Some(Command::Transactions { limit })
        } else {
            None
        }
    }

    pub fn is_privileged(self) -> bool {
        matches!(self, Command::Balance | Command::Transactions { .. })
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Start => "/start",
            Command::Donate => "/donate",
            Command::Balance => "/balance",
            Command::Transactions { .. } => "/tx",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Intent {
    ConfirmPreCheckout {
        query_id: String,
        payer: UserIdentity,
        amount: i64,
        payload: String,
    },
    AcknowledgePayment {
        chat_id: i64,
        payer: UserIdentity,
        payment: SuccessfulPayment,
    },
    Command {
        chat_id: i64,
        user: UserIdentity,
        command: Command,
    },
    CreateInvoice {
        callback_id: String,
        chat_id: i64,
        user: UserIdentity,
        amount: DonationAmount,
    },
    RejectInvoice {
        callback_id: String,
        user: UserIdentity,
        token: String,
    },
    Unrecognized,
}

/// Checked in latency order: pre-checkout first, then payments, text, buttons.
pub fn classify(update: Update) -> Intent {
    if let Some(query) = update.pre_checkout_query {
        return Intent::ConfirmPreCheckout {
            payer: UserIdentity::from(&query.from),
            query_id: query.id,
            amount: query.total_amount,
            payload: query.invoice_payload,
        };
    }

    if let Some(message) = update.message {
        return classify_message(message);
    }

    if let Some(callback) = update.callback_query {
        return classify_callback(callback);
    }

    Intent::Unrecognized
}

fn classify_message(message: Message) -> Intent {
    let chat_id = message.chat.id;

    if let Some(payment) = message.successful_payment {
        let payer = message
            .from
            .as_ref()
            .map(UserIdentity::from)
            .unwrap_or(UserIdentity {
                id: chat_id,
                display_name: None,
                handle: None,
            });
        return Intent::AcknowledgePayment {
            chat_id,
            payer,
            payment,
        };
    }

    let (Some(user), Some(text)) = (message.from.as_ref(), message.text.as_deref()) else {
        return Intent::Unrecognized;
    };

    match Command::parse(text) {
        Some(command) => Intent::Command {
            chat_id,
            user: UserIdentity::from(user),
            command,
        },
        None => Intent::Unrecognized,
    }
}

fn classify_callback(callback: CallbackQuery) -> Intent {
    let Some(token) = callback.data else {
        return Intent::Unrecognized;
    };
    let Some(raw_amount) = token.strip_prefix(DONATE_TOKEN_PREFIX) else {
        return Intent::Unrecognized;
    };

    let user = UserIdentity::from(&callback.from);
    match DonationAmount::parse(raw_amount) {
        Some(amount) => Intent::CreateInvoice {
            callback_id: callback.id,
            chat_id: callback
                .message
                .map(|m| m.chat.id)
                .unwrap_or(callback.from.id),
            user,
            amount,
        },
        None => Intent::RejectInvoice {
            callback_id: callback.id,
            user,
            token,
        },
    }
}
