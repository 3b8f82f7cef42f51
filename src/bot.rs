use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::auth;
use crate::classify::{self, Command, Intent, UserIdentity};
use crate::platform::types::{
    AnswerCallbackQuery, AnswerPreCheckoutQuery, GetStarTransactions, ReplyMessage,
    SuccessfulPayment, Update,
};
use crate::platform::{self, PlatformApi, PlatformApiError};
use crate::replies::{self, DonationAmount};

/// Runs the protocol for each classified update.
///
/// Holds no per-event state; one instance serves every delivery.
pub struct DonateBot {
    api: Arc<dyn PlatformApi>,
    owner_id: i64,
    log_chat_id: Option<i64>,
}

impl DonateBot {
    pub fn new(api: Arc<dyn PlatformApi>, owner_id: i64, log_chat_id: Option<i64>) -> Self {
        Self {
            api,
            owner_id,
            log_chat_id,
        }
    }

    /// Handle one update to completion. Failures are logged, never returned:
    /// by the time this runs the delivery has already been acknowledged.
    ///
    /// Every log line emitted while handling carries the `update_id`.
    pub async fn handle_update(&self, update: Update) {
        let span = info_span!("update", update_id = update.update_id);
        async {
            if let Err(e) = self.dispatch(classify::classify(update)).await {
                error!("Failed to handle update: {}", e);
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, intent: Intent) -> Result<(), PlatformApiError> {
        match intent {
            Intent::ConfirmPreCheckout {
                query_id,
                payer,
                amount,
                payload,
            } => {
                // Must be the first call: Telegram cancels the payment if
                // this answer is late.
                self.confirm_pre_checkout(query_id).await?;
                info!(
                    "Approved pre-checkout {} of {} ⭐ from {}",
                    payload, amount, payer
                );
                Ok(())
            }
            Intent::AcknowledgePayment {
                chat_id,
                payer,
                payment,
            } => {
                self.acknowledge_payment(chat_id, &payer, &payment).await;
                Ok(())
            }
            Intent::Command {
                chat_id,
                user,
                command,
            } => self.run_command(chat_id, &user, command).await,
            Intent::CreateInvoice {
                callback_id,
                chat_id,
                user,
                amount,
            } => self.create_invoice(callback_id, chat_id, &user, amount).await,
            Intent::RejectInvoice {
                callback_id,
                user,
                token,
            } => {
                warn!("Rejected donation token '{}' from {}", token, user);
                self.answer_callback(callback_id, Some(replies::REJECTED_AMOUNT_TEXT))
                    .await
            }
            Intent::Unrecognized => {
                debug!("Ignoring unrecognized update");
                Ok(())
            }
        }
    }

    async fn confirm_pre_checkout(&self, query_id: String) -> Result<(), PlatformApiError> {
        platform::request(
            self.api.as_ref(),
            "answerPreCheckoutQuery",
            &AnswerPreCheckoutQuery {
                pre_checkout_query_id: query_id,
                ok: true,
            },
        )
        .await?;
        Ok(())
    }

    /// Thank the payer and, if configured, report to the log chat. The two
    /// sends run concurrently and fail independently.
    async fn acknowledge_payment(
        &self,
        chat_id: i64,
        payer: &UserIdentity,
        payment: &SuccessfulPayment,
    ) {
        info!(
            "Donation of {} {} from {} (charge {})",
            payment.total_amount, payment.currency, payer, payment.telegram_payment_charge_id
        );

        let thank_you = self.send(replies::thank_you(chat_id, payment.total_amount));
        let log = async {
            match self.log_chat_id {
                Some(log_chat_id) => {
                    let line = replies::payment_log(log_chat_id, payer, payment, Utc::now());
                    Some(self.send(line).await)
                }
                None => None,
            }
        };

        let (thank_you, log) = futures::join!(thank_you, log);

        if let Err(e) = thank_you {
            error!("Failed to thank {}: {}", payer, e);
        }
        if let Some(Err(e)) = log {
            error!("Failed to log donation from {}: {}", payer, e);
        }
    }

    async fn run_command(
        &self,
        chat_id: i64,
        user: &UserIdentity,
        command: Command,
    ) -> Result<(), PlatformApiError> {
        info!("Command {} from {}", command.name(), user);

        if command.is_privileged() {
            if let Err(e) = auth::require_privileged(self.owner_id, user.id, command.name()) {
                warn!("Refused: {}", e);
                return self.send(replies::restricted(chat_id)).await;
            }
        }

        match command {
            Command::Start | Command::Donate => self.send(replies::donation_menu(chat_id)).await,
            Command::Balance => {
                let balance = self.api.call("getMyStarBalance", json!({})).await?;
                self.send_resource(chat_id, "⭐ Star balance", &balance)
                    .await
            }
            Command::Transactions { limit } => {
                let transactions = platform::request(
                    self.api.as_ref(),
                    "getStarTransactions",
                    &GetStarTransactions { offset: 0, limit },
                )
                .await?;
                self.send_resource(chat_id, "🧾 Star transactions", &transactions)
                    .await
            }
        }
    }

    async fn create_invoice(
        &self,
        callback_id: String,
        chat_id: i64,
        user: &UserIdentity,
        amount: DonationAmount,
    ) -> Result<(), PlatformApiError> {
        self.answer_callback(callback_id, None).await?;

        let payload = replies::new_invoice_payload(amount);
        info!("Sending invoice {} for {} ⭐ to {}", payload, amount, user);

        platform::request(
            self.api.as_ref(),
            "sendInvoice",
            &replies::invoice(chat_id, amount, payload),
        )
        .await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: String,
        text: Option<&str>,
    ) -> Result<(), PlatformApiError> {
        platform::request(
            self.api.as_ref(),
            "answerCallbackQuery",
            &AnswerCallbackQuery {
                callback_query_id: callback_id,
                text: text.map(str::to_string),
            },
        )
        .await?;
        Ok(())
    }

    async fn send_resource(
        &self,
        chat_id: i64,
        title: &str,
        value: &Value,
    ) -> Result<(), PlatformApiError> {
        for reply in replies::resource_replies(chat_id, title, value) {
            self.send(reply).await?;
        }
        Ok(())
    }

    async fn send(&self, reply: ReplyMessage) -> Result<(), PlatformApiError> {
        platform::request(self.api.as_ref(), "sendMessage", &reply).await?;
        Ok(())
    }
}
