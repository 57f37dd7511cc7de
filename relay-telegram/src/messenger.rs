//! [`Messenger`] over a [`ChatApi`].
//!
//! Every platform call runs inside the caller's [`RelayContext`], so it stops at the context
//! deadline or on cancellation as well as at the HTTP client timeout. Membership lookups go
//! through the tables in [`crate::classify`].

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{
    mask_secret, ChatId, Membership, MessageId, MessageRef, Messenger, MessengerError,
    RelayContext, UserId,
};
use tracing::{debug, debug_span, info, warn, Instrument};

use crate::api::ChatApi;
use crate::classify;
use crate::config::TelegramSettings;
use crate::teloxide_api::TeloxideApi;

/// Telegram messaging gateway. Holds no per-call state; share it behind an `Arc`.
#[derive(Clone)]
pub struct TelegramMessenger {
    api: Arc<dyn ChatApi>,
}

impl TelegramMessenger {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self { api }
    }

    /// Builds the teloxide transport and verifies the token with `getMe`.
    pub async fn connect(
        settings: &TelegramSettings,
        ctx: &RelayContext,
    ) -> Result<Self, MessengerError> {
        let api = TeloxideApi::new(settings)
            .map_err(|e| MessengerError::Setup(format!("{:#}", e)))?;
        let username = ctx
            .run_with_timeout(settings.http_timeout(), api.bot_username())
            .await?
            .map_err(|e| MessengerError::Setup(format!("token verification failed: {}", e)))?;
        info!(
            parent: ctx.span(),
            bot = %username,
            token = %mask_secret(&settings.bot_token),
            "Telegram messenger connected"
        );
        Ok(Self::new(Arc::new(api)))
    }

    pub fn api(&self) -> &Arc<dyn ChatApi> {
        &self.api
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(
        &self,
        ctx: &RelayContext,
        chat_id: ChatId,
        text: &str,
    ) -> Result<(), MessengerError> {
        let span = debug_span!(parent: ctx.span(), "telegram.send_text", chat_id = %chat_id);
        let outcome = ctx
            .run(self.api.send_text(chat_id, text))
            .instrument(span.clone())
            .await?;
        match outcome {
            Ok(message_id) => {
                debug!(parent: &span, message_id = %message_id, "Text delivered");
                Ok(())
            }
            Err(e) => {
                warn!(parent: &span, error = %e, "Text delivery failed");
                Err(MessengerError::delivery(
                    format!("sendMessage to chat {}", chat_id),
                    e,
                ))
            }
        }
    }

    async fn send_forward(
        &self,
        ctx: &RelayContext,
        to_chat_id: ChatId,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), MessengerError> {
        let span = debug_span!(
            parent: ctx.span(),
            "telegram.forward",
            chat_id = %to_chat_id,
            from_chat_id = %from_chat_id,
            message_id = %message_id
        );
        let source = MessageRef::new(from_chat_id, message_id);
        let outcome = ctx
            .run(self.api.forward(to_chat_id, source))
            .instrument(span.clone())
            .await?;
        match outcome {
            Ok(forwarded) => {
                debug!(parent: &span, forwarded_id = %forwarded, "Message forwarded");
                Ok(())
            }
            Err(e) => {
                warn!(parent: &span, error = %e, "Forward failed");
                Err(MessengerError::delivery(
                    format!(
                        "forwardMessage {} from chat {} to chat {}",
                        message_id, from_chat_id, to_chat_id
                    ),
                    e,
                ))
            }
        }
    }

    async fn is_user_in_chat(
        &self,
        ctx: &RelayContext,
        user_id: UserId,
        chat_id: ChatId,
    ) -> Result<Membership, MessengerError> {
        let span = debug_span!(
            parent: ctx.span(),
            "telegram.member_lookup",
            chat_id = %chat_id,
            user_id = %user_id
        );
        let outcome = ctx
            .run(self.api.chat_member_status(chat_id, user_id))
            .instrument(span.clone())
            .await?;
        match outcome {
            Ok(status) => {
                let membership = status.membership();
                debug!(parent: &span, ?status, ?membership, "Membership resolved");
                Ok(membership)
            }
            Err(failure) => match classify::membership_for_failure(&failure) {
                Some(membership) => {
                    debug!(parent: &span, reason = %failure, ?membership, "Lookup rejected as non-member");
                    Ok(membership)
                }
                None => {
                    warn!(parent: &span, error = %failure, "Membership lookup failed");
                    Err(MessengerError::lookup(
                        format!("getChatMember user {} in chat {}", user_id, chat_id),
                        failure,
                    ))
                }
            },
        }
    }
}
