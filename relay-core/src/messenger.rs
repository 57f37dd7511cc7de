//! Messaging gateway abstraction.
//!
//! [`Messenger`] is transport-agnostic; `relay-telegram` implements it over the Telegram Bot API.
//! Implementations hold no per-call mutable state and are shared across workers behind an `Arc`.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::context::RelayContext;
use crate::error::MessengerError;
use crate::types::{ChatId, Membership, MessageId, MessageRef, OutgoingMessage, UserId};

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends a plain text message. Any non-success response is `DeliveryFailed`.
    async fn send_text(
        &self,
        ctx: &RelayContext,
        chat_id: ChatId,
        text: &str,
    ) -> Result<(), MessengerError>;

    /// Forwards `message_id` from `from_chat_id` into `to_chat_id`.
    async fn send_forward(
        &self,
        ctx: &RelayContext,
        to_chat_id: ChatId,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), MessengerError>;

    /// Sends `text`, then forwards the message.
    ///
    /// If the text fails the forward is not attempted. The pair is not atomic: when the
    /// forward fails the text has already been delivered and stays delivered. Callers that
    /// need exactly-once pairs must retry idempotently or reconcile on their side.
    async fn send_forward_with_text(
        &self,
        ctx: &RelayContext,
        to_chat_id: ChatId,
        from_chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), MessengerError> {
        self.send_text(ctx, to_chat_id, text).await?;
        if let Err(e) = self
            .send_forward(ctx, to_chat_id, from_chat_id, message_id)
            .await
        {
            warn!(
                parent: ctx.span(),
                chat_id = %to_chat_id,
                message_id = %message_id,
                error = %e,
                "Forward failed after caption was delivered"
            );
            return Err(e);
        }
        Ok(())
    }

    /// Whether `user_id` currently participates in `chat_id`.
    async fn is_user_in_chat(
        &self,
        ctx: &RelayContext,
        user_id: UserId,
        chat_id: ChatId,
    ) -> Result<Membership, MessengerError>;

    /// Dispatches an [`OutgoingMessage`] to the matching send operation.
    async fn deliver(
        &self,
        ctx: &RelayContext,
        message: &OutgoingMessage,
    ) -> Result<(), MessengerError> {
        debug!(parent: ctx.span(), chat_id = %message.target(), "Delivering message");
        match message {
            OutgoingMessage::Text { to, text } => self.send_text(ctx, *to, text).await,
            OutgoingMessage::Forward { to, source } => {
                self.send_forward(ctx, *to, source.chat_id, source.message_id)
                    .await
            }
            OutgoingMessage::ForwardWithText { to, source, text } => {
                let MessageRef {
                    chat_id,
                    message_id,
                } = *source;
                self.send_forward_with_text(ctx, *to, chat_id, message_id, text)
                    .await
            }
        }
    }
}
