//! Transport seam between [`crate::TelegramMessenger`] and the Bot API.
//!
//! [`ChatApi`] is the three calls the gateway needs plus a token check. [`crate::TeloxideApi`]
//! is the real implementation; tests substitute recording fakes.

use async_trait::async_trait;
use relay_core::{BoxError, ChatId, MemberStatus, MessageId, MessageRef, UserId};
use thiserror::Error;

/// Why a Bot API call did not succeed.
#[derive(Error, Debug)]
pub enum ApiFailure {
    /// The platform answered with `ok: false`. `code` is the documented response code when
    /// the description could be mapped to one.
    #[error("Rejected by platform: {description}")]
    Rejected {
        code: Option<u16>,
        description: String,
    },

    #[error("Request timed out: {0}")]
    Timeout(#[source] BoxError),

    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// The response could not be parsed.
    #[error("Malformed response: {0}")]
    Malformed(#[source] BoxError),
}

impl ApiFailure {
    pub fn rejected(code: Option<u16>, description: impl Into<String>) -> Self {
        ApiFailure::Rejected {
            code,
            description: description.into(),
        }
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            ApiFailure::Rejected { code, .. } => *code,
            _ => None,
        }
    }
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `sendMessage`; returns the id of the new message.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageId, ApiFailure>;

    /// `forwardMessage`; returns the id of the copy in `to`.
    async fn forward(&self, to: ChatId, source: MessageRef) -> Result<MessageId, ApiFailure>;

    /// `getChatMember`
    async fn chat_member_status(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<MemberStatus, ApiFailure>;

    /// `getMe`; returns the bot's username. Used to verify the token.
    async fn bot_username(&self) -> Result<String, ApiFailure>;
}
