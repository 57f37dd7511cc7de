//! [`ChatApi`] over teloxide.

use async_trait::async_trait;
use relay_core::{ChatId, MemberStatus, MessageId, MessageRef, UserId};
use teloxide::prelude::*;
use teloxide::types::{self as tg, ChatMemberStatus};
use teloxide::{ApiError, RequestError};
use tracing::info;

use crate::api::{ApiFailure, ChatApi};
use crate::classify;
use crate::config::TelegramSettings;

/// Wraps a `teloxide::Bot` whose HTTP client carries the configured request timeout.
/// Cloning the bot shares the underlying connection pool.
#[derive(Clone)]
pub struct TeloxideApi {
    bot: Bot,
}

impl TeloxideApi {
    pub fn new(settings: &TelegramSettings) -> anyhow::Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(settings.http_timeout())
            .build()?;
        let mut bot = Bot::with_client(settings.bot_token.clone(), client);
        if let Some(url) = &settings.api_url {
            let url = reqwest::Url::parse(url)?;
            info!(api_url = %url, "Using custom Telegram API URL");
            bot = bot.set_api_url(url);
        }
        Ok(Self { bot })
    }

    /// Wraps an existing bot as is.
    pub fn from_bot(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl ChatApi for TeloxideApi {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageId, ApiFailure> {
        let sent = self
            .bot
            .send_message(tg::ChatId(chat_id.0), text.to_string())
            .await?;
        Ok(MessageId(sent.id.0))
    }

    async fn forward(&self, to: ChatId, source: MessageRef) -> Result<MessageId, ApiFailure> {
        let sent = self
            .bot
            .forward_message(
                tg::ChatId(to.0),
                tg::ChatId(source.chat_id.0),
                tg::MessageId(source.message_id.0),
            )
            .await?;
        Ok(MessageId(sent.id.0))
    }

    async fn chat_member_status(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<MemberStatus, ApiFailure> {
        let member = self
            .bot
            .get_chat_member(tg::ChatId(chat_id.0), tg::UserId(user_id.0))
            .await?;
        Ok(member_status(member.status()))
    }

    async fn bot_username(&self) -> Result<String, ApiFailure> {
        let me = self.bot.get_me().await?;
        Ok(me.user.username.clone().unwrap_or_default())
    }
}

fn member_status(status: ChatMemberStatus) -> MemberStatus {
    match status {
        ChatMemberStatus::Owner => MemberStatus::Creator,
        ChatMemberStatus::Administrator => MemberStatus::Administrator,
        ChatMemberStatus::Member => MemberStatus::Member,
        ChatMemberStatus::Restricted => MemberStatus::Restricted,
        ChatMemberStatus::Left => MemberStatus::Left,
        ChatMemberStatus::Banned => MemberStatus::Kicked,
    }
}

impl From<RequestError> for ApiFailure {
    fn from(e: RequestError) -> Self {
        match e {
            // Descriptions teloxide has no variant for arrive verbatim inside `Unknown`;
            // its Display would prefix them with `Unknown error:` and hide the code.
            RequestError::Api(ApiError::Unknown(raw)) => {
                ApiFailure::rejected(classify::response_code(&raw), raw)
            }
            RequestError::Api(api) => {
                let description = api.to_string();
                ApiFailure::rejected(classify::response_code(&description), description)
            }
            RequestError::RetryAfter(after) => ApiFailure::rejected(
                Some(429),
                format!("Too Many Requests: retry after {:?}", after),
            ),
            // A fault of the chat id, not an answer about the user.
            RequestError::MigrateToChatId(id) => ApiFailure::rejected(
                None,
                format!("Bad Request: group chat was upgraded to supergroup {:?}", id),
            ),
            RequestError::Network(err) => {
                if err.is_timeout() {
                    ApiFailure::Timeout(Box::new(err))
                } else {
                    ApiFailure::Transport(Box::new(err))
                }
            }
            other @ RequestError::InvalidJson { .. } => ApiFailure::Malformed(Box::new(other)),
            other => ApiFailure::Transport(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_status_mapping() {
        assert_eq!(member_status(ChatMemberStatus::Owner), MemberStatus::Creator);
        assert_eq!(member_status(ChatMemberStatus::Banned), MemberStatus::Kicked);
        assert_eq!(member_status(ChatMemberStatus::Left), MemberStatus::Left);
        assert_eq!(
            member_status(ChatMemberStatus::Administrator),
            MemberStatus::Administrator
        );
    }

    #[test]
    fn test_api_error_keeps_description_and_code() {
        let failure = ApiFailure::from(RequestError::Api(ApiError::UserNotFound));
        match failure {
            ApiFailure::Rejected { code, description } => {
                assert_eq!(code, Some(400));
                assert!(description.starts_with("Bad Request"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_api_error_has_no_code() {
        let failure = ApiFailure::from(RequestError::Api(ApiError::Unknown(
            "Internal Server Error: restart".to_string(),
        )));
        assert_eq!(failure.code(), None);
    }

    #[test]
    fn test_unlisted_bad_request_keeps_raw_description() {
        for raw in [
            "Bad Request: PARTICIPANT_ID_INVALID",
            "Bad Request: member not found",
        ] {
            let failure = ApiFailure::from(RequestError::Api(ApiError::Unknown(raw.to_string())));
            match &failure {
                ApiFailure::Rejected { code, description } => {
                    assert_eq!(*code, Some(400), "{}", raw);
                    assert_eq!(description, raw);
                }
                other => panic!("unexpected {:?}", other),
            }
            assert_eq!(
                classify::membership_for_failure(&failure),
                Some(relay_core::Membership::NotMember)
            );
        }
    }

    #[test]
    fn test_migrated_chat_is_not_a_membership_answer() {
        let failure = ApiFailure::from(RequestError::MigrateToChatId(tg::ChatId(-100123)));
        assert_eq!(failure.code(), None);
        assert_eq!(classify::membership_for_failure(&failure), None);
    }

    #[test]
    fn test_new_rejects_bad_api_url() {
        let mut settings = TelegramSettings::with_token("123:abc");
        settings.api_url = Some("::not a url::".to_string());
        assert!(TeloxideApi::new(&settings).is_err());
    }
}
