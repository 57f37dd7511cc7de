//! Recording [`ChatApi`] double with scripted outcomes.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use relay_core::{ChatId, MemberStatus, MessageId, MessageRef, UserId};
use relay_telegram::{ApiFailure, ChatApi};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Text { chat_id: ChatId, text: String },
    Forward { to: ChatId, source: MessageRef },
    Member { chat_id: ChatId, user_id: UserId },
}

/// What the next call of a kind returns.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    Ok,
    /// `Rejected` with the given code and a matching description.
    Reject(u16),
    Timeout,
    /// Never answers.
    Hang,
}

pub struct FakeChatApi {
    pub calls: Mutex<Vec<Call>>,
    pub text: Script,
    pub forward: Script,
    pub member: Script,
    pub status: MemberStatus,
    pub delay: Duration,
}

impl Default for FakeChatApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            text: Script::Ok,
            forward: Script::Ok,
            member: Script::Ok,
            status: MemberStatus::Member,
            delay: Duration::ZERO,
        }
    }
}

impl FakeChatApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn texts(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Text { .. }))
            .count()
    }

    pub fn forwards(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Forward { .. }))
            .count()
    }

    async fn play(&self, script: Script) -> Result<(), ApiFailure> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match script {
            Script::Ok => Ok(()),
            Script::Reject(code) => Err(ApiFailure::rejected(Some(code), description(code))),
            Script::Timeout => Err(ApiFailure::Timeout("operation timed out".into())),
            Script::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

fn description(code: u16) -> &'static str {
    match code {
        400 => "Bad Request: user not found",
        401 => "Unauthorized",
        403 => "Forbidden: bot was kicked from the supergroup chat",
        429 => "Too Many Requests: retry after 3",
        _ => "Internal Server Error",
    }
}

#[async_trait]
impl ChatApi for FakeChatApi {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageId, ApiFailure> {
        self.calls.lock().unwrap().push(Call::Text {
            chat_id,
            text: text.to_string(),
        });
        self.play(self.text).await.map(|_| MessageId(100))
    }

    async fn forward(&self, to: ChatId, source: MessageRef) -> Result<MessageId, ApiFailure> {
        self.calls.lock().unwrap().push(Call::Forward { to, source });
        self.play(self.forward).await.map(|_| MessageId(101))
    }

    async fn chat_member_status(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<MemberStatus, ApiFailure> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Member { chat_id, user_id });
        self.play(self.member).await.map(|_| self.status)
    }

    async fn bot_username(&self) -> Result<String, ApiFailure> {
        Ok("fake_bot".to_string())
    }
}
