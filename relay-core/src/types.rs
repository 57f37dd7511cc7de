//! Core types: chat/user/message ids, membership outcome, outgoing message payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target or source chat on the messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Message id, unique within its chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i32);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An existing message: the chat it lives in and its id there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl MessageRef {
    pub fn new(chat_id: ChatId, message_id: MessageId) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

/// Status reported by the platform for a user in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberStatus {
    /// `left` and `kicked` both mean the user is currently absent.
    pub fn membership(self) -> Membership {
        match self {
            MemberStatus::Left | MemberStatus::Kicked => Membership::NotMember,
            MemberStatus::Creator
            | MemberStatus::Administrator
            | MemberStatus::Member
            | MemberStatus::Restricted => Membership::Member,
        }
    }
}

/// Answer to "is user X currently in chat Y". The third outcome, a failed lookup,
/// is `Err(MessengerError::LookupFailed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    Member,
    NotMember,
}

impl Membership {
    pub fn is_member(self) -> bool {
        matches!(self, Membership::Member)
    }
}

/// Payload for one delivery to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutgoingMessage {
    Text {
        to: ChatId,
        text: String,
    },
    Forward {
        to: ChatId,
        source: MessageRef,
    },
    /// Caption text followed by the forwarded message. Not atomic.
    ForwardWithText {
        to: ChatId,
        source: MessageRef,
        text: String,
    },
}

impl OutgoingMessage {
    pub fn target(&self) -> ChatId {
        match self {
            OutgoingMessage::Text { to, .. }
            | OutgoingMessage::Forward { to, .. }
            | OutgoingMessage::ForwardWithText { to, .. } => *to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_and_kicked_are_not_members() {
        assert_eq!(MemberStatus::Left.membership(), Membership::NotMember);
        assert_eq!(MemberStatus::Kicked.membership(), Membership::NotMember);
    }

    #[test]
    fn test_present_statuses_are_members() {
        for status in [
            MemberStatus::Creator,
            MemberStatus::Administrator,
            MemberStatus::Member,
            MemberStatus::Restricted,
        ] {
            assert!(status.membership().is_member(), "{:?}", status);
        }
    }

    #[test]
    fn test_outgoing_message_target() {
        let source = MessageRef::new(ChatId(-100), MessageId(5));
        let msg = OutgoingMessage::ForwardWithText {
            to: ChatId(42),
            source,
            text: "look".to_string(),
        };
        assert_eq!(msg.target(), ChatId(42));
    }
}
