//! # relay-core
//!
//! Shared pieces of the event relay: chat/user/message ids, the per-call [`RelayContext`]
//! (logging span, deadline, cancellation), the transport-agnostic [`Messenger`] trait,
//! the error taxonomy, and the [`EventHandler`] worker fan-out. Used by `storage`,
//! `relay-telegram` and `relay-cli`.

pub mod context;
pub mod error;
pub mod logger;
pub mod messenger;
pub mod relay;
pub mod types;

pub use context::RelayContext;
pub use error::{BoxError, Interrupted, MessengerError, RelayError, Result};
pub use logger::{init_tracing, mask_secret};
pub use messenger::Messenger;
pub use relay::{spawn_workers, EventHandler};
pub use types::{
    ChatId, MemberStatus, Membership, MessageId, MessageRef, OutgoingMessage, UserId,
};
