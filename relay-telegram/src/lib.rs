//! # relay-telegram
//!
//! Telegram implementation of [`relay_core::Messenger`]: a teloxide transport behind the
//! [`ChatApi`] seam, the [`TelegramMessenger`] gateway, and [`TelegramSettings`].

pub mod api;
pub mod classify;
pub mod config;
pub mod messenger;
pub mod teloxide_api;

pub use api::{ApiFailure, ChatApi};
pub use config::TelegramSettings;
pub use messenger::TelegramMessenger;
pub use teloxide_api::TeloxideApi;
