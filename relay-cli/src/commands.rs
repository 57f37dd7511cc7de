//! Subcommand handlers. Output goes to the given writer so handlers can be tested.

use std::io::Write;

use anyhow::{Context, Result};
use relay_core::{
    ChatId, Membership, MessageId, MessageRef, Messenger, OutgoingMessage, RelayContext, UserId,
};
use relay_telegram::TelegramMessenger;
use storage::{Query, Row, StoreClient};

use crate::config::RelayConfig;

/// Opens the pool, runs `statement`, reports pool status, then verifies the bot token if one
/// is configured.
pub async fn check(
    config: &RelayConfig,
    ctx: &RelayContext,
    statement: &str,
    out: &mut impl Write,
) -> Result<()> {
    let client = StoreClient::connect(&config.store, ctx)
        .await
        .context("store unreachable")?;
    let checked = client.query(ctx, &Query::new(statement)).await;
    let status = client.status();
    client.shutdown(ctx).await;
    let rows = checked.context("check statement failed")?;
    writeln!(
        out,
        "store ok: {} (rows: {}, pool size: {}, idle: {})",
        client.pool().endpoint(),
        rows.len(),
        status.size,
        status.idle
    )?;

    match &config.telegram {
        Some(settings) => {
            TelegramMessenger::connect(settings, ctx)
                .await
                .context("telegram check failed")?;
            writeln!(out, "telegram ok")?;
        }
        None => writeln!(out, "telegram skipped: BOT_TOKEN not set")?,
    }
    Ok(())
}

/// Sends one outgoing message through the Telegram gateway.
pub async fn deliver(
    messenger: &dyn Messenger,
    ctx: &RelayContext,
    message: &OutgoingMessage,
    out: &mut impl Write,
) -> Result<()> {
    messenger.deliver(ctx, message).await?;
    writeln!(out, "delivered to chat {}", message.target())?;
    Ok(())
}

pub fn text_message(chat: i64, text: String) -> OutgoingMessage {
    OutgoingMessage::Text {
        to: ChatId(chat),
        text,
    }
}

pub fn forward_message(to: i64, from: i64, message: i32, text: Option<String>) -> OutgoingMessage {
    let source = MessageRef::new(ChatId(from), MessageId(message));
    match text {
        Some(text) => OutgoingMessage::ForwardWithText {
            to: ChatId(to),
            source,
            text,
        },
        None => OutgoingMessage::Forward {
            to: ChatId(to),
            source,
        },
    }
}

/// Prints `member` or `not-member`. A failed lookup is an error, not a third answer.
pub async fn member(
    messenger: &dyn Messenger,
    ctx: &RelayContext,
    user: u64,
    chat: i64,
    out: &mut impl Write,
) -> Result<()> {
    let membership = messenger
        .is_user_in_chat(ctx, UserId(user), ChatId(chat))
        .await?;
    let answer = match membership {
        Membership::Member => "member",
        Membership::NotMember => "not-member",
    };
    writeln!(out, "{}", answer)?;
    Ok(())
}

/// Runs `query` and prints one JSON object per row, or the affected-row count for `exec`.
pub async fn query(
    client: &StoreClient,
    ctx: &RelayContext,
    query: &Query,
    exec: bool,
    out: &mut impl Write,
) -> Result<()> {
    if exec {
        let affected = client.exec(ctx, query).await?;
        writeln!(out, "{}", serde_json::json!({ "affected": affected }))?;
        return Ok(());
    }
    for row in client.query(ctx, query).await? {
        writeln!(out, "{}", row_json(&row)?)?;
    }
    Ok(())
}

fn row_json(row: &Row) -> Result<serde_json::Value> {
    let mut object = serde_json::Map::with_capacity(row.len());
    for (column, value) in row.columns().iter().zip(row.values()) {
        object.insert(column.clone(), serde_json::to_value(value)?);
    }
    Ok(serde_json::Value::Object(object))
}
