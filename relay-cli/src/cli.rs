//! CLI parser.

use clap::{Parser, Subcommand};
use storage::Value;

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Event relay CLI: check, send-text, forward, member, query", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Overrides BOT_TOKEN.
    #[arg(short, long, global = true)]
    pub token: Option<String>,

    /// Deadline for the whole command, in seconds.
    #[arg(long, global = true, default_value = "30")]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the store pool, run a check statement and verify the bot token.
    Check {
        /// Statement run against the store.
        #[arg(long, default_value = "SELECT 1")]
        statement: String,
    },
    /// Send a text message.
    SendText {
        #[arg(long, allow_hyphen_values = true)]
        chat: i64,
        #[arg(long)]
        text: String,
    },
    /// Forward a message, optionally preceded by a caption.
    Forward {
        #[arg(long, allow_hyphen_values = true)]
        to: i64,
        #[arg(long, allow_hyphen_values = true)]
        from: i64,
        #[arg(long)]
        message: i32,
        /// Caption sent before the forward.
        #[arg(long)]
        text: Option<String>,
    },
    /// Check whether a user is currently in a chat.
    Member {
        #[arg(long)]
        user: u64,
        #[arg(long, allow_hyphen_values = true)]
        chat: i64,
    },
    /// Run a statement and print the rows as JSON lines.
    Query {
        #[arg(short, long)]
        statement: String,
        /// `name=value`; repeatable.
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
        /// Run as exec and print the affected-row count instead.
        #[arg(long)]
        exec: bool,
    },
}

/// Parses `name=value`. The value is read as null, a boolean, an integer or a float when it
/// looks like one, otherwise as text.
pub fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    let name = name.trim().trim_start_matches('$');
    if name.is_empty() {
        return Err(format!("missing parameter name in '{}'", raw));
    }
    let value = if value == "null" {
        Value::Null
    } else if let Ok(b) = value.parse::<bool>() {
        Value::Bool(b)
    } else if let Ok(i) = value.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(f) = value.parse::<f64>() {
        Value::Float(f)
    } else {
        Value::Text(value.to_string())
    };
    Ok((name.to_string(), value))
}
