//! relay CLI. Config from env (and `.env`); see `relay --help`.

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use relay_cli::commands;
use relay_cli::{Cli, Commands, RelayConfig};
use relay_core::{init_tracing, RelayContext};
use relay_telegram::TelegramMessenger;
use storage::{Query, StoreClient};
use tracing::info_span;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = RelayConfig::load(cli.token.clone())?;
    config.validate()?;
    init_tracing(config.log_file.as_deref())?;

    let root = RelayContext::new(info_span!(
        "relay",
        service = %config.service_name,
        server_id = %config.server_id
    ));
    let ctx = root.with_timeout(Duration::from_secs(cli.timeout_secs));
    {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ctx.cancel();
            }
        });
    }

    let mut out = io::stdout().lock();
    match cli.command {
        Commands::Check { statement } => commands::check(&config, &ctx, &statement, &mut out).await,
        Commands::SendText { chat, text } => {
            let messenger = connect_messenger(&config, &ctx).await?;
            let message = commands::text_message(chat, text);
            commands::deliver(&messenger, &ctx, &message, &mut out).await
        }
        Commands::Forward {
            to,
            from,
            message,
            text,
        } => {
            let messenger = connect_messenger(&config, &ctx).await?;
            let message = commands::forward_message(to, from, message, text);
            commands::deliver(&messenger, &ctx, &message, &mut out).await
        }
        Commands::Member { user, chat } => {
            let messenger = connect_messenger(&config, &ctx).await?;
            commands::member(&messenger, &ctx, user, chat, &mut out).await
        }
        Commands::Query {
            statement,
            params,
            exec,
        } => {
            let client = StoreClient::connect(&config.store, &ctx)
                .await
                .context("store unreachable")?;
            let query = params
                .into_iter()
                .fold(Query::new(statement), |q, (name, value)| q.param(name, value));
            let result = commands::query(&client, &ctx, &query, exec, &mut out).await;
            client.shutdown(&ctx).await;
            result
        }
    }
}

async fn connect_messenger(config: &RelayConfig, ctx: &RelayContext) -> Result<TelegramMessenger> {
    let settings = config.telegram()?;
    TelegramMessenger::connect(settings, ctx)
        .await
        .context("telegram unavailable")
}
