//! Full relay configuration: base settings plus store and Telegram. Loaded from env.

use std::env;

use anyhow::{Context, Result};
use relay_telegram::TelegramSettings;
use storage::StoreSettings;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// LOG_FILE; logs are also written to stdout.
    pub log_file: Option<String>,
    /// SERVICE_NAME, attached to the root span.
    pub service_name: String,
    /// SERVER_ID, attached to the root span.
    pub server_id: String,
    pub store: StoreSettings,
    /// Present when BOT_TOKEN is set or a token was passed on the command line.
    pub telegram: Option<TelegramSettings>,
}

impl RelayConfig {
    /// Loads from the environment. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let store = StoreSettings::from_env().context("store settings")?;
        let telegram = if token.is_some() || env::var("BOT_TOKEN").is_ok() {
            Some(TelegramSettings::load(token).context("telegram settings")?)
        } else {
            None
        };
        Ok(Self {
            log_file: env::var("LOG_FILE").ok().filter(|s| !s.is_empty()),
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "relay".to_string()),
            server_id: env::var("SERVER_ID").unwrap_or_else(|_| "local".to_string()),
            store,
            telegram,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        if let Some(telegram) = &self.telegram {
            telegram.validate()?;
        }
        Ok(())
    }

    /// Telegram settings, or an error naming what is missing.
    pub fn telegram(&self) -> Result<&TelegramSettings> {
        self.telegram
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("BOT_TOKEN not set (or pass --token)"))
    }
}
