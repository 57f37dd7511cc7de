//! Telegram access settings.
//! Loaded from BOT_TOKEN, TELEGRAM_API_URL (or TELOXIDE_API_URL) and TELEGRAM_HTTP_TIMEOUT_SECS.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use relay_core::mask_secret;

#[derive(Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    /// Bot API base URL override, e.g. a local Bot API server or a test double.
    pub api_url: Option<String>,
    /// Bound on each HTTP request to the Bot API.
    pub http_timeout_secs: u64,
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &mask_secret(&self.bot_token))
            .field("api_url", &self.api_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl TelegramSettings {
    pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

    /// BOT_TOKEN is required; the rest are optional.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Like [`from_env`](Self::from_env), with `token` overriding BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?,
        };
        let api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok()
            .filter(|s| !s.is_empty());
        let http_timeout_secs = match env::var("TELEGRAM_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid value for TELEGRAM_HTTP_TIMEOUT_SECS: {}", raw))?,
            Err(_) => Self::DEFAULT_HTTP_TIMEOUT_SECS,
        };
        Ok(Self {
            bot_token,
            api_url,
            http_timeout_secs,
        })
    }

    /// Settings with the given token and defaults for everything else.
    pub fn with_token(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_url: None,
            http_timeout_secs: Self::DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            bail!("BOT_TOKEN must not be empty");
        }
        if self.http_timeout_secs == 0 {
            bail!("TELEGRAM_HTTP_TIMEOUT_SECS must be greater than zero");
        }
        if let Some(url) = &self.api_url {
            reqwest::Url::parse(url).with_context(|| format!("invalid TELEGRAM_API_URL: {}", url))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for v in [
            "BOT_TOKEN",
            "TELEGRAM_API_URL",
            "TELOXIDE_API_URL",
            "TELEGRAM_HTTP_TIMEOUT_SECS",
        ] {
            env::remove_var(v);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_requires_token() {
        clear_env();
        assert!(TelegramSettings::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults_and_fallback_url() {
        clear_env();
        env::set_var("BOT_TOKEN", "123456:ABCDEF");
        env::set_var("TELOXIDE_API_URL", "http://localhost:8081");

        let s = TelegramSettings::from_env().unwrap();
        assert_eq!(s.bot_token, "123456:ABCDEF");
        assert_eq!(s.api_url.as_deref(), Some("http://localhost:8081"));
        assert_eq!(s.http_timeout(), Duration::from_secs(10));
        assert!(s.validate().is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_telegram_api_url_wins() {
        clear_env();
        env::set_var("BOT_TOKEN", "t");
        env::set_var("TELEGRAM_API_URL", "http://primary");
        env::set_var("TELOXIDE_API_URL", "http://fallback");
        env::set_var("TELEGRAM_HTTP_TIMEOUT_SECS", "3");

        let s = TelegramSettings::from_env().unwrap();
        assert_eq!(s.api_url.as_deref(), Some("http://primary"));
        assert_eq!(s.http_timeout_secs, 3);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_token_overrides_env() {
        clear_env();
        env::set_var("BOT_TOKEN", "from_env");
        let s = TelegramSettings::load(Some("from_cli".to_string())).unwrap();
        assert_eq!(s.bot_token, "from_cli");
        clear_env();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut s = TelegramSettings::with_token("token");
        s.api_url = Some("not a url".to_string());
        assert!(s.validate().is_err());

        let mut s = TelegramSettings::with_token("token");
        s.http_timeout_secs = 0;
        assert!(s.validate().is_err());

        assert!(TelegramSettings::with_token("  ").validate().is_err());
    }

    #[test]
    fn test_debug_masks_token() {
        let s = TelegramSettings::with_token("123456789:AAH-secret-part");
        let shown = format!("{:?}", s);
        assert!(!shown.contains("secret-part"));
    }
}
