use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    errors::Error,
    settings::{Settings, TelegramBotSettings, TelegramUserSettings, DEFAULT_SESSION_NAME},
    staging, ConnectionOptions, Result,
};

/// Which backend a process should talk through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Cli,
    TelegramUser,
    TelegramBot,
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "cli" => Ok(Backend::Cli),
            "telegram" | "telegram-user" | "telegram_user" => Ok(Backend::TelegramUser),
            "telegram-bot" | "telegram_bot" => Ok(Backend::TelegramBot),
            other => Err(Error::Config(format!("unknown backend `{other}`"))),
        }
    }
}

/// Typed configuration, read from the environment (and `.env` when present).
#[derive(Clone, Debug)]
pub struct Config {
    pub backend: Backend,
    pub settings_file: Option<PathBuf>,

    // Telegram user session
    pub telegram_api_id: Option<i32>,
    pub telegram_api_hash: Option<String>,
    pub telegram_session_name: String,
    pub telegram_phone: Option<String>,

    // Telegram bot
    pub telegram_bot_api_key: Option<String>,

    // Polling
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
    pub temp_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Existing process variables win over the file.
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    /// Build from the current process environment only.
    pub fn from_env() -> Result<Self> {
        let backend = env_str("BOKKICHAT_BACKEND")
            .map(|s| s.parse::<Backend>())
            .transpose()?
            .unwrap_or(Backend::Cli);

        let telegram_api_id = match env_str("TELEGRAM_API_ID").and_then(non_empty) {
            Some(raw) => Some(raw.trim().parse::<i32>().map_err(|_| {
                Error::Config(format!("TELEGRAM_API_ID must be an integer, got `{raw}`"))
            })?),
            None => None,
        };

        Ok(Self {
            backend,
            settings_file: env_path("BOKKICHAT_SETTINGS_FILE"),
            telegram_api_id,
            telegram_api_hash: env_str("TELEGRAM_API_HASH").and_then(non_empty),
            telegram_session_name: env_str("TELEGRAM_SESSION_NAME")
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string()),
            telegram_phone: env_str("TELEGRAM_PHONE").and_then(non_empty),
            telegram_bot_api_key: env_str("TELEGRAM_BOT_API_KEY").and_then(non_empty),
            poll_timeout: Duration::from_secs(env_u64("BOKKICHAT_POLL_TIMEOUT_SECS").unwrap_or(10)),
            poll_interval: Duration::from_millis(
                env_u64("BOKKICHAT_POLL_INTERVAL_MS").unwrap_or(1000),
            ),
            temp_dir: env_path("BOKKICHAT_TEMP_DIR").unwrap_or_else(staging::default_temp_dir),
        })
    }

    /// User-session settings: from the settings file when configured,
    /// otherwise from the credential variables.
    pub fn user_settings(&self) -> Result<TelegramUserSettings> {
        if let Some(Settings::TelegramUser(s)) = self.stored_settings()? {
            return Ok(s);
        }

        let api_id = self.telegram_api_id.ok_or_else(|| {
            Error::Config("TELEGRAM_API_ID environment variable is required".to_string())
        })?;
        let api_hash = self.telegram_api_hash.clone().ok_or_else(|| {
            Error::Config("TELEGRAM_API_HASH environment variable is required".to_string())
        })?;

        Ok(TelegramUserSettings::new(api_id, api_hash)
            .with_session_name(self.telegram_session_name.clone()))
    }

    /// Bot settings: from the settings file when configured, otherwise from
    /// `TELEGRAM_BOT_API_KEY`.
    pub fn bot_settings(&self) -> Result<TelegramBotSettings> {
        if let Some(Settings::TelegramBot(s)) = self.stored_settings()? {
            return Ok(s);
        }

        let api_key = self.telegram_bot_api_key.clone().ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_API_KEY environment variable is required".to_string())
        })?;
        Ok(TelegramBotSettings::new(api_key))
    }

    fn stored_settings(&self) -> Result<Option<Settings>> {
        match &self.settings_file {
            Some(path) if path.exists() => Settings::load(path).map(Some),
            _ => Ok(None),
        }
    }
}

impl From<&Config> for ConnectionOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            poll_timeout: cfg.poll_timeout,
            poll_interval: cfg.poll_interval,
            temp_dir: cfg.temp_dir.clone(),
        }
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
