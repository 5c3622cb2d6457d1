//! Backend credential bundles and their flat string form.
//!
//! Every settings value serializes to a flat JSON object holding exactly its
//! backend's keys, so it can be written to disk between runs and read back
//! field-for-field.

use std::{fs, path::Path};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{errors::Error, Result};

pub const DEFAULT_SESSION_NAME: &str = "bokkichat";

fn default_session_name() -> String {
    DEFAULT_SESSION_NAME.to_string()
}

// Older settings files stored the id as a string.
fn api_id_from_int_or_string<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawApiId {
        Int(i32),
        Text(String),
    }

    match RawApiId::deserialize(deserializer)? {
        RawApiId::Int(id) => Ok(id),
        RawApiId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("api_id `{text}` is not an integer"))),
    }
}

/// Credentials of a Telegram user account (MTProto session).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUserSettings {
    #[serde(deserialize_with = "api_id_from_int_or_string")]
    pub api_id: i32,
    pub api_hash: String,
    #[serde(default = "default_session_name")]
    pub session_name: String,
}

impl TelegramUserSettings {
    pub fn new(api_id: i32, api_hash: impl Into<String>) -> Self {
        Self {
            api_id,
            api_hash: api_hash.into(),
            session_name: default_session_name(),
        }
    }

    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = session_name.into();
        self
    }

    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn deserialize(serialized: &str) -> Result<Self> {
        Ok(serde_json::from_str(serialized)?)
    }
}

/// Credentials of a Telegram bot (Bot API token).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramBotSettings {
    pub api_key: String,
}

impl TelegramBotSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn deserialize(serialized: &str) -> Result<Self> {
        Ok(serde_json::from_str(serialized)?)
    }
}

// The token is a credential; never print it.
impl std::fmt::Debug for TelegramBotSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBotSettings")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// The CLI backend needs no credentials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliSettings {}

impl CliSettings {
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn deserialize(serialized: &str) -> Result<Self> {
        Ok(serde_json::from_str(serialized)?)
    }
}

/// Closed set of remote backend settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Settings {
    TelegramUser(TelegramUserSettings),
    TelegramBot(TelegramBotSettings),
}

impl Settings {
    pub fn serialize(&self) -> Result<String> {
        match self {
            Settings::TelegramUser(s) => s.serialize(),
            Settings::TelegramBot(s) => s.serialize(),
        }
    }

    /// Picks the variant from the key set present in the serialized object.
    pub fn deserialize(serialized: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(serialized)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::Config(
                "serialized settings must be a JSON object".to_string(),
            ));
        };

        if obj.contains_key("api_key") {
            return Ok(Settings::TelegramBot(serde_json::from_value(value)?));
        }
        if obj.contains_key("api_id") {
            return Ok(Settings::TelegramUser(serde_json::from_value(value)?));
        }

        Err(Error::Config(
            "serialized settings carry neither `api_key` nor `api_id`".to_string(),
        ))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::deserialize(contents.trim()).map_err(|e| Error::InvalidSettingsFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.serialize()?)?;
        Ok(())
    }
}

impl From<TelegramUserSettings> for Settings {
    fn from(s: TelegramUserSettings) -> Self {
        Settings::TelegramUser(s)
    }
}

impl From<TelegramBotSettings> for Settings {
    fn from(s: TelegramBotSettings) -> Self {
        Settings::TelegramBot(s)
    }
}
