use std::time::Duration;

use tracing::{debug, error, info, warn};

use bokkichat_core::{
    errors::Error, staging, Address, Connection, ConnectionOptions, Message, Result,
    TelegramBotSettings,
};

use crate::{normalize::normalize, BotApi, TeloxideBotApi};

/// Bot API connection that long-polls `getUpdates`.
///
/// Keeps a resume cursor (`update_id`): the offset of the next update that
/// has not been handed out yet.
pub struct TelegramBotConnection<A: BotApi = TeloxideBotApi> {
    settings: TelegramBotSettings,
    options: ConnectionOptions,
    api: A,
    address: Address,
    update_id: i64,
    closed: bool,
}

impl TelegramBotConnection {
    pub fn new(settings: TelegramBotSettings) -> Result<Self> {
        Self::with_options(settings, ConnectionOptions::default())
    }

    pub fn with_options(settings: TelegramBotSettings, options: ConnectionOptions) -> Result<Self> {
        let api = TeloxideBotApi::new(&settings.api_key)?;
        Self::with_api(settings, options, api)
    }
}

impl<A: BotApi> TelegramBotConnection<A> {
    /// Resolve the bot identity and seed the cursor with the head of the
    /// pending queue (0 when nothing is pending).
    pub fn with_api(settings: TelegramBotSettings, options: ConnectionOptions, api: A) -> Result<Self> {
        let address = Address::new(api.identity()?);
        let update_id = api
            .get_updates(None, None)?
            .first()
            .map(|u| u.update_id)
            .unwrap_or(0);
        debug!("bot {address} starts at update {update_id}");

        Ok(Self {
            settings,
            options,
            api,
            address,
            update_id,
            closed: false,
        })
    }

    /// Offset the next poll will ask for.
    pub fn update_id(&self) -> i64 {
        self.update_id
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Disconnected(format!("bot {} is closed", self.address)));
        }
        Ok(())
    }
}

impl<A: BotApi> Connection for TelegramBotConnection<A> {
    type Settings = TelegramBotSettings;

    fn settings(&self) -> &TelegramBotSettings {
        &self.settings
    }

    fn address(&self) -> Address {
        self.address.clone()
    }

    fn send(&mut self, message: &Message) -> Result<()> {
        self.ensure_open()?;
        info!("sending message to {}", message.receiver());

        let result = match message {
            Message::Text(m) => self.api.send_text(&m.receiver, &m.body),
            Message::Media(m) => {
                let staged = staging::stage_media(&self.options.temp_dir, &m.data)?;
                self.api
                    .send_media(&m.receiver, m.media_type, staged.path(), &m.caption)
            }
        };

        match result {
            Err(Error::Rejected(reason)) | Err(Error::Unauthorized(reason)) => {
                warn!("failed to send message to {}: {reason}", message.receiver());
                Ok(())
            }
            other => other,
        }
    }

    fn receive(&mut self) -> Result<Vec<Message>> {
        self.ensure_open()?;

        let updates = match self
            .api
            .get_updates(Some(self.update_id), Some(self.options.poll_timeout))
        {
            Ok(updates) => updates,
            Err(Error::Unauthorized(reason)) => {
                // A peer that blocked the bot can wedge this offset forever; step over it.
                warn!("poll at offset {} unauthorized: {reason}", self.update_id);
                self.update_id += 1;
                return Ok(Vec::new());
            }
            Err(Error::TimedOut(reason)) => {
                debug!("poll at offset {} timed out: {reason}", self.update_id);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        // Committed only once the whole batch is through, so a failing
        // update leaves the earlier ones to be fetched again.
        let mut cursor = self.update_id;
        let mut messages = Vec::with_capacity(updates.len());
        for update in updates {
            cursor = cursor.max(update.update_id + 1);

            let Some(payload) = update.message else {
                debug!("update {} carries no message, skipping", update.update_id);
                continue;
            };

            match normalize(&self.api, &payload, &self.address) {
                Ok(message) => {
                    info!("received message from {}", message.sender());
                    debug!("{message}");
                    messages.push(message);
                }
                Err(Error::InvalidMessageData(reason)) => {
                    error!("skipping update {}: {reason}", update.update_id);
                }
                Err(e) if e.is_transient() || matches!(e, Error::Rejected(_)) => {
                    warn!("skipping update {}: {e}", update.update_id);
                }
                Err(e) => return Err(e),
            }
        }

        self.update_id = cursor;
        Ok(messages)
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(self.options.poll_interval)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
