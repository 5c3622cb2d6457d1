use std::time::Duration;

use tracing::{debug, info, warn};

use bokkichat_core::{
    errors::Error, staging, Address, Connection, ConnectionOptions, Message, Result,
    TelegramUserSettings, TextMessage,
};

use crate::{GrammersUserApi, UserApi};

/// Connection acting as a logged-in Telegram user.
///
/// Every `receive` walks the full history of every dialog, so messages that
/// were already returned show up again on the next call.
pub struct TelegramUserConnection<A: UserApi = GrammersUserApi> {
    settings: TelegramUserSettings,
    options: ConnectionOptions,
    api: A,
    address: Address,
    closed: bool,
}

impl TelegramUserConnection {
    /// Connect with the session named in `settings`, logging in on the
    /// terminal if that session is not authorised yet.
    pub fn new(settings: TelegramUserSettings) -> Result<Self> {
        Self::with_options(settings, ConnectionOptions::default())
    }

    pub fn with_options(settings: TelegramUserSettings, options: ConnectionOptions) -> Result<Self> {
        let api = GrammersUserApi::connect(&settings, None)?;
        Self::with_api(settings, options, api)
    }
}

impl<A: UserApi> TelegramUserConnection<A> {
    pub fn with_api(settings: TelegramUserSettings, options: ConnectionOptions, api: A) -> Result<Self> {
        let address = Address::new(api.own_address()?);
        debug!("logged in as {address}");

        Ok(Self {
            settings,
            options,
            api,
            address,
            closed: false,
        })
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Disconnected(format!(
                "user session {} is closed",
                self.address
            )));
        }
        Ok(())
    }
}

impl<A: UserApi> Connection for TelegramUserConnection<A> {
    type Settings = TelegramUserSettings;

    fn settings(&self) -> &TelegramUserSettings {
        &self.settings
    }

    fn address(&self) -> Address {
        self.address.clone()
    }

    fn send(&mut self, message: &Message) -> Result<()> {
        self.ensure_open()?;
        let target = message.receiver().as_str();
        info!("sending message to {target}");

        let result = match message {
            Message::Text(m) => self.api.send_text(target, &m.body),
            Message::Media(m) => {
                let staged = staging::stage_media(&self.options.temp_dir, &m.data)?;
                self.api
                    .send_file(target, m.media_type, staged.path(), &m.caption)
            }
        };

        match result {
            Err(Error::Rejected(reason)) | Err(Error::Unauthorized(reason)) => {
                warn!("failed to send message to {target}: {reason}");
                Ok(())
            }
            other => other,
        }
    }

    fn receive(&mut self) -> Result<Vec<Message>> {
        self.ensure_open()?;

        let dialogs = match self.api.dialogs() {
            Ok(dialogs) => dialogs,
            Err(e) if e.is_transient() => {
                warn!("listing dialogs failed: {e}");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut messages = Vec::new();
        for dialog in dialogs {
            let sender = Address::new(dialog.name);
            for entry in dialog.messages {
                // Own messages and text-less ones (stickers, service events).
                if entry.outgoing || entry.text.is_empty() {
                    continue;
                }
                messages.push(Message::Text(TextMessage::new(
                    sender.clone(),
                    self.address.clone(),
                    entry.text,
                )));
            }
        }

        debug!("collected {} incoming messages", messages.len());
        Ok(messages)
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(self.options.poll_interval)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.api.disconnect()
    }
}
