//! Telegram Bot API backend.
//!
//! `TelegramBotConnection` implements the `bokkichat-core` Connection over
//! any [`BotApi`]; [`TeloxideBotApi`] is the production implementation
//! (teloxide for requests, raw `getUpdates` JSON for polling).

pub mod api;
pub mod connection;
pub mod normalize;
pub mod teloxide_api;

#[cfg(test)]
pub(crate) mod fake;

pub use api::{BotApi, RawUpdate};
pub use connection::TelegramBotConnection;
pub use teloxide_api::TeloxideBotApi;
