//! Telegram user-session backend (MTProto via grammers).
//!
//! `TelegramUserConnection` implements the `bokkichat-core` Connection over
//! any [`UserApi`]; [`GrammersUserApi`] is the production implementation,
//! persisting its authorization in `<session_name>.session`.

pub mod api;
pub mod connection;
pub mod grammers_api;

#[cfg(test)]
pub(crate) mod fake;

pub use api::{Dialog, DialogMessage, UserApi};
pub use connection::TelegramUserConnection;
pub use grammers_api::GrammersUserApi;
