//! Core model and connection contract for bokkichat.
//!
//! This crate is intentionally transport-agnostic. Telegram (bot API and
//! user sessions) live behind the `Connection` trait in adapter crates; the
//! only backend shipped here is the local CLI stand-in.

pub mod address;
pub mod cli;
pub mod config;
pub mod connection;
pub mod errors;
pub mod logging;
pub mod message;
pub mod settings;
pub mod staging;

pub use address::Address;
pub use connection::{Connection, ConnectionOptions};
pub use errors::{Error, Result};
pub use message::{MediaMessage, MediaType, Message, TextMessage};
pub use settings::{CliSettings, Settings, TelegramBotSettings, TelegramUserSettings};
