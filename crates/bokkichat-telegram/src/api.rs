use std::{path::Path, time::Duration};

use serde::Deserialize;

use bokkichat_core::{Address, MediaType, Result};

/// One entry of a `getUpdates` answer, with the message left as raw JSON.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

/// The slice of the Telegram Bot API a bot connection needs.
///
/// Implementations block until the remote call has finished and report
/// failures through the core error variants:
/// `Unauthorized` when the bot lost permission, `TimedOut` when a request
/// ran out of time, `Rejected` when Telegram refused to deliver a message,
/// and `External` for everything else.
pub trait BotApi {
    /// `@username` of the bot.
    fn identity(&self) -> Result<String>;

    /// Pending updates starting at `offset`, waiting at most `timeout`
    /// for one to arrive. `None` for both means "whatever is pending now".
    fn get_updates(&self, offset: Option<i64>, timeout: Option<Duration>)
        -> Result<Vec<RawUpdate>>;

    fn send_text(&self, chat: &Address, text: &str) -> Result<()>;

    /// Upload the file at `file` as photo, audio or video.
    fn send_media(&self, chat: &Address, kind: MediaType, file: &Path, caption: &str)
        -> Result<()>;

    /// Downloadable URL of a file reference.
    fn file_url(&self, file_id: &str) -> Result<String>;

    fn download(&self, url: &str) -> Result<Vec<u8>>;
}
