use std::path::Path;

use bokkichat_core::{MediaType, Result};

/// A conversation visible to the logged-in account, with its history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dialog {
    /// Display name of the peer (user, group or channel title).
    pub name: String,
    pub messages: Vec<DialogMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogMessage {
    /// Authored by the logged-in account.
    pub outgoing: bool,
    pub text: String,
}

/// The slice of the MTProto client API a user-session connection needs.
///
/// Calls block until the remote side has answered. A target that cannot be
/// resolved or that refuses the message is reported as `Error::Rejected`.
pub trait UserApi {
    /// Username of the logged-in account (numeric id when it has none).
    fn own_address(&self) -> Result<String>;

    fn dialogs(&self) -> Result<Vec<Dialog>>;

    fn send_text(&self, target: &str, text: &str) -> Result<()>;

    fn send_file(&self, target: &str, kind: MediaType, file: &Path, caption: &str) -> Result<()>;

    /// Persist the session and drop the network connection.
    fn disconnect(&mut self) -> Result<()>;
}
