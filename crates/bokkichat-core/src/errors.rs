use std::path::PathBuf;

/// Core error type shared by every backend.
///
/// Adapter crates map their library errors into this type so the connection
/// code can tell tolerated faults (`Unauthorized`, `TimedOut`, `Rejected`,
/// `InvalidMessageData`) apart from failures that must reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid settings file: {path}: {reason}")]
    InvalidSettingsFile { path: PathBuf, reason: String },

    /// An update payload matched neither text nor any known media key.
    #[error("invalid message data: {0}")]
    InvalidMessageData(String),

    /// The backend refused the request because the session lost permission
    /// (for example the bot was blocked by the peer).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("timed out: {0}")]
    TimedOut(String),

    /// The backend refused to deliver a message (unknown recipient, malformed request).
    #[error("message rejected: {0}")]
    Rejected(String),

    #[error("disconnected: {0}")]
    Disconnected(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Faults that `receive` swallows instead of surfacing.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Unauthorized(_) | Error::TimedOut(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_auth_and_timeout_are_transient() {
        assert!(Error::Unauthorized("blocked".into()).is_transient());
        assert!(Error::TimedOut("poll".into()).is_transient());
        assert!(!Error::Rejected("bad chat".into()).is_transient());
        assert!(!Error::External("boom".into()).is_transient());
        assert!(!Error::InvalidMessageData("{}".into()).is_transient());
    }
}
