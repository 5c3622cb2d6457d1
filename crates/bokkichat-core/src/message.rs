use std::fmt;

use crate::Address;

/// Kind of binary attachment carried by a [`MediaMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaType {
    Image,
    Video,
    Audio,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Image => write!(f, "IMAGE"),
            MediaType::Video => write!(f, "VIDEO"),
            MediaType::Audio => write!(f, "AUDIO"),
        }
    }
}

/// Normalized message exchanged between two addresses.
///
/// The set of variants is closed; backends match on it exhaustively when
/// sending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Text(TextMessage),
    Media(MediaMessage),
}

impl Message {
    pub fn sender(&self) -> &Address {
        match self {
            Message::Text(m) => &m.sender,
            Message::Media(m) => &m.sender,
        }
    }

    pub fn receiver(&self) -> &Address {
        match self {
            Message::Text(m) => &m.receiver,
            Message::Media(m) => &m.receiver,
        }
    }

    pub fn as_text(&self) -> Option<&TextMessage> {
        match self {
            Message::Text(m) => Some(m),
            Message::Media(_) => None,
        }
    }

    pub fn as_media(&self) -> Option<&MediaMessage> {
        match self {
            Message::Media(m) => Some(m),
            Message::Text(_) => None,
        }
    }
}

/// Plain text message. Services without a title concept leave `title` empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMessage {
    pub sender: Address,
    pub receiver: Address,
    pub body: String,
    pub title: String,
}

impl TextMessage {
    pub fn new(sender: Address, receiver: Address, body: impl Into<String>) -> Self {
        Self {
            sender,
            receiver,
            body: body.into(),
            title: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Binary attachment (image, video or audio) with an optional caption.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaMessage {
    pub sender: Address,
    pub receiver: Address,
    pub media_type: MediaType,
    pub data: Vec<u8>,
    pub caption: String,
}

impl MediaMessage {
    pub fn new(sender: Address, receiver: Address, media_type: MediaType, data: Vec<u8>) -> Self {
        Self {
            sender,
            receiver,
            media_type,
            data,
            caption: String::new(),
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }
}

// Media payloads can be megabytes; keep debug output readable.
impl fmt::Debug for MediaMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaMessage")
            .field("sender", &self.sender)
            .field("receiver", &self.receiver)
            .field("media_type", &self.media_type)
            .field("data_len", &self.data.len())
            .field("caption", &self.caption)
            .finish()
    }
}

impl From<TextMessage> for Message {
    fn from(m: TextMessage) -> Self {
        Message::Text(m)
    }
}

impl From<MediaMessage> for Message {
    fn from(m: MediaMessage) -> Self {
        Message::Media(m)
    }
}

impl fmt::Display for TextMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.sender, self.receiver)?;
        if !self.title.is_empty() {
            write!(f, " [{}]", self.title)?;
        }
        write!(f, "\n{}", self.body)
    }
}

impl fmt::Display for MediaMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}\n<{}, {} bytes>",
            self.sender,
            self.receiver,
            self.media_type,
            self.data.len()
        )?;
        if !self.caption.is_empty() {
            write!(f, "\n{}", self.caption)?;
        }
        Ok(())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Text(m) => m.fmt(f),
            Message::Media(m) => m.fmt(f),
        }
    }
}
