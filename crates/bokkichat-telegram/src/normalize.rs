//! Raw Bot API message JSON -> normalized [`Message`].
//!
//! Text wins over media. Media keys are scanned in a fixed order and the
//! first usable one is taken; a list value holds resolution variants ordered
//! smallest to largest, so the last entry is the one downloaded.

use serde_json::Value;
use tracing::debug;

use bokkichat_core::{
    errors::Error, Address, MediaMessage, MediaType, Message, Result, TextMessage,
};

use crate::BotApi;

/// Scan order of attachment keys and the media kind each maps to.
pub const MEDIA_KEYS: [(&str, MediaType); 4] = [
    ("photo", MediaType::Image),
    ("audio", MediaType::Audio),
    ("video", MediaType::Video),
    ("voice", MediaType::Audio),
];

/// What a payload carries, before any file is fetched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classified {
    Text {
        sender: Address,
        body: String,
    },
    Media {
        sender: Address,
        media_type: MediaType,
        file_id: String,
        caption: String,
    },
}

pub fn classify(payload: &Value) -> Result<Classified> {
    let sender = chat_address(payload)?;

    match payload.get("text") {
        None | Some(Value::Null) => {}
        Some(Value::String(body)) => {
            return Ok(Classified::Text {
                sender,
                body: body.clone(),
            })
        }
        Some(other) => {
            return Ok(Classified::Text {
                sender,
                body: other.to_string(),
            })
        }
    }

    for (key, media_type) in MEDIA_KEYS {
        let Some(value) = payload.get(key) else {
            continue;
        };
        let Some(file_id) = file_reference(value) else {
            continue;
        };
        debug!("media type: {key}");

        return Ok(Classified::Media {
            sender,
            media_type,
            file_id: file_id.to_string(),
            caption: payload
                .get("caption")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }

    Err(Error::InvalidMessageData(format!(
        "no text or supported media in {payload}"
    )))
}

/// Classify `payload` and, for media, download the referenced file.
pub fn normalize<A>(api: &A, payload: &Value, receiver: &Address) -> Result<Message>
where
    A: BotApi + ?Sized,
{
    match classify(payload)? {
        Classified::Text { sender, body } => {
            debug!("message body: {body}");
            Ok(TextMessage::new(sender, receiver.clone(), body).into())
        }
        Classified::Media {
            sender,
            media_type,
            file_id,
            caption,
        } => {
            let url = api.file_url(&file_id)?;
            let data = api.download(&url)?;
            Ok(MediaMessage::new(sender, receiver.clone(), media_type, data)
                .with_caption(caption)
                .into())
        }
    }
}

fn chat_address(payload: &Value) -> Result<Address> {
    match payload.get("chat").and_then(|c| c.get("id")) {
        Some(Value::Number(id)) => Ok(Address::new(id.to_string())),
        Some(Value::String(id)) => Ok(Address::new(id.clone())),
        _ => Err(Error::InvalidMessageData(format!(
            "message without chat id: {payload}"
        ))),
    }
}

/// `file_id` of an attachment value; lists resolve to their last entry.
/// Empty values and other shapes count as absent.
fn file_reference(value: &Value) -> Option<&str> {
    match value {
        Value::Array(variants) => variants.last()?.get("file_id")?.as_str(),
        Value::Object(map) if !map.is_empty() => map.get("file_id")?.as_str(),
        _ => None,
    }
}
