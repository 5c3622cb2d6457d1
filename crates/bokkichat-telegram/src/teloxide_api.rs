use std::{future::IntoFuture, path::Path, time::Duration};

use serde::Deserialize;
use teloxide::{
    prelude::*,
    types::{ChatId, InputFile, Recipient},
    RequestError,
};
use tokio::runtime::Runtime;
use tracing::warn;

use bokkichat_core::{errors::Error, Address, MediaType, Result};

use crate::{BotApi, RawUpdate};

const API_URL: &str = "https://api.telegram.org";

/// Extra time the HTTP client waits beyond the long-poll timeout before
/// giving up on a `getUpdates` request.
const POLL_GRACE: Duration = Duration::from_secs(5);

/// Envelope of every Bot API answer.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// [`BotApi`] over teloxide, with raw JSON polling.
///
/// Owns a current-thread tokio runtime so every call can block; do not use
/// it from inside another tokio runtime.
pub struct TeloxideBotApi {
    runtime: Runtime,
    bot: Bot,
    http: reqwest::Client,
    token: String,
}

impl TeloxideBotApi {
    pub fn new(token: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::External(format!("http client build: {e}")))?;

        Ok(Self {
            runtime,
            bot: Bot::new(token),
            http,
            token: token.to_string(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{API_URL}/bot{}/{method}", self.token)
    }

    // Request errors may echo the URL, which embeds the token.
    fn redact(&self, text: String) -> String {
        text.replace(&self.token, "<token>")
    }

    fn map_http_err(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            return Error::TimedOut(self.redact(e.without_url().to_string()));
        }
        Error::External(self.redact(format!("telegram http error: {}", e.without_url())))
    }

    /// Telegram answering with an API error means it refused this one request
    /// (unknown chat, file over the download limit).
    fn map_refusal(&self, e: RequestError) -> Error {
        match e {
            RequestError::Api(api) => Error::Rejected(api.to_string()),
            other => self.map_err(other),
        }
    }

    fn map_err(&self, e: RequestError) -> Error {
        match e {
            RequestError::Network(net) if net.is_timeout() => {
                Error::TimedOut(self.redact(net.to_string()))
            }
            other => Error::External(self.redact(format!("telegram error: {other}"))),
        }
    }

    /// Run a request, waiting out one flood-control answer before giving up.
    fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: IntoFuture<Output = std::result::Result<T, RequestError>>,
    {
        const MAX_RETRIES: usize = 1;
        self.runtime.block_on(async {
            let mut attempts = 0usize;
            loop {
                match op().await {
                    Ok(v) => return Ok(v),
                    Err(RequestError::RetryAfter(wait)) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        warn!("flood control, retrying in {}s", wait.as_secs());
                        tokio::time::sleep(wait).await;
                    }
                    Err(e) => return Err(self.map_refusal(e)),
                }
            }
        })
    }
}

fn recipient(chat: &Address) -> Recipient {
    let raw = chat.as_str().trim();
    match raw.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if raw.starts_with('@') => Recipient::ChannelUsername(raw.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{raw}")),
    }
}

fn caption_of(caption: &str) -> Option<String> {
    if caption.is_empty() {
        None
    } else {
        Some(caption.to_string())
    }
}

impl BotApi for TeloxideBotApi {
    fn identity(&self) -> Result<String> {
        let me = self
            .runtime
            .block_on(async { self.bot.get_me().await })
            .map_err(|e| self.map_err(e))?;
        Ok(format!("@{}", me.username()))
    }

    fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Option<Duration>,
    ) -> Result<Vec<RawUpdate>> {
        let mut body = serde_json::Map::new();
        if let Some(offset) = offset {
            body.insert("offset".to_string(), offset.into());
        }
        let wait = timeout.unwrap_or_default();
        body.insert("timeout".to_string(), wait.as_secs().into());

        let answer: ApiResponse<Vec<RawUpdate>> = self.runtime.block_on(async {
            let resp = self
                .http
                .post(self.endpoint("getUpdates"))
                .json(&body)
                .timeout(wait + POLL_GRACE)
                .send()
                .await
                .map_err(|e| self.map_http_err(e))?;
            resp.json::<ApiResponse<Vec<RawUpdate>>>()
                .await
                .map_err(|e| self.map_http_err(e))
        })?;

        match answer {
            ApiResponse {
                ok: true,
                result: Some(updates),
                ..
            } => Ok(updates),
            ApiResponse {
                error_code: Some(code @ (401 | 403)),
                description,
                ..
            } => Err(Error::Unauthorized(format!(
                "{code} {}",
                description.unwrap_or_default()
            ))),
            ApiResponse {
                error_code,
                description,
                ..
            } => Err(Error::External(format!(
                "getUpdates failed: {} {}",
                error_code.map(|c| c.to_string()).unwrap_or_default(),
                description.unwrap_or_default()
            ))),
        }
    }

    fn send_text(&self, chat: &Address, text: &str) -> Result<()> {
        let to = recipient(chat);
        self.with_retry(|| self.bot.send_message(to.clone(), text))
            .map(|_| ())
    }

    fn send_media(
        &self,
        chat: &Address,
        kind: MediaType,
        file: &Path,
        caption: &str,
    ) -> Result<()> {
        let to = recipient(chat);
        let input = InputFile::file(file.to_path_buf());
        let caption = caption_of(caption);

        let sent = match kind {
            MediaType::Image => self.with_retry(|| {
                let req = self.bot.send_photo(to.clone(), input.clone());
                match &caption {
                    Some(c) => req.caption(c.clone()),
                    None => req,
                }
            }),
            MediaType::Audio => self.with_retry(|| {
                let req = self.bot.send_audio(to.clone(), input.clone());
                match &caption {
                    Some(c) => req.caption(c.clone()),
                    None => req,
                }
            }),
            MediaType::Video => self.with_retry(|| {
                let req = self.bot.send_video(to.clone(), input.clone());
                match &caption {
                    Some(c) => req.caption(c.clone()),
                    None => req,
                }
            }),
        };

        sent.map(|_| ())
    }

    fn file_url(&self, file_id: &str) -> Result<String> {
        let file = self
            .runtime
            .block_on(async { self.bot.get_file(file_id.to_string()).await })
            .map_err(|e| self.map_refusal(e))?;
        Ok(format!("{API_URL}/file/bot{}/{}", self.token, file.path))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.runtime.block_on(async {
            let resp = self
                .http
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| self.map_http_err(e))?;
            let bytes = resp.bytes().await.map_err(|e| self.map_http_err(e))?;
            Ok::<_, Error>(bytes.to_vec())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_addresses_are_chat_ids() {
        assert!(matches!(recipient(&Address::from("4711")), Recipient::Id(ChatId(4711))));
        assert!(matches!(
            recipient(&Address::from("-1001234")),
            Recipient::Id(ChatId(-1001234))
        ));
    }

    #[test]
    fn other_addresses_are_usernames() {
        match recipient(&Address::from("bokki_bot")) {
            Recipient::ChannelUsername(name) => assert_eq!(name, "@bokki_bot"),
            other => panic!("unexpected: {other:?}"),
        }
        match recipient(&Address::from("@channel")) {
            Recipient::ChannelUsername(name) => assert_eq!(name, "@channel"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_caption_is_omitted() {
        assert_eq!(caption_of(""), None);
        assert_eq!(caption_of("hi"), Some("hi".to_string()));
    }

    #[test]
    fn envelope_parses_success_and_failure() {
        let ok: ApiResponse<Vec<RawUpdate>> = serde_json::from_str(
            r#"{"ok":true,"result":[{"update_id":7,"message":{"chat":{"id":1},"text":"x"}}]}"#,
        )
        .unwrap();
        assert!(ok.ok);
        assert_eq!(ok.result.unwrap()[0].update_id, 7);

        let blocked: ApiResponse<Vec<RawUpdate>> = serde_json::from_str(
            r#"{"ok":false,"error_code":403,"description":"Forbidden: bot was blocked by the user"}"#,
        )
        .unwrap();
        assert!(!blocked.ok);
        assert_eq!(blocked.error_code, Some(403));
        assert!(blocked.result.is_none());
    }

    #[test]
    fn flood_control_is_retried_once() {
        let api = TeloxideBotApi::new("123:SECRET").unwrap();
        let calls = std::cell::Cell::new(0);

        let answer = api.with_retry(|| {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n == 1 {
                    Err(RequestError::RetryAfter(Duration::ZERO))
                } else {
                    Ok(n)
                }
            }
        });
        assert_eq!(answer.unwrap(), 2);

        calls.set(0);
        let answer: Result<()> = api.with_retry(|| {
            calls.set(calls.get() + 1);
            async { Err(RequestError::RetryAfter(Duration::ZERO)) }
        });
        assert!(matches!(answer, Err(Error::External(_))));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn api_refusals_are_rejections() {
        let api = TeloxideBotApi::new("123:SECRET").unwrap();
        let err = api.map_refusal(RequestError::Api(teloxide::ApiError::BotBlocked));
        assert!(matches!(err, Error::Rejected(_)));
    }

    #[test]
    fn token_never_leaks_into_errors() {
        let api = TeloxideBotApi::new("123:SECRET").unwrap();
        assert!(api.endpoint("getUpdates").contains("123:SECRET"));
        let msg = api.redact(format!("failed for {}", api.endpoint("getMe")));
        assert!(!msg.contains("SECRET"));
    }
}
