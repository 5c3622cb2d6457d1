use std::{
    fmt::Display,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use grammers_client::{
    client::auth::InvocationError, types::Chat, Client, Config, InitParams, InputMessage,
    SignInError,
};
use grammers_session::Session;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use bokkichat_core::{errors::Error, MediaType, Result, TelegramUserSettings};

use crate::{Dialog, DialogMessage, UserApi};

/// [`UserApi`] over a grammers MTProto client.
///
/// Owns a current-thread tokio runtime so every call can block; do not use
/// it from inside another tokio runtime.
pub struct GrammersUserApi {
    runtime: Runtime,
    client: Option<Client>,
    session_path: PathBuf,
}

impl GrammersUserApi {
    /// Open (or create) `<session_name>.session` and connect.
    ///
    /// When the session is not authorised the login runs on the terminal:
    /// phone number (unless given), the code Telegram sends, then the 2FA
    /// password if the account has one.
    pub fn connect(settings: &TelegramUserSettings, phone: Option<&str>) -> Result<Self> {
        let session_path = session_path(&settings.session_name);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let client = runtime.block_on(async {
            let session = Session::load_file_or_create(&session_path)?;
            let client = Client::connect(Config {
                session,
                api_id: settings.api_id,
                api_hash: settings.api_hash.clone(),
                params: InitParams::default(),
            })
            .await
            .map_err(|e| Error::External(format!("telegram connect: {e}")))?;

            if !client.is_authorized().await.map_err(map_err)? {
                info!("session {} is not authorised, logging in", session_path.display());
                sign_in(&client, phone).await?;
                client.session().save_to_file(&session_path)?;
            }
            Ok::<_, Error>(client)
        })?;

        Ok(Self {
            runtime,
            client: Some(client),
            session_path,
        })
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| Error::Disconnected("telegram client is closed".to_string()))
    }
}

fn session_path(session_name: &str) -> PathBuf {
    PathBuf::from(format!("{session_name}.session"))
}

fn prompt(question: &str) -> Result<String> {
    let mut out = io::stdout();
    out.write_all(question.as_bytes())?;
    out.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(Error::Config(format!("no answer to `{}`", question.trim())));
    }
    Ok(line.trim().to_string())
}

async fn sign_in(client: &Client, phone: Option<&str>) -> Result<()> {
    let phone = match phone {
        Some(phone) => phone.to_string(),
        None => prompt("Phone number (international format): ")?,
    };
    let token = client
        .request_login_code(&phone)
        .await
        .map_err(|e| Error::Config(format!("login code request failed: {e}")))?;
    let code = prompt("Login code: ")?;

    match client.sign_in(&token, &code).await {
        Ok(_) => Ok(()),
        Err(SignInError::PasswordRequired(password_token)) => {
            let hint = password_token.hint().unwrap_or("none").to_string();
            let password = prompt(&format!("Password (hint: {hint}): "))?;
            client
                .check_password(password_token, password.as_str())
                .await
                .map_err(|e| Error::Config(format!("password rejected: {e}")))?;
            Ok(())
        }
        Err(e) => Err(Error::Config(format!("sign in failed: {e}"))),
    }
}

/// Peer names may come with or without the leading `@`.
fn username_of(target: &str) -> &str {
    target.trim().trim_start_matches('@')
}

fn classify_rpc(code: i32, name: &str) -> Error {
    match code {
        401 => Error::Unauthorized(name.to_string()),
        400 | 403 => Error::Rejected(name.to_string()),
        _ => Error::External(format!("telegram rpc error {code}: {name}")),
    }
}

fn map_err(e: InvocationError) -> Error {
    match e {
        InvocationError::Rpc(rpc) => classify_rpc(rpc.code, &rpc.name),
        other => external(other),
    }
}

fn external(e: impl Display) -> Error {
    Error::External(format!("telegram error: {e}"))
}

/// Username first, then the display name of an existing dialog.
async fn resolve(client: &Client, target: &str) -> Result<Chat> {
    match client.resolve_username(username_of(target)).await {
        Ok(Some(chat)) => return Ok(chat),
        Ok(None) => {}
        Err(e) => debug!("`{target}` is not a resolvable username: {e}"),
    }

    let mut dialogs = client.iter_dialogs();
    while let Some(dialog) = dialogs.next().await.map_err(map_err)? {
        if dialog.chat().name() == target {
            return Ok(dialog.chat().clone());
        }
    }
    Err(Error::Rejected(format!("cannot resolve `{target}`")))
}

impl UserApi for GrammersUserApi {
    fn own_address(&self) -> Result<String> {
        let client = self.client()?;
        let me = self
            .runtime
            .block_on(async { client.get_me().await })
            .map_err(map_err)?;
        Ok(me
            .username()
            .map(str::to_string)
            .unwrap_or_else(|| me.id().to_string()))
    }

    fn dialogs(&self) -> Result<Vec<Dialog>> {
        let client = self.client()?;
        self.runtime.block_on(async {
            let mut out = Vec::new();
            let mut dialogs = client.iter_dialogs();
            while let Some(dialog) = dialogs.next().await.map_err(map_err)? {
                let chat = dialog.chat();
                let mut messages = Vec::new();
                let mut history = client.iter_messages(chat.pack());
                while let Some(message) = history.next().await.map_err(map_err)? {
                    messages.push(DialogMessage {
                        outgoing: message.outgoing(),
                        text: message.text().to_string(),
                    });
                }
                out.push(Dialog {
                    name: chat.name().to_string(),
                    messages,
                });
            }
            Ok::<_, Error>(out)
        })
    }

    fn send_text(&self, target: &str, text: &str) -> Result<()> {
        let client = self.client()?;
        self.runtime.block_on(async {
            let chat = resolve(client, target).await?;
            client
                .send_message(chat.pack(), InputMessage::text(text))
                .await
                .map_err(map_err)?;
            Ok::<_, Error>(())
        })
    }

    fn send_file(&self, target: &str, kind: MediaType, file: &Path, caption: &str) -> Result<()> {
        let client = self.client()?;
        self.runtime.block_on(async {
            let chat = resolve(client, target).await?;
            let uploaded = client.upload_file(file).await?;
            let message = match kind {
                MediaType::Image => InputMessage::text(caption).photo(uploaded),
                MediaType::Audio | MediaType::Video => InputMessage::text(caption).document(uploaded),
            };
            client
                .send_message(chat.pack(), message)
                .await
                .map_err(map_err)?;
            Ok::<_, Error>(())
        })
    }

    fn disconnect(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client.session().save_to_file(&self.session_path)?;
            debug!("session saved to {}", self.session_path.display());
        }
        Ok(())
    }
}
