use anyhow::Context;
use tracing::info;

use bokkichat_core::{
    cli::CliConnection,
    config::{Backend, Config},
    Connection, ConnectionOptions, MediaMessage, Message, TextMessage,
};
use bokkichat_mtproto::{GrammersUserApi, TelegramUserConnection};
use bokkichat_telegram::TelegramBotConnection;

fn main() -> anyhow::Result<()> {
    bokkichat_core::logging::init("bokkichat")?;

    let cfg = Config::load().context("loading configuration")?;
    let options = ConnectionOptions::from(&cfg);
    info!("starting {:?} backend", cfg.backend);

    match cfg.backend {
        Backend::Cli => echo(CliConnection::new()),
        Backend::TelegramBot => {
            let settings = cfg.bot_settings()?;
            let conn = TelegramBotConnection::with_options(settings, options)
                .context("connecting the telegram bot")?;
            echo(conn)
        }
        Backend::TelegramUser => {
            let settings = cfg.user_settings()?;
            let api = GrammersUserApi::connect(&settings, cfg.telegram_phone.as_deref())
                .context("connecting the telegram user session")?;
            let conn = TelegramUserConnection::with_api(settings, options, api)?;
            echo(conn)
        }
    }
}

/// Send every received message back to whoever sent it, until the
/// connection fails or its input ends.
fn echo<C: Connection>(mut conn: C) -> anyhow::Result<()> {
    info!("echoing as {}", conn.address());
    let outcome = conn.run_loop(|conn, message| {
        let reply = reply_to(&message, &conn.address());
        conn.send(&reply)
    });
    conn.close()?;

    match outcome {
        Err(bokkichat_core::Error::Disconnected(reason)) => {
            info!("connection ended: {reason}");
            Ok(())
        }
        other => other.context("message loop failed"),
    }
}

fn reply_to(message: &Message, own: &bokkichat_core::Address) -> Message {
    match message {
        Message::Text(m) => {
            let mut reply = TextMessage::new(own.clone(), m.sender.clone(), m.body.clone());
            reply.title = m.title.clone();
            reply.into()
        }
        Message::Media(m) => MediaMessage::new(
            own.clone(),
            m.sender.clone(),
            m.media_type,
            m.data.clone(),
        )
        .with_caption(m.caption.clone())
        .into(),
    }
}
