use std::{path::PathBuf, thread, time::Duration};

use crate::{staging, Address, Message, Result};

/// Cross-backend connection.
///
/// A connection owns its settings and one live backend session. It is used
/// from a single thread of control: every call blocks until the backend has
/// answered, and no state is shared with other connections.
pub trait Connection {
    type Settings;

    fn settings(&self) -> &Self::Settings;

    /// Identity of this endpoint, as other parties would address it.
    fn address(&self) -> Address;

    /// Deliver `message` to `message.receiver()`.
    ///
    /// Recipients the backend refuses are logged and dropped; only
    /// unexpected backend failures are returned.
    fn send(&mut self, message: &Message) -> Result<()>;

    /// All messages that arrived since the previous call (or since the
    /// connection was created). Tolerated transient faults yield an empty batch.
    fn receive(&mut self) -> Result<Vec<Message>>;

    /// Pause after each `run_loop` batch. Backends whose `receive` already
    /// blocks on input return `None`.
    fn poll_interval(&self) -> Option<Duration> {
        None
    }

    /// Poll forever, handing every received message to `callback` in order.
    ///
    /// Only returns when `receive` or `callback` fails.
    fn run_loop<F>(&mut self, mut callback: F) -> Result<()>
    where
        Self: Sized,
        F: FnMut(&mut Self, Message) -> Result<()>,
    {
        loop {
            for message in self.receive()? {
                callback(self, message)?;
            }
            if let Some(pause) = self.poll_interval().filter(|p| !p.is_zero()) {
                thread::sleep(pause);
            }
        }
    }

    /// Release the backend session. Calling it again is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// Non-credential knobs shared by the remote backends.
#[derive(Clone, Debug)]
pub struct ConnectionOptions {
    /// Bounded wait of a single long-poll request.
    pub poll_timeout: Duration,
    /// Pause between `run_loop` iterations.
    pub poll_interval: Duration,
    /// Where media is staged before upload.
    pub temp_dir: PathBuf,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(1),
            temp_dir: staging::default_temp_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::{errors::Error, TextMessage};

    struct Scripted {
        batches: VecDeque<Result<Vec<Message>>>,
        sent: Vec<Message>,
    }

    impl Scripted {
        fn new(batches: Vec<Result<Vec<Message>>>) -> Self {
            Self {
                batches: batches.into(),
                sent: Vec::new(),
            }
        }
    }

    impl Connection for Scripted {
        type Settings = ();

        fn settings(&self) -> &() {
            &()
        }

        fn address(&self) -> Address {
            Address::from("scripted")
        }

        fn send(&mut self, message: &Message) -> Result<()> {
            self.sent.push(message.clone());
            Ok(())
        }

        fn receive(&mut self) -> Result<Vec<Message>> {
            self.batches
                .pop_front()
                .unwrap_or_else(|| Err(Error::Disconnected("script exhausted".into())))
        }

        fn poll_interval(&self) -> Option<Duration> {
            Some(Duration::ZERO)
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn text(body: &str) -> Message {
        TextMessage::new(Address::from("a"), Address::from("b"), body).into()
    }

    #[test]
    fn loop_invokes_callback_once_per_message_in_order() {
        let (m1, m2) = (text("m1"), text("m2"));
        let mut conn = Scripted::new(vec![Ok(vec![m1.clone(), m2.clone()]), Ok(vec![]), Ok(vec![])]);

        let mut seen = Vec::new();
        let result = conn.run_loop(|_, m| {
            seen.push(m);
            Ok(())
        });

        assert!(matches!(result, Err(Error::Disconnected(_))));
        assert_eq!(seen, vec![m1, m2]);
    }

    #[test]
    fn callback_error_stops_the_loop() {
        let mut conn = Scripted::new(vec![
            Ok(vec![text("first"), text("second")]),
            Ok(vec![text("never")]),
        ]);

        let mut calls = 0;
        let result = conn.run_loop(|_, _| {
            calls += 1;
            Err(Error::External("callback failed".into()))
        });

        assert!(matches!(result, Err(Error::External(_))));
        assert_eq!(calls, 1);
        assert_eq!(conn.batches.len(), 1);
    }

    #[test]
    fn callback_can_reply_through_the_connection() {
        let mut conn = Scripted::new(vec![Ok(vec![text("ping")])]);

        let _ = conn.run_loop(|c, m| {
            let reply = TextMessage::new(c.address(), m.sender().clone(), "pong");
            c.send(&reply.into())
        });

        assert_eq!(conn.sent.len(), 1);
        assert_eq!(conn.sent[0].receiver(), &Address::from("a"));
        assert_eq!(conn.sent[0].as_text().unwrap().body, "pong");
    }

    #[test]
    fn default_options() {
        let o = ConnectionOptions::default();
        assert_eq!(o.poll_timeout, Duration::from_secs(10));
        assert_eq!(o.poll_interval, Duration::from_secs(1));
    }
}
