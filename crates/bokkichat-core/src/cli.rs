//! Local console stand-in for a chat service, for manual testing.

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use tracing::debug;

use crate::{errors::Error, Address, CliSettings, Connection, Message, Result, TextMessage};

pub const CLI_ADDRESS: &str = "CLI";

/// Connection that "sends" by printing and "receives" by reading a line.
pub struct CliConnection<R = BufReader<Stdin>, W = Stdout> {
    settings: CliSettings,
    input: R,
    output: W,
}

impl CliConnection {
    pub fn new() -> Self {
        Self::with_io(BufReader::new(io::stdin()), io::stdout())
    }
}

impl Default for CliConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead, W: Write> CliConnection<R, W> {
    pub fn with_io(input: R, output: W) -> Self {
        Self {
            settings: CliSettings::default(),
            input,
            output,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Connection for CliConnection<R, W> {
    type Settings = CliSettings;

    fn settings(&self) -> &CliSettings {
        &self.settings
    }

    fn address(&self) -> Address {
        Address::from(CLI_ADDRESS)
    }

    fn send(&mut self, message: &Message) -> Result<()> {
        writeln!(self.output, "{message}")?;
        self.output.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Vec<Message>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::Disconnected("end of console input".to_string()));
        }
        let body = line.strip_suffix('\n').unwrap_or(&line);
        let body = body.strip_suffix('\r').unwrap_or(body);
        debug!("cli input: {body}");

        let address = self.address();
        Ok(vec![
            TextMessage::new(address.clone(), address, body).into()
        ])
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
