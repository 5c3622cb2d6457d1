//! In-memory `UserApi` for unit tests.

use std::{
    cell::RefCell,
    collections::VecDeque,
    path::{Path, PathBuf},
};

use bokkichat_core::{errors::Error, MediaType, Result};

use crate::{Dialog, DialogMessage, UserApi};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Text {
        target: String,
        text: String,
    },
    File {
        target: String,
        kind: MediaType,
        bytes: Vec<u8>,
        caption: String,
        path: PathBuf,
    },
}

#[derive(Default)]
pub struct FakeUserApi {
    pub dialogs: Vec<Dialog>,
    dialog_failures: RefCell<VecDeque<Error>>,
    send_failures: RefCell<VecDeque<Error>>,
    sent: RefCell<Vec<Sent>>,
    pub disconnects: usize,
}

impl FakeUserApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialog(mut self, name: &str, messages: &[(bool, &str)]) -> Self {
        self.dialogs.push(Dialog {
            name: name.to_string(),
            messages: messages
                .iter()
                .map(|(outgoing, text)| DialogMessage {
                    outgoing: *outgoing,
                    text: text.to_string(),
                })
                .collect(),
        });
        self
    }

    pub fn fail_next_dialogs(&self, err: Error) {
        self.dialog_failures.borrow_mut().push_back(err);
    }

    pub fn fail_next_send(&self, err: Error) {
        self.send_failures.borrow_mut().push_back(err);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.borrow().clone()
    }

    fn next_send_result(&self) -> Result<()> {
        match self.send_failures.borrow_mut().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl UserApi for FakeUserApi {
    fn own_address(&self) -> Result<String> {
        Ok("bokki_user".to_string())
    }

    fn dialogs(&self) -> Result<Vec<Dialog>> {
        if let Some(err) = self.dialog_failures.borrow_mut().pop_front() {
            return Err(err);
        }
        Ok(self.dialogs.clone())
    }

    fn send_text(&self, target: &str, text: &str) -> Result<()> {
        self.next_send_result()?;
        self.sent.borrow_mut().push(Sent::Text {
            target: target.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn send_file(&self, target: &str, kind: MediaType, file: &Path, caption: &str) -> Result<()> {
        self.next_send_result()?;
        self.sent.borrow_mut().push(Sent::File {
            target: target.to_string(),
            kind,
            bytes: std::fs::read(file)?,
            caption: caption.to_string(),
            path: file.to_path_buf(),
        });
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.disconnects += 1;
        Ok(())
    }
}
