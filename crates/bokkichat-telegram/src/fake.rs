//! In-memory `BotApi` for unit tests.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet, VecDeque},
    path::{Path, PathBuf},
    time::Duration,
};

use serde_json::Value;

use bokkichat_core::{errors::Error, Address, MediaType, Result};

use crate::{BotApi, RawUpdate};

const FILE_HOST: &str = "https://files.test/";

#[derive(Clone, Debug, PartialEq)]
pub enum Sent {
    Text {
        chat: Address,
        text: String,
    },
    Media {
        chat: Address,
        kind: MediaType,
        bytes: Vec<u8>,
        caption: String,
        path: PathBuf,
    },
}

#[derive(Default)]
pub struct FakeBotApi {
    polls: RefCell<VecDeque<Result<Vec<RawUpdate>>>>,
    poll_calls: RefCell<Vec<(Option<i64>, Option<Duration>)>>,
    files: HashMap<String, Vec<u8>>,
    unauthorized_files: HashSet<String>,
    refused_files: HashSet<String>,
    file_requests: RefCell<Vec<String>>,
    send_failures: RefCell<VecDeque<Error>>,
    sent: RefCell<Vec<Sent>>,
}

impl FakeBotApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file_id: &str, bytes: &[u8]) -> Self {
        self.files.insert(file_id.to_string(), bytes.to_vec());
        self
    }

    pub fn with_unauthorized_file(mut self, file_id: &str) -> Self {
        self.unauthorized_files.insert(file_id.to_string());
        self
    }

    /// `getFile` answers with an API error for this file (e.g. over the size limit).
    pub fn with_refused_file(mut self, file_id: &str) -> Self {
        self.refused_files.insert(file_id.to_string());
        self
    }

    /// Queue the answer of the next `get_updates` call.
    pub fn push_poll(&self, answer: Result<Vec<RawUpdate>>) {
        self.polls.borrow_mut().push_back(answer);
    }

    pub fn fail_next_send(&self, err: Error) {
        self.send_failures.borrow_mut().push_back(err);
    }

    pub fn poll_calls(&self) -> Vec<(Option<i64>, Option<Duration>)> {
        self.poll_calls.borrow().clone()
    }

    pub fn file_urls_requested(&self) -> Vec<String> {
        self.file_requests.borrow().clone()
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

pub fn update(update_id: i64, message: Value) -> RawUpdate {
    RawUpdate {
        update_id,
        message: Some(message),
    }
}

impl BotApi for FakeBotApi {
    fn identity(&self) -> Result<String> {
        Ok("@bokki_bot".to_string())
    }

    fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Option<Duration>,
    ) -> Result<Vec<RawUpdate>> {
        self.poll_calls.borrow_mut().push((offset, timeout));
        self.polls.borrow_mut().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn send_text(&self, chat: &Address, text: &str) -> Result<()> {
        self.next_send_result()?;
        self.sent.borrow_mut().push(Sent::Text {
            chat: chat.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn send_media(
        &self,
        chat: &Address,
        kind: MediaType,
        file: &Path,
        caption: &str,
    ) -> Result<()> {
        self.next_send_result()?;
        self.sent.borrow_mut().push(Sent::Media {
            chat: chat.clone(),
            kind,
            bytes: std::fs::read(file)?,
            caption: caption.to_string(),
            path: file.to_path_buf(),
        });
        Ok(())
    }

    fn file_url(&self, file_id: &str) -> Result<String> {
        self.file_requests.borrow_mut().push(file_id.to_string());
        if self.unauthorized_files.contains(file_id) {
            return Err(Error::Unauthorized(format!("getFile {file_id}")));
        }
        if self.refused_files.contains(file_id) {
            return Err(Error::Rejected(format!("Bad Request: file is too big ({file_id})")));
        }
        if !self.files.contains_key(file_id) {
            return Err(Error::External(format!("unknown file {file_id}")));
        }
        Ok(format!("{FILE_HOST}{file_id}"))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        url.strip_prefix(FILE_HOST)
            .and_then(|id| self.files.get(id))
            .cloned()
            .ok_or_else(|| Error::External(format!("404 {url}")))
    }
}
