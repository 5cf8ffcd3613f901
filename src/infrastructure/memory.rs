//! In-memory archive provider used by tests.
//!
//! Builds arbitrary folder trees and injects failures at any accessor.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset};

use crate::domain::{ProviderError, ProviderResult};

use super::provider::{Archive, ArchiveProvider, Folder, Message, TransportHeaders};

/// A message with optional fields and per-accessor fault switches.
#[derive(Debug, Clone, Default)]
pub struct MemoryMessage {
    pub subject: Option<String>,
    pub sender: Option<String>,
    pub delivery_time: Option<DateTime<FixedOffset>>,
    pub headers: Option<TransportHeaders>,
    pub plain_text: Option<Vec<u8>>,
    pub html: Option<Vec<u8>>,
    pub fail_subject: bool,
    pub fail_headers: bool,
    pub fail_body: bool,
}

impl MemoryMessage {
    pub fn new(subject: &str) -> Self {
        Self {
            subject: Some(subject.to_string()),
            ..Default::default()
        }
    }

    pub fn sender(mut self, sender: &str) -> Self {
        self.sender = Some(sender.to_string());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(TransportHeaders::new)
            .insert(name, value);
        self
    }

    pub fn text(mut self, body: &str) -> Self {
        self.plain_text = Some(body.as_bytes().to_vec());
        self
    }

    pub fn html(mut self, body: &str) -> Self {
        self.html = Some(body.as_bytes().to_vec());
        self
    }

    pub fn at(mut self, rfc3339: &str) -> Self {
        self.delivery_time = DateTime::parse_from_rfc3339(rfc3339).ok();
        self
    }
}

impl Message for MemoryMessage {
    fn subject(&self) -> ProviderResult<Option<String>> {
        if self.fail_subject {
            return Err(ProviderError::corrupt("subject property unreadable"));
        }
        Ok(self.subject.clone())
    }

    fn sender_name(&self) -> ProviderResult<Option<String>> {
        Ok(self.sender.clone())
    }

    fn delivery_time(&self) -> ProviderResult<Option<DateTime<FixedOffset>>> {
        Ok(self.delivery_time)
    }

    fn transport_headers(&self) -> ProviderResult<Option<TransportHeaders>> {
        if self.fail_headers {
            return Err(ProviderError::corrupt("header block unreadable"));
        }
        Ok(self.headers.clone())
    }

    fn plain_text_body(&self) -> ProviderResult<Option<Vec<u8>>> {
        if self.fail_body {
            return Err(ProviderError::corrupt("body stream unreadable"));
        }
        Ok(self.plain_text.clone())
    }

    fn html_body(&self) -> ProviderResult<Option<Vec<u8>>> {
        if self.fail_body {
            return Err(ProviderError::corrupt("body stream unreadable"));
        }
        Ok(self.html.clone())
    }
}

/// A folder whose messages or subfolders may fail to fetch (`None` entries).
#[derive(Debug, Clone, Default)]
pub struct MemoryFolder {
    pub name: Option<String>,
    messages: Vec<Option<MemoryMessage>>,
    subfolders: Vec<Option<MemoryFolder>>,
}

impl MemoryFolder {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: MemoryMessage) -> Self {
        self.messages.push(Some(message));
        self
    }

    pub fn with_broken_message(mut self) -> Self {
        self.messages.push(None);
        self
    }

    pub fn with_folder(mut self, folder: Self) -> Self {
        self.subfolders.push(Some(folder));
        self
    }

    pub fn with_broken_folder(mut self) -> Self {
        self.subfolders.push(None);
        self
    }
}

impl Folder for MemoryFolder {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn message_count(&self) -> usize {
        self.messages.len()
    }

    fn message(&self, index: usize) -> ProviderResult<Box<dyn Message>> {
        match self.messages.get(index) {
            Some(Some(message)) => Ok(Box::new(message.clone())),
            Some(None) => Err(ProviderError::corrupt(format!("message {index} is damaged"))),
            None => Err(ProviderError::not_found(format!("message {index}"))),
        }
    }

    fn subfolder_count(&self) -> usize {
        self.subfolders.len()
    }

    fn subfolder(&self, index: usize) -> ProviderResult<Box<dyn Folder>> {
        match self.subfolders.get(index) {
            Some(Some(folder)) => Ok(Box::new(folder.clone())),
            Some(None) => Err(ProviderError::corrupt(format!("folder {index} is damaged"))),
            None => Err(ProviderError::not_found(format!("folder {index}"))),
        }
    }
}

/// Provider serving one in-memory tree, counting how often it is closed.
pub struct MemoryProvider {
    root: Option<MemoryFolder>,
    closes: Rc<Cell<usize>>,
}

impl MemoryProvider {
    pub fn new(root: MemoryFolder) -> Self {
        Self {
            root: Some(root),
            closes: Rc::new(Cell::new(0)),
        }
    }

    /// A provider whose `open` always fails.
    pub fn unopenable() -> Self {
        Self {
            root: None,
            closes: Rc::new(Cell::new(0)),
        }
    }

    pub fn close_count(&self) -> usize {
        self.closes.get()
    }
}

impl ArchiveProvider for MemoryProvider {
    fn open(&self, path: &Path) -> ProviderResult<Box<dyn Archive>> {
        let root = self
            .root
            .clone()
            .ok_or_else(|| ProviderError::open(path, "not a valid archive"))?;
        Ok(Box::new(MemoryArchive {
            root,
            closes: Rc::clone(&self.closes),
        }))
    }
}

struct MemoryArchive {
    root: MemoryFolder,
    closes: Rc<Cell<usize>>,
}

impl Archive for MemoryArchive {
    fn root_folder(&self) -> ProviderResult<Box<dyn Folder>> {
        Ok(Box::new(self.root.clone()))
    }

    fn close(&mut self) {
        self.closes.set(self.closes.get() + 1);
    }
}
