//! Archive provider boundary.
//!
//! A provider decodes some mail-store container into a tree of folders and
//! messages. Every accessor returns `ProviderResult<Option<_>>` so that an
//! absent value and a failed read stay distinguishable at the call site.

use std::path::Path;

use chrono::{DateTime, FixedOffset};

use crate::domain::ProviderResult;

/// Opens archives of one container format.
pub trait ArchiveProvider {
    /// Opens the archive at `path`.
    ///
    /// # Errors
    /// Returns error if the container cannot be opened.
    fn open(&self, path: &Path) -> ProviderResult<Box<dyn Archive>>;
}

/// An opened archive.
pub trait Archive {
    /// Returns the root folder of the archive.
    ///
    /// # Errors
    /// Returns error if the root cannot be read.
    fn root_folder(&self) -> ProviderResult<Box<dyn Folder>>;

    /// Releases provider resources. Called exactly once by `ArchiveHandle`.
    fn close(&mut self);
}

/// One folder in the archive tree.
pub trait Folder {
    /// Display name, `None` when the container stores none.
    fn name(&self) -> Option<String>;

    fn message_count(&self) -> usize;

    /// Fetches the message at `index`.
    ///
    /// # Errors
    /// Returns error if the message cannot be fetched or decoded.
    fn message(&self, index: usize) -> ProviderResult<Box<dyn Message>>;

    fn subfolder_count(&self) -> usize;

    /// Fetches the subfolder at `index`.
    ///
    /// # Errors
    /// Returns error if the subfolder cannot be opened.
    fn subfolder(&self, index: usize) -> ProviderResult<Box<dyn Folder>>;
}

/// One message in a folder.
pub trait Message {
    fn subject(&self) -> ProviderResult<Option<String>>;
    fn sender_name(&self) -> ProviderResult<Option<String>>;
    fn delivery_time(&self) -> ProviderResult<Option<DateTime<FixedOffset>>>;
    fn transport_headers(&self) -> ProviderResult<Option<TransportHeaders>>;
    /// Raw plain-text body; not guaranteed to be valid UTF-8.
    fn plain_text_body(&self) -> ProviderResult<Option<Vec<u8>>>;
    /// Raw HTML body; not guaranteed to be valid UTF-8.
    fn html_body(&self) -> ProviderResult<Option<Vec<u8>>>;
}

/// Transport headers of a message, in source order.
///
/// Lookup is ASCII case-insensitive and returns the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportHeaders {
    entries: Vec<(String, String)>,
}

impl TransportHeaders {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TransportHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Exclusive owner of an opened archive for the duration of one run.
///
/// The archive is closed when the handle is dropped, so every exit path
/// releases it.
pub struct ArchiveHandle {
    archive: Option<Box<dyn Archive>>,
}

impl ArchiveHandle {
    /// Opens `path` with `provider`.
    ///
    /// # Errors
    /// Returns the provider's open error.
    pub fn open(provider: &dyn ArchiveProvider, path: &Path) -> ProviderResult<Self> {
        let archive = provider.open(path)?;
        tracing::debug!(path = %path.display(), "Opened archive");
        Ok(Self {
            archive: Some(archive),
        })
    }

    /// Returns the root folder of the archive.
    ///
    /// # Errors
    /// Returns error if the root cannot be read.
    pub fn root_folder(&self) -> ProviderResult<Box<dyn Folder>> {
        match &self.archive {
            Some(archive) => archive.root_folder(),
            None => Err(crate::domain::ProviderError::not_found("archive already closed")),
        }
    }

    /// Closes the archive now instead of at drop.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut archive) = self.archive.take() {
            archive.close();
            tracing::debug!("Closed archive");
        }
    }
}

impl Drop for ArchiveHandle {
    fn drop(&mut self) {
        self.release();
    }
}
