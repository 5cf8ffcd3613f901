//! Domain models for mail archive export.
//!
//! These models represent what the exporter produces: normalized message
//! records, per-item failures, and the summary of a run.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Placeholder for a message without a usable subject.
pub const NO_SUBJECT: &str = "No subject";
/// Placeholder for a message without a sender name.
pub const UNKNOWN_SENDER: &str = "Unknown sender";
/// Placeholder for a message without a delivery time.
pub const UNKNOWN_DATE: &str = "Unknown";
/// Line closing every record in the transcript.
pub const RECORD_SEPARATOR: &str = "--------------------------------------------------";

/// One message normalized into the fixed transcript layout.
///
/// Every field is a plain `String`; absent source data has already been
/// replaced by its placeholder when the record is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRecord {
    pub subject: String,
    pub sender: String,
    pub recipient_to: String,
    pub recipient_cc: String,
    pub delivery_time: String,
    pub folder_path: String,
    pub body: String,
}

impl fmt::Display for MessageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Subject: {}", self.subject)?;
        writeln!(f, "From: {}", self.sender)?;
        writeln!(f, "To: {}", self.recipient_to)?;
        writeln!(f, "CC: {}", self.recipient_cc)?;
        writeln!(f, "Date: {}", self.delivery_time)?;
        writeln!(f, "Folder: {}", self.folder_path)?;
        writeln!(f, "Body:")?;
        writeln!(f, "{}", self.body)?;
        write!(f, "{RECORD_SEPARATOR}")
    }
}

/// What kind of item failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Message,
    Subfolder,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => write!(f, "message"),
            Self::Subfolder => write!(f, "subfolder"),
        }
    }
}

/// A message or subfolder that was skipped during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    /// Sanitized path of the folder the item belongs to.
    pub folder_path: String,
    pub kind: ItemKind,
    /// Zero-based index of the item within its folder.
    pub index: usize,
    /// Number of items of this kind in the folder.
    pub total: usize,
    pub message: String,
}

impl ItemError {
    /// Failure of the message at `index` in a folder holding `total` messages.
    pub fn message(
        folder_path: &str,
        index: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            folder_path: folder_path.to_string(),
            kind: ItemKind::Message,
            index,
            total,
            message: message.into(),
        }
    }

    /// Failure of the subfolder at `index` under `folder_path`.
    pub fn subfolder(
        folder_path: &str,
        index: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            folder_path: folder_path.to_string(),
            kind: ItemKind::Subfolder,
            index,
            total,
            message: message.into(),
        }
    }

    /// Human-readable location, e.g. `message 2/3 in Inbox`.
    #[must_use]
    pub fn location(&self) -> String {
        let folder = if self.folder_path.is_empty() {
            "/"
        } else {
            self.folder_path.as_str()
        };
        format!("{} {}/{} in {}", self.kind, self.index + 1, self.total, folder)
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error processing {}: {}", self.location(), self.message)
    }
}

/// Result of one export run that was not fatally aborted.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Records written to the transcript.
    pub processed_count: u64,
    pub errors: Vec<ItemError>,
    /// The run stopped early because cancellation was requested.
    pub cancelled: bool,
}

impl ExportSummary {
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Folder tree overview produced by the `tree` command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FolderSummary {
    pub name: String,
    pub message_count: usize,
    pub subfolders: Vec<FolderSummary>,
    /// Subfolders that could not be opened, as display strings.
    pub errors: Vec<String>,
}

impl FolderSummary {
    /// Messages in this folder and all of its descendants.
    #[must_use]
    pub fn total_messages(&self) -> usize {
        self.message_count
            + self
                .subfolders
                .iter()
                .map(Self::total_messages)
                .sum::<usize>()
    }
}
