//! Archive inspection.
//!
//! Walks the folder tree without reading any message, for the `tree`
//! command.

use std::path::Path;

use crate::domain::{AppError, FolderSummary, Result};
use crate::infrastructure::{ArchiveHandle, ArchiveProvider, Folder};

use super::record::sanitize_folder_name;

/// Builds the folder overview of the archive at `source`.
///
/// Subfolders that cannot be opened are listed in `errors` of their parent.
///
/// # Errors
/// Returns error if the archive or its root folder cannot be opened.
pub fn inspect_archive(provider: &dyn ArchiveProvider, source: &Path) -> Result<FolderSummary> {
    let handle = ArchiveHandle::open(provider, source).map_err(AppError::archive_open)?;
    let root = handle.root_folder().map_err(AppError::archive_open)?;

    let summary = summarize(root.as_ref(), String::new());
    tracing::debug!(
        messages = summary.total_messages(),
        "Inspected {}",
        source.display()
    );

    Ok(summary)
}

fn summarize(folder: &dyn Folder, name: String) -> FolderSummary {
    let mut summary = FolderSummary {
        name,
        message_count: folder.message_count(),
        ..Default::default()
    };

    let count = folder.subfolder_count();
    for index in 0..count {
        match folder.subfolder(index) {
            Ok(child) => {
                let child_name = sanitize_folder_name(&child.name().unwrap_or_default());
                summary.subfolders.push(summarize(child.as_ref(), child_name));
            }
            Err(e) => {
                tracing::warn!("Error processing subfolder {}/{}: {}", index + 1, count, e);
                summary
                    .errors
                    .push(format!("subfolder {}/{}: {e}", index + 1, count));
            }
        }
    }

    summary
}
