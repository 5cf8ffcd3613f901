//! Export driver.
//!
//! Orchestrates one run: open the archive, truncate the transcript, walk the
//! tree from the root and return the summary. Only an unopenable archive or
//! an unwritable destination abort the run.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::domain::{AppError, ExportConfig, ExportSummary, Result};
use crate::infrastructure::{ArchiveHandle, ArchiveProvider, HtmlToText, TranscriptWriter};

use super::body::BodyResolver;
use super::events::{EventSink, ExportEvent};
use super::walker::{FolderWalker, RunState};

/// Options for one export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Truncate bodies to this many characters. Unlimited when `None`.
    pub max_body_length: Option<usize>,
    /// Emit a progress event every this many records (0 disables).
    pub progress_interval: u64,
    /// Polled between items; when set the run stops early.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            max_body_length: None,
            progress_interval: 100,
            cancel: None,
        }
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            max_body_length: config.max_body_length,
            progress_interval: config.progress_interval,
            cancel: None,
        }
    }
}

/// Exports archives read through one provider.
pub struct Exporter<'a> {
    provider: &'a dyn ArchiveProvider,
    html: &'a dyn HtmlToText,
    options: ExportOptions,
}

impl<'a> Exporter<'a> {
    pub fn new(
        provider: &'a dyn ArchiveProvider,
        html: &'a dyn HtmlToText,
        options: ExportOptions,
    ) -> Self {
        Self {
            provider,
            html,
            options,
        }
    }

    /// Exports the archive at `source` into the transcript at `destination`.
    ///
    /// # Errors
    /// Returns `AppError::ArchiveOpen` if the archive or its root folder
    /// cannot be opened, and `AppError::Destination` if the transcript cannot
    /// be created. Per-message and per-folder failures are not errors; they
    /// are listed in the returned summary.
    pub fn run(
        &self,
        source: &Path,
        destination: &Path,
        events: &mut dyn EventSink,
    ) -> Result<ExportSummary> {
        let handle = ArchiveHandle::open(self.provider, source).map_err(AppError::archive_open)?;
        let root = handle.root_folder().map_err(AppError::archive_open)?;

        let writer = TranscriptWriter::create(destination)?;

        events.emit(&ExportEvent::Started {
            source,
            destination,
        });

        let walker = FolderWalker::new(
            BodyResolver::new(self.html, self.options.max_body_length),
            self.options.progress_interval,
        );
        let mut state = RunState::new(writer, &mut *events, self.options.cancel.clone());
        let cancelled = walker.walk(root.as_ref(), &mut Vec::new(), &mut state).is_err();
        let (processed_count, errors, _) = state.finish();

        drop(root);
        handle.close();

        if cancelled {
            events.emit(&ExportEvent::Cancelled {
                processed: processed_count,
            });
        } else {
            events.emit(&ExportEvent::Completed {
                processed: processed_count,
                errors: errors.len(),
            });
        }

        Ok(ExportSummary {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            processed_count,
            errors,
            cancelled,
        })
    }
}
