//! Depth-first folder traversal.
//!
//! Each folder emits its own messages first, then each subfolder in order
//! (fully, with all descendants) before the next sibling. A failing message
//! or subfolder is recorded and skipped; it never stops the walk.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::domain::{ItemError, ProviderError};
use crate::infrastructure::{Folder, TranscriptWriter};

use super::body::BodyResolver;
use super::events::{EventSink, ExportEvent};
use super::record::{format_record, join_folder_path, sanitize_folder_name};

/// The walk stopped because cancellation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Why a single message could not be exported.
#[derive(Error, Debug)]
enum MessageFailure {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("failed to write record: {0}")]
    Write(#[from] io::Error),
}

/// Mutable state of one run, owned by the export driver and lent to the walker.
pub struct RunState<'a, W: Write> {
    writer: TranscriptWriter<W>,
    events: &'a mut dyn EventSink,
    cancel: Option<Arc<AtomicBool>>,
    processed: u64,
    errors: Vec<ItemError>,
}

impl<'a, W: Write> RunState<'a, W> {
    pub fn new(
        writer: TranscriptWriter<W>,
        events: &'a mut dyn EventSink,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            writer,
            events,
            cancel,
            processed: 0,
            errors: Vec::new(),
        }
    }

    /// Consumes the state, returning the counter, the error log and the writer.
    pub fn finish(self) -> (u64, Vec<ItemError>, TranscriptWriter<W>) {
        (self.processed, self.errors, self.writer)
    }

    fn emit(&mut self, event: &ExportEvent<'_>) {
        self.events.emit(event);
    }

    fn record_processed(&mut self, progress_interval: u64) {
        self.processed += 1;
        if progress_interval > 0 && self.processed % progress_interval == 0 {
            let processed = self.processed;
            self.emit(&ExportEvent::Progress { processed });
        }
    }

    fn record_error(&mut self, error: ItemError) {
        self.events.emit(&ExportEvent::ItemFailed(&error));
        self.errors.push(error);
    }

    fn check_cancelled(&self) -> Result<(), Cancelled> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(Cancelled),
            _ => Ok(()),
        }
    }
}

/// Walks a folder tree, streaming one record per message to the transcript.
pub struct FolderWalker<'a> {
    resolver: BodyResolver<'a>,
    progress_interval: u64,
}

impl<'a> FolderWalker<'a> {
    pub const fn new(resolver: BodyResolver<'a>, progress_interval: u64) -> Self {
        Self {
            resolver,
            progress_interval,
        }
    }

    /// Exports `folder` and all of its descendants.
    ///
    /// `path` holds the sanitized segments from the root down to `folder`;
    /// it is restored before returning.
    ///
    /// # Errors
    /// Returns `Cancelled` if the cancellation flag was raised; records
    /// written so far stay in the transcript.
    pub fn walk<W: Write>(
        &self,
        folder: &dyn Folder,
        path: &mut Vec<String>,
        state: &mut RunState<'_, W>,
    ) -> Result<(), Cancelled> {
        let folder_path = join_folder_path(path);

        let total = folder.message_count();
        if total > 0 {
            state.emit(&ExportEvent::FolderStarted {
                path: &folder_path,
                message_count: total,
            });
        }

        for index in 0..total {
            state.check_cancelled()?;
            match self.export_message(folder, index, path, state) {
                Ok(()) => state.record_processed(self.progress_interval),
                Err(e) => {
                    state.record_error(ItemError::message(&folder_path, index, total, e.to_string()));
                }
            }
        }

        let subfolders = folder.subfolder_count();
        for index in 0..subfolders {
            state.check_cancelled()?;
            match folder.subfolder(index) {
                Ok(child) => {
                    path.push(sanitize_folder_name(&child.name().unwrap_or_default()));
                    let outcome = self.walk(child.as_ref(), path, state);
                    path.pop();
                    outcome?;
                }
                Err(e) => {
                    state.record_error(ItemError::subfolder(
                        &folder_path,
                        index,
                        subfolders,
                        e.to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    fn export_message<W: Write>(
        &self,
        folder: &dyn Folder,
        index: usize,
        segments: &[String],
        state: &mut RunState<'_, W>,
    ) -> Result<(), MessageFailure> {
        let message = folder.message(index)?;
        let body = self.resolver.resolve(message.as_ref());
        let record = format_record(message.as_ref(), segments, body)?;
        state.writer.append_record(&record)?;
        Ok(())
    }
}
