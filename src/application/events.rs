//! Structured export events.
//!
//! The exporter never logs on its own; it reports what happens to an
//! injected `EventSink`. The CLI forwards events to `tracing`.

use std::path::Path;

use crate::domain::ItemError;

/// Something observable that happened during an export run.
#[derive(Debug, Clone, Copy)]
pub enum ExportEvent<'a> {
    Started {
        source: &'a Path,
        destination: &'a Path,
    },
    FolderStarted {
        path: &'a str,
        message_count: usize,
    },
    Progress {
        processed: u64,
    },
    ItemFailed(&'a ItemError),
    Cancelled {
        processed: u64,
    },
    Completed {
        processed: u64,
        errors: usize,
    },
}

/// Receives export events.
pub trait EventSink {
    fn emit(&mut self, event: &ExportEvent<'_>);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&mut self, event: &ExportEvent<'_>) {
        match *event {
            ExportEvent::Started {
                source,
                destination,
            } => {
                tracing::info!(
                    source = %source.display(),
                    destination = %destination.display(),
                    "Starting export"
                );
            }
            ExportEvent::FolderStarted {
                path,
                message_count,
            } => {
                tracing::info!("Processing folder: {} ({} messages)", path, message_count);
            }
            ExportEvent::Progress { processed } => {
                tracing::info!("Processed {} messages in total", processed);
            }
            ExportEvent::ItemFailed(error) => {
                tracing::error!(
                    folder = %error.folder_path,
                    kind = %error.kind,
                    index = error.index + 1,
                    total = error.total,
                    "{}",
                    error
                );
            }
            ExportEvent::Cancelled { processed } => {
                tracing::warn!(processed, "Export cancelled");
            }
            ExportEvent::Completed { processed, errors } => {
                tracing::info!(
                    processed,
                    errors,
                    "Conversion complete. Total messages processed: {}",
                    processed
                );
            }
        }
    }
}

/// Discards all events.
#[cfg(test)]
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

#[cfg(test)]
impl EventSink for NullEventSink {
    fn emit(&mut self, _event: &ExportEvent<'_>) {}
}
