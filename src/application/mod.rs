//! Application layer - use cases and orchestration.
//!
//! This layer contains the export engine: body resolution, record
//! formatting, tree traversal and the run driver.

pub mod body;
pub mod events;
pub mod exporter;
pub mod formatter;
pub mod record;
pub mod tree;
pub mod walker;

pub use events::TracingEventSink;
pub use exporter::{ExportOptions, Exporter};
pub use formatter::{format_errors_table, format_summary, format_summary_json, format_tree};
pub use tree::inspect_archive;
