//! Infrastructure layer - external adapters (archive providers, filesystem).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod html;
pub mod mail_dir;
#[cfg(test)]
pub mod memory;
pub mod provider;
pub mod transcript;

pub use config::{ensure_config_exists, load_config, render_config};
pub use html::{Html2TextConverter, HtmlToText};
pub use mail_dir::MailDirProvider;
pub use provider::{ArchiveHandle, ArchiveProvider, Folder, Message};
pub use transcript::{resolve_destination, TranscriptWriter};
