//! Domain layer - core types for archive export.
//!
//! This layer contains pure domain models, configuration and error types
//! without any external dependencies (archive, filesystem, etc.).

pub mod config;
pub mod error;
pub mod models;

pub use config::{AppConfig, ExportConfig};
pub use error::{AppError, ProviderError, ProviderResult, Result};
pub use models::{ExportSummary, FolderSummary, ItemError, MessageRecord};
