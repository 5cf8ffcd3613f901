//! Application configuration.
//!
//! Loaded from an optional TOML file; command-line flags override it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Export behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Maximum body length in characters. Unlimited when unset.
    #[serde(default)]
    pub max_body_length: Option<usize>,

    /// Emit a progress event every this many records.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Line width used when converting HTML bodies to text.
    #[serde(default = "default_html_wrap_width")]
    pub html_wrap_width: usize,

    /// Directory for auto-named transcripts (current directory if unset).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_body_length: None,
            progress_interval: default_progress_interval(),
            html_wrap_width: default_html_wrap_width(),
            output_dir: None,
        }
    }
}

const fn default_progress_interval() -> u64 {
    100
}

const fn default_html_wrap_width() -> usize {
    80
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    /// Get the default configuration directory.
    #[must_use]
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mail-transcript")
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.export.max_body_length, None);
        assert_eq!(config.export.progress_interval, 100);
        assert_eq!(config.export.html_wrap_width, 80);
        assert!(config.export.output_dir.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("[export]\nmax_body_length = 500\n").unwrap();
        assert_eq!(config.export.max_body_length, Some(500));
        assert_eq!(config.export.progress_interval, 100);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_default_config_path_file_name() {
        let path = AppConfig::default_config_path();
        assert!(path.ends_with("mail-transcript/config.toml"));
    }
}
