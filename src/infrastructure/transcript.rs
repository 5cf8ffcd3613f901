//! Transcript output file.
//!
//! The transcript is truncated once when the run starts and then only
//! appended to, one record at a time, so a crash keeps every record written
//! before it.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::domain::{AppError, Result};

/// Blank line written after every record.
const RECORD_GAP: &[u8] = b"\n\n";

/// Append-only writer for transcript records.
pub struct TranscriptWriter<W: Write = File> {
    inner: W,
}

impl TranscriptWriter<File> {
    /// Creates (or truncates) the transcript at `path`, creating parent
    /// directories as needed.
    ///
    /// # Errors
    /// Returns `AppError::Destination` if the file cannot be prepared.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AppError::destination(path, e))?;
        }

        let file = File::create(path).map_err(|e| AppError::destination(path, e))?;
        tracing::debug!(path = %path.display(), "Transcript truncated");

        Ok(Self::new(file))
    }
}

impl<W: Write> TranscriptWriter<W> {
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Appends one record followed by a blank line and flushes.
    ///
    /// # Errors
    /// Returns the underlying write error; the record may be partially written.
    pub fn append_record(&mut self, record: &str) -> io::Result<()> {
        self.inner.write_all(record.as_bytes())?;
        self.inner.write_all(RECORD_GAP)?;
        self.inner.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Default transcript file name: `<archiveBaseName>_content_<YYYYmmdd_HHMMSS>.txt`.
pub fn default_transcript_name<Tz: TimeZone>(source: &Path, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let base = source
        .file_stem()
        .map_or_else(|| "archive".to_string(), |s| s.to_string_lossy().into_owned());
    format!("{base}_content_{}.txt", now.format("%Y%m%d_%H%M%S"))
}

/// Picks the transcript path: an explicit file wins, otherwise a default
/// name inside `output_dir` (or the current directory).
pub fn resolve_destination<Tz: TimeZone>(
    source: &Path,
    explicit: Option<&Path>,
    output_dir: Option<&Path>,
    now: &DateTime<Tz>,
) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    let name = default_transcript_name(source, now);
    output_dir.map_or_else(|| PathBuf::from(&name), |dir| dir.join(&name))
}
