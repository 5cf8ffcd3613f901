//! Filesystem mail archive provider.
//!
//! Reads a directory tree as an archive:
//! - subdirectories are folders,
//! - `*.mbox` files are folders named after the file stem,
//! - `*.eml` files are messages.
//!
//! Entries are enumerated in file-name order so repeated runs see the same
//! tree. A single `.mbox` file may also be opened directly; its root then
//! holds that mailbox as the only subfolder.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use mail_parser::{MessageParser, PartType};

use crate::domain::{ProviderError, ProviderResult};

use super::provider::{Archive, ArchiveProvider, Folder, Message, TransportHeaders};

const EML_EXTENSION: &str = "eml";
const MBOX_EXTENSION: &str = "mbox";

/// Provider for directory trees of `.eml` and `.mbox` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct MailDirProvider;

impl ArchiveProvider for MailDirProvider {
    fn open(&self, path: &Path) -> ProviderResult<Box<dyn Archive>> {
        let meta = fs::metadata(path).map_err(|e| ProviderError::open(path, e.to_string()))?;

        if meta.is_dir() || (meta.is_file() && has_extension(path, MBOX_EXTENSION)) {
            Ok(Box::new(MailDirArchive {
                root: path.to_path_buf(),
            }))
        } else {
            Err(ProviderError::open(
                path,
                "expected a mail directory or an .mbox file",
            ))
        }
    }
}

struct MailDirArchive {
    root: PathBuf,
}

impl Archive for MailDirArchive {
    fn root_folder(&self) -> ProviderResult<Box<dyn Folder>> {
        if self.root.is_dir() {
            Ok(Box::new(DirectoryFolder::read(&self.root, None, &[])?))
        } else {
            Ok(Box::new(DirectoryFolder {
                name: None,
                messages: Vec::new(),
                subfolders: vec![self.root.clone()],
                lineage: Vec::new(),
            }))
        }
    }

    fn close(&mut self) {
        tracing::trace!(root = %self.root.display(), "Mail directory released");
    }
}

/// A directory: `.eml` files are messages, subdirectories and `.mbox` files
/// are subfolders.
///
/// `lineage` holds the canonical paths from the root down to this folder.
/// A subdirectory resolving to one of them (through a symlink) is reported
/// as corrupt instead of being descended into again.
struct DirectoryFolder {
    name: Option<String>,
    messages: Vec<PathBuf>,
    subfolders: Vec<PathBuf>,
    lineage: Vec<PathBuf>,
}

impl DirectoryFolder {
    fn read(path: &Path, name: Option<String>, parents: &[PathBuf]) -> ProviderResult<Self> {
        let canonical = fs::canonicalize(path)
            .map_err(|e| ProviderError::io(&format!("Failed to resolve {}", path.display()), &e))?;
        if parents.contains(&canonical) {
            return Err(ProviderError::corrupt(format!(
                "{} loops back to {}",
                path.display(),
                canonical.display()
            )));
        }
        let mut lineage = parents.to_vec();
        lineage.push(canonical);

        let entries = fs::read_dir(path)
            .map_err(|e| ProviderError::io(&format!("Failed to list {}", path.display()), &e))?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(e) => {
                    tracing::warn!("Failed to read entry in {}: {}", path.display(), e);
                }
            }
        }
        paths.sort();

        let mut messages = Vec::new();
        let mut subfolders = Vec::new();
        for entry in paths {
            let hidden = entry
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with('.'));
            if hidden {
                continue;
            }

            if entry.is_dir() || has_extension(&entry, MBOX_EXTENSION) {
                subfolders.push(entry);
            } else if has_extension(&entry, EML_EXTENSION) {
                messages.push(entry);
            }
        }

        tracing::trace!(
            path = %path.display(),
            messages = messages.len(),
            subfolders = subfolders.len(),
            "Listed folder"
        );

        Ok(Self {
            name,
            messages,
            subfolders,
            lineage,
        })
    }
}

impl Folder for DirectoryFolder {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn message_count(&self) -> usize {
        self.messages.len()
    }

    fn message(&self, index: usize) -> ProviderResult<Box<dyn Message>> {
        let path = self
            .messages
            .get(index)
            .ok_or_else(|| ProviderError::not_found(format!("message {index}")))?;

        let raw = fs::read(path)
            .map_err(|e| ProviderError::io(&format!("Failed to read {}", path.display()), &e))?;

        Ok(Box::new(ParsedMessage::parse(&raw)?))
    }

    fn subfolder_count(&self) -> usize {
        self.subfolders.len()
    }

    fn subfolder(&self, index: usize) -> ProviderResult<Box<dyn Folder>> {
        let path = self
            .subfolders
            .get(index)
            .ok_or_else(|| ProviderError::not_found(format!("subfolder {index}")))?;

        if path.is_dir() {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            Ok(Box::new(Self::read(path, name, &self.lineage)?))
        } else {
            Ok(Box::new(MboxFolder::read(path)?))
        }
    }
}

/// An mbox file. Only message boundaries are kept in memory; each message
/// is read from disk when fetched.
struct MboxFolder {
    name: Option<String>,
    path: PathBuf,
    /// Byte range of every message, separator line excluded.
    offsets: Vec<(u64, u64)>,
}

impl MboxFolder {
    fn read(path: &Path) -> ProviderResult<Self> {
        let offsets = scan_offsets(path)
            .map_err(|e| ProviderError::io(&format!("Failed to scan {}", path.display()), &e))?;

        tracing::debug!(
            path = %path.display(),
            messages = offsets.len(),
            "Scanned mbox"
        );

        Ok(Self {
            name: path.file_stem().map(|n| n.to_string_lossy().into_owned()),
            path: path.to_path_buf(),
            offsets,
        })
    }

    fn read_range(&self, start: u64, end: u64) -> ProviderResult<Vec<u8>> {
        let context = || format!("Failed to read {}", self.path.display());
        let len = usize::try_from(end - start)
            .map_err(|_| ProviderError::corrupt(format!("mbox entry at {start} is too large")))?;

        let mut file = File::open(&self.path).map_err(|e| ProviderError::io(&context(), &e))?;
        file.seek(SeekFrom::Start(start))
            .map_err(|e| ProviderError::io(&context(), &e))?;
        let mut raw = vec![0; len];
        file.read_exact(&mut raw)
            .map_err(|e| ProviderError::io(&context(), &e))?;
        Ok(raw)
    }
}

impl Folder for MboxFolder {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn message_count(&self) -> usize {
        self.offsets.len()
    }

    fn message(&self, index: usize) -> ProviderResult<Box<dyn Message>> {
        let &(start, end) = self
            .offsets
            .get(index)
            .ok_or_else(|| ProviderError::not_found(format!("message {index}")))?;

        let raw = unescape_from_lines(&self.read_range(start, end)?);
        Ok(Box::new(ParsedMessage::parse(&raw)?))
    }

    fn subfolder_count(&self) -> usize {
        0
    }

    fn subfolder(&self, index: usize) -> ProviderResult<Box<dyn Folder>> {
        Err(ProviderError::not_found(format!("subfolder {index}")))
    }
}

/// Finds the byte range of every message in an mbox file. A message starts
/// after a `From ` separator line and runs up to the next one or end of file.
/// Anything before the first separator is ignored.
fn scan_offsets(path: &Path) -> std::io::Result<Vec<(u64, u64)>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut offsets = Vec::new();
    let mut line = Vec::new();
    let mut pos = 0_u64;
    let mut start = None;

    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)? as u64;
        if n == 0 {
            break;
        }
        if line.starts_with(b"From ") {
            if let Some(s) = start {
                offsets.push((s, pos));
            }
            start = Some(pos + n);
        }
        pos += n;
    }
    if let Some(s) = start {
        offsets.push((s, pos));
    }

    Ok(offsets)
}

/// Drops one `>` from body lines escaped as `>From `, `>>From ` and so on.
fn unescape_from_lines(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    for line in raw.split_inclusive(|b| *b == b'\n') {
        let quotes = line.iter().take_while(|b| **b == b'>').count();
        if quotes > 0 && line[quotes..].starts_with(b"From ") {
            out.extend_from_slice(&line[1..]);
        } else {
            out.extend_from_slice(line);
        }
    }
    out
}

/// A message decoded with `mail-parser`, detached from the raw buffer.
#[derive(Debug, Clone, Default)]
struct ParsedMessage {
    subject: Option<String>,
    sender: Option<String>,
    delivery_time: Option<DateTime<FixedOffset>>,
    headers: TransportHeaders,
    text: Option<Vec<u8>>,
    html: Option<Vec<u8>>,
}

impl ParsedMessage {
    fn parse(raw: &[u8]) -> ProviderResult<Self> {
        let message = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| ProviderError::corrupt("unparseable RFC 5322 message"))?;

        let sender = message
            .from()
            .and_then(|addrs| addrs.first())
            .and_then(|addr| addr.name().or_else(|| addr.address()))
            .map(str::to_string);

        let delivery_time = message
            .date()
            .and_then(|d| DateTime::parse_from_rfc3339(&d.to_rfc3339()).ok());

        // Folded header lines are joined back into one line.
        let headers = message
            .headers_raw()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.split_whitespace().collect::<Vec<_>>().join(" "),
                )
            })
            .collect();

        let text = message
            .text_body
            .iter()
            .filter_map(|id| message.part(*id))
            .find_map(|part| match &part.body {
                PartType::Text(text) => Some(text.as_bytes().to_vec()),
                _ => None,
            });

        let html = message
            .html_body
            .iter()
            .filter_map(|id| message.part(*id))
            .find_map(|part| match &part.body {
                PartType::Html(html) => Some(html.as_bytes().to_vec()),
                _ => None,
            });

        Ok(Self {
            subject: message.subject().map(str::to_string),
            sender,
            delivery_time,
            headers,
            text,
            html,
        })
    }
}

impl Message for ParsedMessage {
    fn subject(&self) -> ProviderResult<Option<String>> {
        Ok(self.subject.clone())
    }

    fn sender_name(&self) -> ProviderResult<Option<String>> {
        Ok(self.sender.clone())
    }

    fn delivery_time(&self) -> ProviderResult<Option<DateTime<FixedOffset>>> {
        Ok(self.delivery_time)
    }

    fn transport_headers(&self) -> ProviderResult<Option<TransportHeaders>> {
        if self.headers.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.headers.clone()))
        }
    }

    fn plain_text_body(&self) -> ProviderResult<Option<Vec<u8>>> {
        Ok(self.text.clone())
    }

    fn html_body(&self) -> ProviderResult<Option<Vec<u8>>> {
        Ok(self.html.clone())
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::NullEventSink;
    use crate::application::{ExportOptions, Exporter};
    use crate::infrastructure::Html2TextConverter;
    use tempfile::tempdir;

    const PLAIN_EML: &str = "From: \"Alice Example\" <alice@example.com>\r\n\
To: bob@example.com\r\n\
Cc: carol@example.com,\r\n dave@example.com\r\n\
Subject: Quarterly numbers\r\n\
Date: Mon, 4 Mar 2024 09:30:00 +0100\r\n\
\r\n\
See attached figures.\r\n";

    const HTML_EML: &str = "From: news@example.com\r\n\
To: bob@example.com\r\n\
Subject: Newsletter\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Hello <b>reader</b></p>\r\n";

    const MBOX: &str = "From alice@example.com Mon Mar  4 09:30:00 2024\n\
From: alice@example.com\n\
Subject: First\n\
\n\
one\n\
\n\
From bob@example.com Mon Mar  4 10:30:00 2024\n\
From: bob@example.com\n\
Subject: Second\n\
\n\
two\n";

    #[test]
    fn test_parse_plain_message() {
        let message = ParsedMessage::parse(PLAIN_EML.as_bytes()).unwrap();
        assert_eq!(message.subject().unwrap().as_deref(), Some("Quarterly numbers"));
        assert_eq!(message.sender_name().unwrap().as_deref(), Some("Alice Example"));

        let headers = message.transport_headers().unwrap().unwrap();
        assert_eq!(headers.get("To"), Some("bob@example.com"));
        assert_eq!(headers.get("CC"), Some("carol@example.com, dave@example.com"));

        let date = message.delivery_time().unwrap().unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-04T09:30:00+01:00");

        let body = message.plain_text_body().unwrap().unwrap();
        assert!(String::from_utf8_lossy(&body).contains("See attached figures."));
        assert!(message.html_body().unwrap().is_none());
    }

    #[test]
    fn test_parse_html_only_message() {
        let message = ParsedMessage::parse(HTML_EML.as_bytes()).unwrap();
        assert!(message.plain_text_body().unwrap().is_none());
        let html = message.html_body().unwrap().unwrap();
        assert!(String::from_utf8_lossy(&html).contains("<b>reader</b>"));
        assert_eq!(
            message.sender_name().unwrap().as_deref(),
            Some("news@example.com")
        );
    }

    #[test]
    fn test_directory_tree_in_name_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.eml"), PLAIN_EML).unwrap();
        fs::write(dir.path().join("a.eml"), HTML_EML).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("Sent")).unwrap();
        fs::write(dir.path().join("Archive.mbox"), MBOX).unwrap();

        let archive = MailDirProvider.open(dir.path()).unwrap();
        let root = archive.root_folder().unwrap();

        assert_eq!(root.name(), None);
        assert_eq!(root.message_count(), 2);
        let first = root.message(0).unwrap();
        assert_eq!(first.subject().unwrap().as_deref(), Some("Newsletter"));

        assert_eq!(root.subfolder_count(), 2);
        let mbox = root.subfolder(0).unwrap();
        assert_eq!(mbox.name().as_deref(), Some("Archive"));
        assert_eq!(mbox.message_count(), 2);
        assert_eq!(
            mbox.message(1).unwrap().subject().unwrap().as_deref(),
            Some("Second")
        );

        let sent = root.subfolder(1).unwrap();
        assert_eq!(sent.name().as_deref(), Some("Sent"));
        assert_eq!(sent.message_count(), 0);
    }

    #[test]
    fn test_single_mbox_file_as_root() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Inbox.mbox");
        fs::write(&path, MBOX).unwrap();

        let archive = MailDirProvider.open(&path).unwrap();
        let root = archive.root_folder().unwrap();
        assert_eq!(root.message_count(), 0);
        assert_eq!(root.subfolder_count(), 1);
        let inbox = root.subfolder(0).unwrap();
        assert_eq!(inbox.name().as_deref(), Some("Inbox"));
        assert_eq!(inbox.message_count(), 2);
    }

    #[test]
    fn test_open_missing_path_fails() {
        let dir = tempdir().unwrap();
        let result = MailDirProvider.open(&dir.path().join("missing"));
        assert!(matches!(result, Err(ProviderError::Open { .. })));
    }

    #[test]
    fn test_open_unsupported_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archive.pst");
        fs::write(&path, b"!BDN").unwrap();
        assert!(matches!(
            MailDirProvider.open(&path),
            Err(ProviderError::Open { .. })
        ));
    }

    #[test]
    fn test_vanished_message_is_item_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.eml"), PLAIN_EML).unwrap();

        let archive = MailDirProvider.open(dir.path()).unwrap();
        let root = archive.root_folder().unwrap();
        fs::remove_file(dir.path().join("a.eml")).unwrap();

        assert!(matches!(root.message(0), Err(ProviderError::Io { .. })));
    }

    #[test]
    fn test_mbox_escaped_from_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Notes.mbox");
        fs::write(
            &path,
            "From alice@example.com Mon Mar  4 09:30:00 2024\n\
From: alice@example.com\n\
Subject: Quoting\n\
\n\
>From the desk of Alice\n\
>>From deeper\n\
> From stays\n\
\n\
From bob@example.com Mon Mar  4 10:30:00 2024\n\
From: bob@example.com\n\
Subject: After\n\
\n\
bye\n",
        )
        .unwrap();

        let mbox = MboxFolder::read(&path).unwrap();
        assert_eq!(mbox.message_count(), 2);

        let body = mbox.message(0).unwrap().plain_text_body().unwrap().unwrap();
        let body = String::from_utf8_lossy(&body);
        let lines: Vec<&str> = body.lines().collect();
        assert!(lines.contains(&"From the desk of Alice"));
        assert!(lines.contains(&">From deeper"));
        assert!(lines.contains(&"> From stays"));

        let last = mbox.message(1).unwrap();
        assert_eq!(last.subject().unwrap().as_deref(), Some("After"));
    }

    #[test]
    fn test_mbox_reads_messages_on_fetch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Inbox.mbox");
        fs::write(&path, format!("leading junk\n{MBOX}")).unwrap();

        let mbox = MboxFolder::read(&path).unwrap();
        assert_eq!(mbox.message_count(), 2);
        assert!(mbox.offsets.iter().all(|(start, end)| start < end));
        assert!(matches!(
            mbox.message(2),
            Err(ProviderError::NotFound { .. })
        ));

        fs::write(&path, "").unwrap();
        assert!(matches!(mbox.message(0), Err(ProviderError::Io { .. })));
    }

    #[test]
    fn test_scan_offsets_without_separator() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Empty.mbox");
        fs::write(&path, "no separator here\n").unwrap();
        assert!(scan_offsets(&path).unwrap().is_empty());
    }

    #[test]
    fn test_export_directory_tree_to_transcript() {
        let dir = tempdir().unwrap();
        let mail = dir.path().join("mail");
        fs::create_dir_all(mail.join("Inbox").join("2024")).unwrap();
        fs::write(mail.join("root.eml"), HTML_EML).unwrap();
        fs::write(mail.join("Inbox").join("a.eml"), PLAIN_EML).unwrap();
        fs::write(mail.join("Inbox").join("2024").join("Old.mbox"), MBOX).unwrap();
        let destination = dir.path().join("out.txt");

        let html = Html2TextConverter::default();
        let summary = Exporter::new(&MailDirProvider, &html, ExportOptions::default())
            .run(&mail, &destination, &mut NullEventSink)
            .unwrap();

        assert_eq!(summary.processed_count, 4);
        assert_eq!(summary.error_count(), 0);
        assert!(!summary.cancelled);

        let text = fs::read_to_string(&destination).unwrap();
        assert_eq!(text.matches("Subject: ").count(), 4);
        assert!(text.starts_with("Subject: Newsletter\n"));
        assert!(text.contains("reader"));
        assert!(!text.contains("<b>"));
        assert!(text.contains("Subject: Quarterly numbers\nFrom: Alice Example\nTo: bob@example.com\n"));
        assert!(text.contains("\nFolder: Inbox\n"));
        assert!(text.contains("Subject: First\n"));
        assert!(text.contains("\nFolder: Inbox/2024/Old\n"));

        let first = text.find("Subject: Newsletter").unwrap();
        let inbox = text.find("Subject: Quarterly numbers").unwrap();
        let nested = text.find("Subject: Second").unwrap();
        assert!(first < inbox && inbox < nested);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_folder_loop_is_reported_once() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().unwrap();
        let mail = dir.path().join("mail");
        fs::create_dir_all(mail.join("Inbox")).unwrap();
        fs::write(mail.join("Inbox").join("a.eml"), PLAIN_EML).unwrap();
        symlink(&mail, mail.join("Inbox").join("loop")).unwrap();
        let destination = dir.path().join("out.txt");

        let archive = MailDirProvider.open(&mail).unwrap();
        let inbox = archive.root_folder().unwrap().subfolder(0).unwrap();
        assert_eq!(inbox.subfolder_count(), 1);
        assert!(matches!(
            inbox.subfolder(0),
            Err(ProviderError::Corrupt { .. })
        ));

        let html = Html2TextConverter::default();
        let summary = Exporter::new(&MailDirProvider, &html, ExportOptions::default())
            .run(&mail, &destination, &mut NullEventSink)
            .unwrap();

        assert_eq!(summary.processed_count, 1);
        assert_eq!(summary.error_count(), 1);
        let text = fs::read_to_string(&destination).unwrap();
        assert_eq!(text.matches("Subject: ").count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_sibling_folder_is_followed() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().unwrap();
        let mail = dir.path().join("mail");
        fs::create_dir_all(mail.join("Inbox")).unwrap();
        fs::write(mail.join("Inbox").join("a.eml"), PLAIN_EML).unwrap();
        symlink(mail.join("Inbox"), mail.join("Alias")).unwrap();

        let archive = MailDirProvider.open(&mail).unwrap();
        let root = archive.root_folder().unwrap();
        let alias = root.subfolder(0).unwrap();
        assert_eq!(alias.name().as_deref(), Some("Alias"));
        assert_eq!(alias.message_count(), 1);
    }
}
