//! Message body resolution.
//!
//! Fallback chain: plain text, then HTML converted to text, then a
//! placeholder. Never fails; read and conversion faults become a
//! placeholder string.

use crate::domain::ProviderResult;
use crate::infrastructure::{HtmlToText, Message};

/// Body used when a message has neither a plain-text nor an HTML body.
pub const NO_BODY: &str = "No body text available";
/// Body used when reading the body failed.
pub const BODY_ERROR: &str = "Error retrieving message body";
/// Suffix appended to truncated bodies.
pub const TRUNCATED_SUFFIX: &str = "... [truncated]";

/// Resolves message bodies to normalized text.
#[derive(Clone, Copy)]
pub struct BodyResolver<'a> {
    html: &'a dyn HtmlToText,
    max_length: Option<usize>,
}

impl<'a> BodyResolver<'a> {
    pub fn new(html: &'a dyn HtmlToText, max_length: Option<usize>) -> Self {
        Self { html, max_length }
    }

    /// Returns the message body as text, truncated to `max_length`
    /// characters when configured.
    pub fn resolve(&self, message: &dyn Message) -> String {
        match self.read_body(message) {
            Ok(Some(body)) => truncate_body(body, self.max_length),
            Ok(None) => NO_BODY.to_string(),
            Err(e) => {
                tracing::debug!("Error getting message body: {}", e);
                BODY_ERROR.to_string()
            }
        }
    }

    fn read_body(&self, message: &dyn Message) -> ProviderResult<Option<String>> {
        if let Some(raw) = message.plain_text_body()? {
            let text = decode_lossy(raw);
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }

        match message.html_body()? {
            Some(raw) => self.html.to_plain_text(&decode_lossy(raw)).map(Some),
            None => Ok(None),
        }
    }
}

/// Decodes bytes as UTF-8, replacing invalid sequences with U+FFFD.
fn decode_lossy(raw: Vec<u8>) -> String {
    String::from_utf8(raw)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Keeps the first `max_length` characters and marks the cut.
pub fn truncate_body(mut body: String, max_length: Option<usize>) -> String {
    if let Some(max) = max_length {
        if let Some((cut, _)) = body.char_indices().nth(max) {
            body.truncate(cut);
            body.push_str(TRUNCATED_SUFFIX);
        }
    }
    body
}
