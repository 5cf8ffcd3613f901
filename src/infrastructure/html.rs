//! HTML to plain-text conversion for message bodies.
//!
//! `html2text` narrows the line for every quote, list and definition level
//! and never recovers once a level leaves no room: the width underflows and
//! word wrapping stops making progress. Before rendering, the document is
//! measured so the render width always leaves room for its deepest level.

use std::panic;

use crate::domain::{ProviderError, ProviderResult};

/// Converts an HTML document to readable plain text.
pub trait HtmlToText {
    /// # Errors
    /// Returns error if the document cannot be rendered.
    fn to_plain_text(&self, html: &str) -> ProviderResult<String>;
}

/// Narrowest wrap width handed to `html2text`.
const MIN_WIDTH: usize = 20;

/// Columns one nesting level may take: quote and bullet prefixes, or an
/// ordered-list number of up to 20 digits plus `". "`.
const LEVEL_WIDTH: usize = 24;

/// Deeper documents are rejected instead of rendered.
const MAX_NESTING: usize = 256;

/// Tags that narrow the line for their content.
const NESTING_TAGS: [&str; 5] = ["blockquote", "ul", "ol", "dl", "table"];

/// Tags whose prefix table layout does not reserve room for; inside a
/// table they are rendered as plain blocks.
const UNSIZED_IN_TABLE: [&str; 2] = ["blockquote", "dd"];

/// `html2text`-backed converter wrapping lines at a fixed width.
#[derive(Debug, Clone, Copy)]
pub struct Html2TextConverter {
    width: usize,
}

impl Html2TextConverter {
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(MIN_WIDTH),
        }
    }
}

impl Default for Html2TextConverter {
    fn default() -> Self {
        Self::new(80)
    }
}

impl HtmlToText for Html2TextConverter {
    fn to_plain_text(&self, html: &str) -> ProviderResult<String> {
        let prepared = prepare(html);
        if prepared.depth > MAX_NESTING {
            return Err(ProviderError::corrupt(format!(
                "HTML body nested {} levels deep",
                prepared.depth
            )));
        }

        let width = self.width.max(MIN_WIDTH + prepared.depth * LEVEL_WIDTH);
        panic::catch_unwind(|| html2text::from_read(prepared.html.as_bytes(), width)).map_err(
            |_| {
                tracing::warn!(depth = prepared.depth, width, "HTML renderer panicked");
                ProviderError::corrupt("HTML body could not be converted")
            },
        )
    }
}

/// Markup ready for rendering, with its deepest nesting level.
#[derive(Debug)]
struct PreparedHtml {
    html: String,
    depth: usize,
}

/// Scans the tags of `html`, counting open nesting tags per name.
///
/// The count is an upper bound on what the HTML parser builds: stray
/// closing tags are ignored and implied closes are not modelled.
fn prepare(html: &str) -> PreparedHtml {
    let mut out = String::with_capacity(html.len());
    let mut open = [0_usize; NESTING_TAGS.len()];
    let mut depth = 0;
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..=lt]);
        rest = &rest[lt + 1..];

        let closing = rest.starts_with('/');
        if closing {
            out.push('/');
            rest = &rest[1..];
        }

        let name_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        let (raw_name, tail) = rest.split_at(name_len);
        rest = tail;
        let name = raw_name.to_ascii_lowercase();

        let in_table = open[NESTING_TAGS.len() - 1] > 0;
        if in_table && UNSIZED_IN_TABLE.contains(&name.as_str()) {
            out.push_str("div");
            continue;
        }
        out.push_str(raw_name);

        if let Some(slot) = NESTING_TAGS.iter().position(|tag| *tag == name) {
            if closing {
                open[slot] = open[slot].saturating_sub(1);
            } else {
                open[slot] += 1;
                depth = depth.max(open.iter().sum());
            }
        }
    }
    out.push_str(rest);

    PreparedHtml { html: out, depth }
}
