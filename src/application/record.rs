//! Record formatting.
//!
//! Turns one message into the fixed transcript layout. Absent values become
//! placeholders; only a failed read of subject, sender or delivery time is
//! reported to the caller.

use crate::domain::models::{NO_SUBJECT, UNKNOWN_DATE, UNKNOWN_SENDER};
use crate::domain::{MessageRecord, ProviderResult};
use crate::infrastructure::Message;

/// Keeps alphanumerics, space, `_` and `-`; drops everything else.
pub fn sanitize_folder_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect()
}

/// Joins already sanitized segments with `/`. Empty segments are kept.
pub fn join_folder_path(segments: &[String]) -> String {
    segments.join("/")
}

/// Builds the record for `message` located at `folder_path`.
///
/// # Errors
/// Returns the provider error if subject, sender or delivery time cannot be read.
pub fn build_record(
    message: &dyn Message,
    folder_path: &str,
    body: String,
) -> ProviderResult<MessageRecord> {
    let subject = non_empty(message.subject()?).unwrap_or_else(|| NO_SUBJECT.to_string());
    let sender = non_empty(message.sender_name()?).unwrap_or_else(|| UNKNOWN_SENDER.to_string());
    let delivery_time = message
        .delivery_time()?
        .map_or_else(|| UNKNOWN_DATE.to_string(), |dt| dt.to_rfc3339());

    Ok(MessageRecord {
        subject,
        sender,
        recipient_to: header_value(message, "To"),
        recipient_cc: header_value(message, "Cc"),
        delivery_time,
        folder_path: folder_path.to_string(),
        body,
    })
}

/// Formats `message` as transcript text, locating it by the sanitized
/// `segments` from the root down to its folder.
///
/// # Errors
/// Same as [`build_record`].
pub fn format_record(
    message: &dyn Message,
    segments: &[String],
    body: String,
) -> ProviderResult<String> {
    let folder_path = join_folder_path(segments);
    build_record(message, &folder_path, body).map(|record| record.to_string())
}

/// Header value or empty string; a missing map, missing key or read fault
/// all give `""`.
fn header_value(message: &dyn Message, name: &str) -> String {
    match message.transport_headers() {
        Ok(Some(headers)) => headers.get(name).unwrap_or_default().to_string(),
        Ok(None) => String::new(),
        Err(e) => {
            tracing::debug!("Error getting header {}: {}", name, e);
            String::new()
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
