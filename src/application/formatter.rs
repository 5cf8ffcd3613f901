//! Console output formatting.
//!
//! Renders export summaries, item errors and folder trees for the CLI.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{AppError, ExportSummary, FolderSummary, ItemError, Result};

/// Formats an export summary for display.
pub fn format_summary(summary: &ExportSummary) -> String {
    let status = if summary.cancelled {
        "⚠ Export cancelled".yellow().bold()
    } else if summary.errors.is_empty() {
        "✓ Export complete".green().bold()
    } else {
        "✓ Export complete with errors".yellow().bold()
    };

    format!(
        "{}\n  Source: {}\n  Transcript: {}\n  Messages processed: {}\n  Errors: {}",
        status,
        summary.source.display(),
        summary.destination.display().to_string().cyan(),
        summary.processed_count.to_string().cyan(),
        if summary.errors.is_empty() {
            "0".green()
        } else {
            summary.error_count().to_string().red()
        }
    )
}

/// Formats a summary as JSON.
///
/// # Errors
/// Returns `AppError::Json` if serialization fails.
pub fn format_summary_json(summary: &ExportSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).map_err(AppError::json)
}

/// Formats a table of skipped items.
pub fn format_errors_table(errors: &[ItemError]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Folder", "Item", "Error"]);

    for error in errors {
        let folder = if error.folder_path.is_empty() {
            "/".to_string()
        } else {
            truncate(&error.folder_path, 40)
        };

        table.add_row(vec![
            folder,
            format!("{} {}/{}", error.kind, error.index + 1, error.total),
            truncate(&error.message, 60),
        ]);
    }

    table.to_string()
}

/// Formats a folder tree with message counts.
pub fn format_tree(tree: &FolderSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} ({} messages total)\n",
        "📂 Archive".bold(),
        tree.total_messages().to_string().cyan()
    ));
    push_tree_lines(&mut out, tree, 0);
    out.trim_end().to_string()
}

fn push_tree_lines(out: &mut String, folder: &FolderSummary, depth: usize) {
    let indent = "  ".repeat(depth + 1);

    if depth > 0 || folder.message_count > 0 {
        let name = match (depth, folder.name.is_empty()) {
            (0, _) => "(root)".to_string(),
            (_, true) => "(unnamed)".to_string(),
            (_, false) => folder.name.clone(),
        };
        out.push_str(&format!(
            "{indent}{} [{}]\n",
            name,
            folder.message_count.to_string().cyan()
        ));
    }

    for error in &folder.errors {
        out.push_str(&format!("{indent}  {} {}\n", "✗".red(), error));
    }

    for child in &folder.subfolders {
        push_tree_lines(out, child, depth + 1);
    }
}

/// Truncates a string to max length with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
