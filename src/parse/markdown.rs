//! GitHub-flavoured pipe tables embedded in arbitrary markdown.
//!
//! A table is a header line, a separator line, and one or more body lines,
//! every one of them starting and ending with `|` after trimming. Anything
//! else in the document is ignored, so a single layout-service response can
//! yield several tables interleaved with prose.

use crate::table::Table;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\|[\s\-:]+)+\|$").unwrap());

/// Extract every pipe table from `markdown`, in document order.
///
/// Header names are trimmed and empty ones dropped; body cells are trimmed
/// but empty ones kept. A header without a following separator line is
/// plain text. Tables with no column names or no body rows are discarded.
pub fn parse_markdown_tables(markdown: &str) -> Vec<Table> {
    let lines: Vec<&str> = markdown.split('\n').collect();
    let mut tables = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        if !is_pipe_line(line) {
            i += 1;
            continue;
        }

        let separator = lines.get(i + 1).map(|l| l.trim()).unwrap_or("");
        if !RE_SEPARATOR.is_match(separator) {
            i += 1;
            continue;
        }

        let column_names: Vec<String> = inner_cells(line)
            .filter(|name| !name.is_empty())
            .collect();

        i += 2;
        let mut rows = Vec::new();
        while let Some(row_line) = lines.get(i).map(|l| l.trim()) {
            if !is_pipe_line(row_line) {
                break;
            }
            rows.push(inner_cells(row_line).collect());
            i += 1;
        }

        if !column_names.is_empty() && !rows.is_empty() {
            debug!(
                "Markdown table: {} columns, {} rows",
                column_names.len(),
                rows.len()
            );
            tables.push(Table::new(column_names, rows));
        }
    }

    tables
}

fn is_pipe_line(line: &str) -> bool {
    line.starts_with('|') && line.ends_with('|')
}

/// Split on `|`, drop the segments outside the outer pipes, trim each.
fn inner_cells(line: &str) -> impl Iterator<Item = String> + '_ {
    let parts: Vec<&str> = line.split('|').collect();
    let end = parts.len().saturating_sub(1);
    parts
        .into_iter()
        .take(end)
        .skip(1)
        .map(|p| p.trim().to_string())
}
