//! Last-resort parser for plain text lines.
//!
//! Used only when a response carries no structured table at all. Columns are
//! guessed from tabs or runs of two or more spaces, which is how OCR engines
//! usually render column gaps in flat text.

use crate::table::Table;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t| {2,}").unwrap());

/// Text lines carried by response items, via `.text` or `.res.text`.
pub fn collect_text_lines(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| {
            item.get("text")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .or_else(|| item.get("res")?.get("text")?.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect()
}

/// Split text lines into a table; the first line is the header.
///
/// Needs at least two lines. Pieces are trimmed and empty pieces dropped, so
/// rows can be ragged.
pub fn parse_text_lines(lines: &[String]) -> Option<Table> {
    if lines.len() < 2 {
        return None;
    }

    let mut rows: Vec<Vec<String>> = lines
        .iter()
        .map(|line| {
            RE_COLUMN_GAP
                .split(line)
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(str::to_string)
                .collect()
        })
        .collect();

    let column_names = rows.remove(0);
    Some(Table::new(column_names, rows))
}
