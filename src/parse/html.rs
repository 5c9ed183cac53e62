//! HTML table fragments as returned by structure-recognition services.
//!
//! This is a regex scanner, not an HTML parser: services emit flat
//! `<table><tr><td>…` markup and a full DOM would buy nothing. Matching is
//! case-insensitive, ignores attributes, and spans newlines.

use crate::table::Table;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").unwrap());
static RE_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<t[hd][^>]*>(.*?)</t[hd]>").unwrap());
static RE_TH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<th").unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Parse the rows of an HTML table fragment into one [`Table`].
///
/// The first row containing a `<th>` becomes the header. Without any `<th>`
/// the first body row is promoted to the header. Returns `None` when no
/// column names can be established.
pub fn parse_html_table(html: &str) -> Option<Table> {
    let mut column_names: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut header_pending = true;

    for row_caps in RE_ROW.captures_iter(html) {
        let row_html = &row_caps[1];
        let cells: Vec<String> = RE_CELL
            .captures_iter(row_html)
            .map(|c| cell_text(&c[1]))
            .collect();

        if cells.is_empty() {
            continue;
        }
        if header_pending && RE_TH.is_match(row_html) {
            column_names = cells;
            header_pending = false;
        } else {
            rows.push(cells);
        }
    }

    if column_names.is_empty() && !rows.is_empty() {
        column_names = rows.remove(0);
    }

    if column_names.is_empty() {
        debug!("HTML fragment yielded no header");
        return None;
    }
    Some(Table::new(column_names, rows))
}

/// Strip nested tags and decode the four entities services actually emit.
fn cell_text(inner: &str) -> String {
    RE_TAG
        .replace_all(inner, "")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .trim()
        .to_string()
}
