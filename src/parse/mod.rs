//! Table parsers, one per upstream representation.
//!
//! Each submodule turns one textual or structured representation into the
//! uniform [`Table`] model. None of them can fail: malformed input yields
//! `None` or an empty list.
//!
//! ## Representations
//!
//! ```text
//! markdown ──▶ pipe tables (0..n per document)
//! html     ──▶ <tr>/<td> fragment (0..1 per call)
//! cells    ──▶ (row, col, text) records (0..1 per call)
//! lines    ──▶ whitespace-separated text (0..1, last resort)
//! ```
//!
//! [`TableSource`] is the tagged union over all four, so callers that
//! already know the shape of their payload dispatch through one entry point.

pub mod cells;
pub mod html;
pub mod lines;
pub mod markdown;

use crate::table::Table;

pub use cells::{parse_cell_grid, CellRecord};
pub use html::parse_html_table;
pub use lines::parse_text_lines;
pub use markdown::parse_markdown_tables;

/// A raw table payload whose representation is known.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// Markdown text that may contain several pipe tables.
    Markdown(String),
    /// An HTML fragment holding one table.
    Html(String),
    /// Position-addressed cells of one table.
    Cells(Vec<CellRecord>),
    /// Plain text lines, first line is the header.
    Lines(Vec<String>),
}

impl TableSource {
    /// Parse into zero or more tables.
    pub fn parse(&self) -> Vec<Table> {
        match self {
            TableSource::Markdown(md) => parse_markdown_tables(md),
            TableSource::Html(html) => parse_html_table(html).into_iter().collect(),
            TableSource::Cells(cells) => parse_cell_grid(cells).into_iter().collect(),
            TableSource::Lines(lines) => parse_text_lines(lines).into_iter().collect(),
        }
    }

    /// Short name of the representation, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TableSource::Markdown(_) => "markdown",
            TableSource::Html(_) => "html",
            TableSource::Cells(_) => "cells",
            TableSource::Lines(_) => "lines",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_each_variant() {
        let md = TableSource::Markdown("| A |\n| - |\n| 1 |\n\n| B |\n| - |\n| 2 |".into());
        assert_eq!(md.parse().len(), 2);

        let html = TableSource::Html("<tr><td>A</td></tr><tr><td>1</td></tr>".into());
        assert_eq!(html.parse()[0].column_names, vec!["A".to_string()]);

        let cells = TableSource::Cells(vec![CellRecord::new(0, 0, "A"), CellRecord::new(1, 0, "1")]);
        assert_eq!(cells.parse()[0].rows, vec![vec!["1".to_string()]]);

        let lines = TableSource::Lines(vec!["A  B".into(), "1  2".into()]);
        assert_eq!(lines.parse()[0].column_names.len(), 2);
        assert_eq!(lines.kind(), "lines");
    }

    #[test]
    fn unparseable_payloads_yield_nothing() {
        assert!(TableSource::Html("no table".into()).parse().is_empty());
        assert!(TableSource::Cells(vec![]).parse().is_empty());
        assert!(TableSource::Lines(vec!["one".into()]).parse().is_empty());
        assert!(TableSource::Markdown(String::new()).parse().is_empty());
    }
}
