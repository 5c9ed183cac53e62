//! The uniform row/column model every parser produces.
//!
//! A [`Table`] is deliberately loose: column names may repeat or be empty,
//! and rows may be shorter or longer than the header. Upstream OCR output is
//! inconsistent and every consumer in this crate indexes cells with
//! [`Table::cell`] rather than assuming a rectangular grid.
//!
//! Summary rows (Total / VAT / Grand Total) are not tagged; they are
//! recognised purely by substring, see [`is_summary_row`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Column-name keywords for the amount column, in priority order.
pub const AMOUNT_KEYWORDS: [&str; 4] = ["amount", "price", "total", "cost"];

/// A table normalized from an OCR/AI response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// One name per column. Empty strings mean "unnamed".
    pub column_names: Vec<String>,

    /// Body rows in extraction order. Item rows precede summary rows.
    pub rows: Vec<Vec<String>>,

    /// Precomputed total for export writers. Never set by the parsers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,

    /// Precomputed VAT for export writers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat: Option<String>,

    /// Precomputed grand total for export writers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<String>,
}

impl Table {
    pub fn new(column_names: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            column_names,
            rows,
            ..Self::default()
        }
    }

    /// Number of named (or unnamed) columns in the header.
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    /// Cell text at `(row, col)`, tolerant of ragged rows.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Index of the column treated as the numeric amount.
    ///
    /// The first keyword of [`AMOUNT_KEYWORDS`] found in any lowercased column
    /// name wins; otherwise the last column (or 0 for a header-less table).
    pub fn amount_column(&self) -> usize {
        AMOUNT_KEYWORDS
            .iter()
            .find_map(|kw| find_column(&self.column_names, &[*kw]))
            .unwrap_or_else(|| self.column_names.len().saturating_sub(1))
    }

    /// Indices of columns without a usable name.
    ///
    /// A name is unusable when it is blank or a generic placeholder such as
    /// `Column 3`.
    pub fn unnamed_columns(&self) -> Vec<usize> {
        self.column_names
            .iter()
            .enumerate()
            .filter(|(_, name)| name.trim().is_empty() || RE_PLACEHOLDER.is_match(name))
            .map(|(i, _)| i)
            .collect()
    }

    /// Name to show for column `i`: the header text or `Column {i+1}`.
    pub fn display_name(&self, i: usize) -> String {
        match self.column_names.get(i) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Column {}", i + 1),
        }
    }

    /// Return a copy with the given columns renamed. Out-of-range indices are ignored.
    pub fn rename_columns(&self, names: &[(usize, String)]) -> Table {
        let mut out = self.clone();
        for (i, name) in names {
            if let Some(slot) = out.column_names.get_mut(*i) {
                slot.clone_from(name);
            }
        }
        out
    }

    /// Return a copy with every unnamed column given its display name.
    pub fn with_display_names(&self) -> Table {
        let names: Vec<(usize, String)> = self
            .unnamed_columns()
            .into_iter()
            .map(|i| (i, self.display_name(i)))
            .collect();
        self.rename_columns(&names)
    }

    /// Return a copy without rows whose cells are all blank.
    pub fn without_blank_rows(&self) -> Table {
        let mut out = self.clone();
        out.rows
            .retain(|row| row.iter().any(|cell| !cell.trim().is_empty()));
        out
    }

    /// Serialize as a GitHub-flavoured pipe table.
    ///
    /// The output parses back to an equal table with
    /// [`crate::parse::markdown::parse_markdown_tables`] as long as every
    /// column name is non-empty and cells contain no `|`.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&pipe_line(self.column_names.iter().map(String::as_str)));
        out.push('\n');
        out.push_str(&pipe_line(self.column_names.iter().map(|_| "---")));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&pipe_line(row.iter().map(String::as_str)));
            out.push('\n');
        }
        out
    }
}

static RE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^column \d+$").unwrap());

fn pipe_line<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for cell in cells {
        line.push(' ');
        line.push_str(cell);
        line.push_str(" |");
    }
    line
}

/// Index of the first column whose lowercased name contains any keyword.
pub fn find_column(column_names: &[String], keywords: &[&str]) -> Option<usize> {
    column_names.iter().position(|name| {
        let lower = name.to_lowercase();
        keywords.iter().any(|kw| lower.contains(kw))
    })
}

/// True when any cell, lowercased, contains `total` or `vat`.
///
/// This is the only summary-row test in the crate. It over-matches on
/// purpose (`Subtotal`, an item called `Total Eclipse Lamp`).
pub fn is_summary_row(row: &[String]) -> bool {
    row.iter().any(|cell| {
        let lower = cell.to_lowercase();
        lower.contains("total") || lower.contains("vat")
    })
}

static RE_NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.\-]+").unwrap());
static RE_NUMBER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(?:\d+(?:\.\d*)?|\.\d+)").unwrap());

/// Parse a money-ish cell such as `"$1,234.50"` or `"AED 99"`.
///
/// Every character other than digits, `.` and `-` is dropped, then the
/// longest leading number is read. Returns `None` when nothing numeric is
/// left.
pub fn parse_number(cell: &str) -> Option<f64> {
    let stripped = RE_NON_NUMERIC.replace_all(cell, "");
    let prefix = RE_NUMBER_PREFIX.find(&stripped)?.as_str();
    prefix.trim_end_matches('.').parse::<f64>().ok()
}

/// Format a value with exactly two decimals.
pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn amount_column_prefers_keyword_priority() {
        // "price" outranks "total" even though "Total" comes first.
        let t = Table::new(strings(&["Item", "Total", "Unit Price"]), vec![]);
        assert_eq!(t.amount_column(), 2);

        let t = Table::new(strings(&["Item", "Cost", "Amount (AED)"]), vec![]);
        assert_eq!(t.amount_column(), 2);
    }

    #[test]
    fn amount_column_falls_back_to_last() {
        let t = Table::new(strings(&["Description", "Qty", "Value"]), vec![]);
        assert_eq!(t.amount_column(), 2);
    }

    #[test]
    fn amount_column_without_columns_is_zero() {
        assert_eq!(Table::default().amount_column(), 0);
    }

    #[test]
    fn summary_row_detection_over_matches() {
        assert!(is_summary_row(&strings(&["Subtotal", "10"])));
        assert!(is_summary_row(&strings(&["VAT 5%", "1"])));
        assert!(is_summary_row(&strings(&["Total Eclipse Lamp", "99"])));
        assert!(!is_summary_row(&strings(&["Pen", "10"])));
    }

    #[test]
    fn parse_number_strips_currency_noise() {
        assert_eq!(parse_number("$1,234.50"), Some(1234.5));
        assert_eq!(parse_number("AED 99"), Some(99.0));
        assert_eq!(parse_number("-12.5"), Some(-12.5));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("7."), Some(7.0));
    }

    #[test]
    fn parse_number_reads_leading_number_only() {
        assert_eq!(parse_number("1.2.3"), Some(1.2));
        assert_eq!(parse_number("12-3"), Some(12.0));
    }

    #[test]
    fn parse_number_rejects_non_numeric() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("..."), None);
    }

    #[test]
    fn format_amount_two_decimals() {
        assert_eq!(format_amount(30.0), "30.00");
        assert_eq!(format_amount(1.5), "1.50");
        assert_eq!(format_amount(121.3443), "121.34");
    }

    #[test]
    fn unnamed_columns_detects_blanks_and_placeholders() {
        let t = Table::new(strings(&["Item", "", "column 3", "Column12", "  "]), vec![]);
        assert_eq!(t.unnamed_columns(), vec![1, 2, 4]);
        assert_eq!(t.display_name(1), "Column 2");
        assert_eq!(t.display_name(0), "Item");
    }

    #[test]
    fn rename_does_not_touch_original() {
        let t = Table::new(strings(&["", "B"]), vec![]);
        let renamed = t.rename_columns(&[(0, "Item".into()), (9, "ignored".into())]);
        assert_eq!(renamed.column_names, strings(&["Item", "B"]));
        assert_eq!(t.column_names, strings(&["", "B"]));
    }

    #[test]
    fn display_names_fill_blank_headers_only() {
        let t = Table::new(strings(&["Item", "", "Column 7"]), vec![strings(&["Pen", "2", "x"])]);
        let named = t.with_display_names();
        assert_eq!(named.column_names, strings(&["Item", "Column 2", "Column 7"]));
        assert_eq!(named.rows, t.rows);
    }

    #[test]
    fn without_blank_rows_drops_whitespace_rows() {
        let t = Table::new(
            strings(&["A"]),
            vec![strings(&["  ", ""]), strings(&["x"]), vec![]],
        );
        assert_eq!(t.without_blank_rows().rows, vec![strings(&["x"])]);
    }

    #[test]
    fn ragged_cells_are_none() {
        let t = Table::new(strings(&["A", "B"]), vec![strings(&["only"])]);
        assert_eq!(t.cell(0, 0), Some("only"));
        assert_eq!(t.cell(0, 1), None);
        assert_eq!(t.cell(5, 0), None);
    }

    #[test]
    fn json_shape_uses_camel_case_and_omits_empty_scalars() {
        let t = Table::new(strings(&["A"]), vec![strings(&["1"])]);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["columnNames"][0], "A");
        assert!(json.get("grandTotal").is_none());

        let mut t = t;
        t.grand_total = Some("31.50".into());
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["grandTotal"], "31.50");
    }

    #[test]
    fn to_markdown_layout() {
        let t = Table::new(strings(&["Item", "Amount"]), vec![strings(&["Pen", ""])]);
        assert_eq!(
            t.to_markdown(),
            "| Item | Amount |\n| --- | --- |\n| Pen |  |\n"
        );
    }
}
