//! Summary row derivation: Total, VAT and Grand Total.
//!
//! Extracted tables often stop short of the totals, or carry only some of
//! them (an AI extractor that computed `Total` but not `VAT`). This module
//! appends whichever of the three rows is missing, computed from the item
//! rows, and leaves the rows that already exist where they are.
//!
//! ## Presence flags
//!
//! Presence is decided by substring over every cell, lowercased:
//!
//! | Flag | Substring |
//! |------|-----------|
//! | total | `total` |
//! | vat | `vat` |
//! | grand total | `grand total` |
//!
//! A `Grand Total` row therefore also sets the `total` flag. Once all three
//! are set the table is returned as is, which makes derivation idempotent.

use crate::config::PricingPolicy;
use crate::table::{format_amount, is_summary_row, parse_number, Table};
use tracing::debug;

/// Which summary rows a table already carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryPresence {
    pub total: bool,
    pub vat: bool,
    pub grand_total: bool,
}

impl SummaryPresence {
    /// Scan every cell of every row.
    pub fn scan(table: &Table) -> Self {
        let mut p = Self::default();
        for cell in table.rows.iter().flatten() {
            let lower = cell.to_lowercase();
            p.total |= lower.contains("total");
            p.vat |= lower.contains("vat");
            p.grand_total |= lower.contains("grand total");
        }
        p
    }

    pub fn is_complete(&self) -> bool {
        self.total && self.vat && self.grand_total
    }
}

/// Computed summary values before formatting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryValues {
    pub total: f64,
    pub vat: f64,
    pub grand_total: f64,
}

impl SummaryValues {
    pub fn from_total(total: f64, policy: &PricingPolicy) -> Self {
        let vat = total * policy.vat_rate;
        Self {
            total,
            vat,
            grand_total: total + vat,
        }
    }
}

/// Sum of the amount column over item rows.
///
/// Summary rows are excluded and unparseable amounts count as zero. A row
/// whose cell is exactly `total` (any case) with a parseable amount replaces
/// the computed sum.
pub fn compute_total(table: &Table, amount_col: usize) -> f64 {
    let sum: f64 = table
        .rows
        .iter()
        .filter(|row| !is_summary_row(row))
        .filter_map(|row| row.get(amount_col).and_then(|c| parse_number(c)))
        .sum();

    let stated = table
        .rows
        .iter()
        .find(|row| row.iter().any(|cell| cell.to_lowercase() == "total"))
        .and_then(|row| row.get(amount_col))
        .and_then(|c| parse_number(c));

    match stated {
        Some(total) => {
            debug!("Using stated total {} instead of computed {}", total, sum);
            total
        }
        None => sum,
    }
}

/// Append the missing Total / VAT / Grand Total rows.
///
/// Returns a new table; `table` is never modified. Derivation is idempotent
/// as long as the policy labels contain `total` and `grand total`, which
/// [`crate::QuoteConfigBuilder::build`] enforces.
pub fn derive_summary(table: &Table, policy: &PricingPolicy) -> Table {
    let presence = SummaryPresence::scan(table);
    if presence.is_complete() {
        return table.clone();
    }

    let amount_col = table.amount_column();
    let values = SummaryValues::from_total(compute_total(table, amount_col), policy);

    let mut out = table.clone();
    let width = table.column_count().max(amount_col + 1);
    let missing = [
        (presence.total, policy.total_label.clone(), values.total),
        (presence.vat, policy.vat_label(), values.vat),
        (presence.grand_total, policy.grand_total_label.clone(), values.grand_total),
    ];
    for (present, label, value) in missing {
        if !present {
            out.rows.push(summary_row(width, amount_col, label, value));
        }
    }

    debug!(
        "Derived summary: total={} vat={} grand_total={}",
        format_amount(values.total),
        format_amount(values.vat),
        format_amount(values.grand_total)
    );
    out
}

/// A row of `width` empty cells with `label` at column 0 and the formatted
/// value at `amount_col`. When `amount_col` is 0 the value replaces the label.
pub(crate) fn summary_row(width: usize, amount_col: usize, label: String, value: f64) -> Vec<String> {
    let mut row = vec![String::new(); width.max(amount_col + 1)];
    row[0] = label;
    row[amount_col] = format_amount(value);
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn invoice() -> Table {
        Table::new(
            strings(&["Item", "Amount"]),
            vec![strings(&["Pen", "10.00"]), strings(&["Book", "20.00"])],
        )
    }

    #[test]
    fn appends_all_three_rows() {
        let t = derive_summary(&invoice(), &PricingPolicy::default());
        assert_eq!(t.rows.len(), 5);
        assert_eq!(t.rows[2], strings(&["Total", "30.00"]));
        assert_eq!(t.rows[3], strings(&["VAT 5%", "1.50"]));
        assert_eq!(t.rows[4], strings(&["Grand Total", "31.50"]));
    }

    #[test]
    fn input_is_untouched() {
        let original = invoice();
        let _ = derive_summary(&original, &PricingPolicy::default());
        assert_eq!(original, invoice());
    }

    #[test]
    fn derivation_is_idempotent() {
        let policy = PricingPolicy::default();
        let once = derive_summary(&invoice(), &policy);
        let twice = derive_summary(&once, &policy);
        assert_eq!(once, twice);
    }

    #[test]
    fn existing_total_row_is_not_double_counted() {
        let mut t = invoice();
        t.rows.push(strings(&["Total", "30.00"]));
        let out = derive_summary(&t, &PricingPolicy::default());
        // Only VAT and Grand Total are appended, from 30 rather than 60.
        assert_eq!(out.rows.len(), 5);
        assert_eq!(out.rows[3], strings(&["VAT 5%", "1.50"]));
        assert_eq!(out.rows[4], strings(&["Grand Total", "31.50"]));
    }

    #[test]
    fn stated_total_overrides_computed_sum() {
        let mut t = invoice();
        t.rows.push(strings(&["TOTAL", "40.00"]));
        let out = derive_summary(&t, &PricingPolicy::default());
        assert_eq!(out.rows[3], strings(&["VAT 5%", "2.00"]));
        assert_eq!(out.rows[4], strings(&["Grand Total", "42.00"]));
    }

    #[test]
    fn unparseable_stated_total_keeps_sum() {
        let mut t = invoice();
        t.rows.push(strings(&["Total", "see below"]));
        assert_eq!(compute_total(&t, 1), 30.0);
    }

    #[test]
    fn grand_total_only_still_needs_vat() {
        let mut t = invoice();
        t.rows.push(strings(&["Grand Total", "31.50"]));
        let out = derive_summary(&t, &PricingPolicy::default());
        // "Grand Total" sets both the total and grand-total flags.
        assert_eq!(out.rows.len(), 4);
        assert_eq!(out.rows[3][0], "VAT 5%");
    }

    #[test]
    fn unparseable_amounts_contribute_zero() {
        let t = Table::new(
            strings(&["Item", "Amount"]),
            vec![strings(&["Pen", "n/a"]), strings(&["Book", "$1,000.50"]), strings(&["Cap"])],
        );
        assert_eq!(compute_total(&t, 1), 1000.5);
    }

    #[test]
    fn row_is_sized_to_column_count() {
        let t = Table::new(
            strings(&["Item", "Qty", "Price", "Note"]),
            vec![strings(&["Pen", "1", "5", ""])],
        );
        let out = derive_summary(&t, &PricingPolicy::default());
        assert_eq!(out.rows[1], strings(&["Total", "", "5.00", ""]));
    }

    #[test]
    fn custom_policy_labels_and_rate() {
        let policy = PricingPolicy {
            vat_rate: 0.15,
            total_label: "Subtotal".into(),
            ..PricingPolicy::default()
        };
        let out = derive_summary(&invoice(), &policy);
        assert_eq!(out.rows[2], strings(&["Subtotal", "30.00"]));
        assert_eq!(out.rows[3], strings(&["VAT 15%", "4.50"]));
        assert_eq!(out.rows[4], strings(&["Grand Total", "34.50"]));
    }

    #[test]
    fn single_column_value_replaces_label() {
        let t = Table::new(strings(&["Amount"]), vec![strings(&["7"])]);
        let out = derive_summary(&t, &PricingPolicy::default());
        assert_eq!(out.rows[1], strings(&["7.00"]));
    }
}
