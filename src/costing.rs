//! Costing transform: cost factors and currency conversion.
//!
//! [`apply_costing`] reprices every item row from its rate column, converts
//! to the target currency, and regenerates Total / VAT / Grand Total from
//! scratch. Unlike [`crate::summary::derive_summary`], existing summary rows
//! are dropped rather than preserved.
//!
//! [`markup_amounts`] is the lighter quotation view: it scales the amount
//! column of every row by the compounded factors and touches nothing else.

use crate::config::{CostingFactors, PricingPolicy};
use crate::currency::Currency;
use crate::summary::{summary_row, SummaryValues};
use crate::table::{find_column, format_amount, is_summary_row, parse_number, Table};
use tracing::debug;

const QTY_KEYWORDS: [&str; 2] = ["qty", "quantity"];
const RATE_KEYWORDS: [&str; 3] = ["rate", "price", "unit price"];
const TOTAL_KEYWORDS: [&str; 2] = ["amount", "total"];

/// Columns the costing transform reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostingColumns {
    pub qty: Option<usize>,
    pub rate: usize,
    pub amount: Option<usize>,
}

impl CostingColumns {
    /// Locate the columns by name. `None` when there is no rate column.
    pub fn locate(column_names: &[String]) -> Option<Self> {
        Some(Self {
            qty: find_column(column_names, &QTY_KEYWORDS),
            rate: find_column(column_names, &RATE_KEYWORDS)?,
            amount: find_column(column_names, &TOTAL_KEYWORDS),
        })
    }
}

/// Reprice a table and regenerate its summary rows.
///
/// Each item row's rate is compounded with `factors` in the policy's order,
/// converted from `source` to `target`, and written back with two decimals.
/// With a quantity column the line total `qty × rate` goes to the amount
/// column. Rows whose rate (or quantity) does not parse are kept unchanged
/// and add nothing to the subtotal.
///
/// Returns a copy of `table` when it has no rate column. Summary rows are
/// appended only when an amount column exists.
pub fn apply_costing(
    table: &Table,
    factors: &CostingFactors,
    policy: &PricingPolicy,
    source: &Currency,
    target: &Currency,
) -> Table {
    let Some(cols) = CostingColumns::locate(&table.column_names) else {
        debug!("No rate column, costing skipped");
        return table.clone();
    };
    let exchange_rate = source.conversion_to(target);

    let mut subtotal = 0.0;
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(table.rows.len() + 3);

    for row in table.rows.iter().filter(|row| !is_summary_row(row)) {
        let mut row = row.clone();
        let Some(rate) = row.get(cols.rate).and_then(|c| parse_number(c)) else {
            rows.push(row);
            continue;
        };

        let exchanged = factors.apply(rate, policy) * exchange_rate;
        row[cols.rate] = format_amount(exchanged);

        let item_total = match cols.qty {
            Some(q) => match row.get(q).and_then(|c| parse_number(c)) {
                Some(qty) => {
                    let line = qty * exchanged;
                    if let Some(a) = cols.amount {
                        set_cell(&mut row, a, format_amount(line));
                    }
                    line
                }
                None => 0.0,
            },
            None => exchanged,
        };
        subtotal += item_total;
        rows.push(row);
    }

    if let Some(a) = cols.amount {
        let values = SummaryValues::from_total(subtotal, policy);
        let width = table.column_count();
        rows.push(summary_row(width, a, policy.total_label.clone(), values.total));
        rows.push(summary_row(width, a, policy.vat_label(), values.vat));
        rows.push(summary_row(
            width,
            a,
            policy.grand_total_label.clone(),
            values.grand_total,
        ));
    } else {
        debug!("No amount column, summary rows not regenerated");
    }

    debug!(
        "Costed {} rows at exchange rate {} {}→{}, subtotal {}",
        rows.len(),
        exchange_rate,
        source.code,
        target.code,
        format_amount(subtotal)
    );

    Table {
        rows,
        ..table.clone()
    }
}

/// Scale the amount column of every row by the compounded factors.
///
/// The amount column is chosen with [`Table::amount_column`]. Cells that do
/// not parse are left as they are. No rows are added or removed.
pub fn markup_amounts(table: &Table, factors: &CostingFactors, policy: &PricingPolicy) -> Table {
    let col = table.amount_column();
    let mut out = table.clone();
    for row in &mut out.rows {
        if let Some(cell) = row.get_mut(col) {
            if let Some(amount) = parse_number(cell) {
                *cell = format_amount(factors.apply(amount, policy));
            }
        }
    }
    out
}

fn set_cell(row: &mut Vec<String>, col: usize, value: String) {
    if row.len() <= col {
        row.resize(col + 1, String::new());
    }
    row[col] = value;
}
