//! Quotation assembly and file entry points.
//!
//! ## Pipeline
//!
//! ```text
//! response text ──▶ RawResponse ──▶ Extraction ──▶ per table:
//!     drop blank rows ──▶ derive_summary ──▶ apply_costing ──▶ Quotation
//! ```
//!
//! Everything up to [`Quotation`] is synchronous and pure. Only
//! [`read_input`], [`write_output`] and [`quote_file`] touch the file
//! system, through `tokio::fs`.

use crate::config::{CostingMode, QuoteConfig};
use crate::costing::{apply_costing, markup_amounts, CostingColumns};
use crate::currency::Currency;
use crate::error::{DocQuoteError, RegionError};
use crate::normalize::{Extraction, RawResponse, ResponseFormat};
use crate::summary::derive_summary;
use crate::table::{format_amount, parse_number, Table};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// A priced table ready for rendering or export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    /// The table, including summary rows and the `total` / `vat` /
    /// `grandTotal` scalars.
    #[serde(flatten)]
    pub table: Table,

    /// Currency the amounts are expressed in.
    pub currency: Currency,

    /// Whether the costing transform repriced the rows.
    pub costed: bool,
}

impl Quotation {
    /// Body rows the way spreadsheet and PDF writers lay them out.
    ///
    /// Item rows come first. If any scalar is set, an empty spacer row
    /// follows, then one row per scalar: `columns - 2` empty cells, the
    /// label (`Total:`, `VAT:`, `Grand Total:`) and the value.
    pub fn export_rows(&self) -> Vec<Vec<String>> {
        let t = &self.table;
        let mut rows = t.rows.clone();
        let scalars = [
            ("Total:", &t.total),
            ("VAT:", &t.vat),
            ("Grand Total:", &t.grand_total),
        ];
        if scalars.iter().any(|(_, v)| v.is_some()) {
            rows.push(Vec::new());
        }
        let pad = t.column_count().saturating_sub(2);
        for (label, value) in scalars {
            if let Some(value) = value {
                let mut row = vec![String::new(); pad];
                row.push(label.to_string());
                row.push(value.clone());
                rows.push(row);
            }
        }
        rows
    }

    /// The table as a pipe table. Unnamed columns get `Column N` headers.
    pub fn to_markdown(&self) -> String {
        self.table.with_display_names().to_markdown()
    }

    /// The export layout ([`Quotation::export_rows`]) as a pipe table.
    pub fn export_markdown(&self) -> String {
        let named = self.table.with_display_names();
        Table::new(named.column_names, self.export_rows()).to_markdown()
    }
}

/// Turn one extracted table into a quotation.
///
/// Blank rows are dropped, missing summary rows derived (if enabled) and the
/// costing transform applied (if enabled). The `total` / `vat` /
/// `grandTotal` scalars are then read back from the summary rows.
///
/// In [`CostingMode::Reprice`] a table without a rate column is left
/// uncosted. A table with a rate but no amount column is repriced and then
/// summarised again from [`Table::amount_column`], since repricing alone
/// has no column to write totals into. [`CostingMode::Markup`] scales the
/// amount column of every row, summary rows included, and keeps the source
/// currency.
pub fn build_quotation(table: &Table, config: &QuoteConfig) -> Quotation {
    let mut current = table.without_blank_rows();

    if config.derive_summary {
        current = derive_summary(&current, &config.policy);
    }

    let costing_columns = CostingColumns::locate(&current.column_names);
    let (costed, converted) = match config.costing_mode {
        _ if !config.apply_costing => (false, false),
        CostingMode::Markup => {
            current = markup_amounts(&current, &config.factors, &config.policy);
            (true, false)
        }
        CostingMode::Reprice => match costing_columns {
            Some(cols) => {
                current = apply_costing(
                    &current,
                    &config.factors,
                    &config.policy,
                    &config.source_currency,
                    &config.target_currency,
                );
                if cols.amount.is_none() && config.derive_summary {
                    current = derive_summary(&current, &config.policy);
                }
                (true, true)
            }
            None => (false, false),
        },
    };

    let value_col = match costing_columns.and_then(|c| c.amount) {
        Some(a) if converted => a,
        _ => current.amount_column(),
    };
    fill_scalars(&mut current, value_col);

    let currency = if converted {
        config.target_currency.clone()
    } else {
        config.source_currency.clone()
    };
    debug!(
        "Quotation: {} rows, costed={}, currency={}",
        current.rows.len(),
        costed,
        currency.code
    );

    Quotation {
        table: current,
        currency,
        costed,
    }
}

/// Build one quotation per extracted table.
pub fn build_quotations(extraction: &Extraction, config: &QuoteConfig) -> Vec<Quotation> {
    extraction
        .tables
        .iter()
        .map(|t| build_quotation(t, config))
        .collect()
}

/// Set the export scalars from the last Total / VAT / Grand Total rows.
fn fill_scalars(table: &mut Table, value_col: usize) {
    let value_of = |matches: &dyn Fn(&str) -> bool| {
        table
            .rows
            .iter()
            .rev()
            .find(|row| row.iter().any(|c| matches(&c.to_lowercase())))
            .and_then(|row| row.get(value_col))
            .and_then(|c| parse_number(c))
            .map(format_amount)
    };
    let total = value_of(&|c: &str| c.contains("total") && !c.contains("grand total"));
    let vat = value_of(&|c: &str| c.contains("vat"));
    let grand_total = value_of(&|c: &str| c.contains("grand total"));

    table.total = total;
    table.vat = vat;
    table.grand_total = grand_total;
}

// ── File I/O ─────────────────────────────────────────────────────────────

/// Everything produced from one input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteOutput {
    pub quotations: Vec<Quotation>,
    pub skipped: Vec<RegionError>,
}

/// Read a response body from disk.
pub async fn read_input(path: impl AsRef<Path>) -> Result<String, DocQuoteError> {
    let path = path.as_ref();
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DocQuoteError::InputReadFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Write `contents` to `path` atomically.
///
/// Parent directories are created. The data goes to a sibling `.tmp` file
/// first and is renamed into place, so readers never see a partial file.
pub async fn write_output(path: impl AsRef<Path>, contents: &str) -> Result<(), DocQuoteError> {
    let path = path.as_ref();
    let write_err = |e| DocQuoteError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = match path.extension() {
        Some(ext) => path.with_extension(format!("{}.tmp", ext.to_string_lossy())),
        None => path.with_extension("tmp"),
    };
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_err)?;
    Ok(())
}

/// Read a response file, extract its tables and price each one.
///
/// # Errors
/// Only fatal errors: unreadable input, or a forced JSON `format` whose
/// body is not JSON. A file without tables is `Ok` with no quotations.
pub async fn quote_file(
    path: impl AsRef<Path>,
    format: ResponseFormat,
    config: &QuoteConfig,
) -> Result<QuoteOutput, DocQuoteError> {
    let path = path.as_ref();
    info!("Quoting {}", path.display());

    let body = read_input(path).await?;
    let extraction = RawResponse::parse_as(&body, format)?.extract();
    let quotations = build_quotations(&extraction, config);

    Ok(QuoteOutput {
        quotations,
        skipped: extraction.skipped,
    })
}

/// Synchronous wrapper around [`quote_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn quote_file_sync(
    path: impl AsRef<Path>,
    format: ResponseFormat,
    config: &QuoteConfig,
) -> Result<QuoteOutput, DocQuoteError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocQuoteError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(quote_file(path, format, config))
}
