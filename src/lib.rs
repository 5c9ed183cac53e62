//! # docquote
//!
//! Turn OCR and AI document-extraction responses into clean tables, then
//! into priced quotations.
//!
//! ## Why this crate?
//!
//! Every document-extraction backend answers in its own dialect: markdown
//! pipe tables, HTML fragments, position-addressed cell lists, flat text,
//! or an AI extractor's JSON. Downstream pricing code should not care which
//! backend ran. This crate normalizes all of them into one [`Table`] model
//! and runs the financial derivations (Total / VAT / Grand Total, cost
//! factors, currency conversion) on that model only.
//!
//! The crate never performs network I/O. It consumes already-decoded
//! response bodies.
//!
//! ## Pipeline Overview
//!
//! ```text
//! response body
//!  │
//!  ├─ 1. Detect     markdown | tuple | regions | ai   (normalize::RawResponse)
//!  ├─ 2. Parse      markdown / html / cells / lines  (parse::*)
//!  ├─ 3. Summary    append missing Total, VAT, Grand Total
//!  ├─ 4. Costing    compound factors, convert currency, regenerate totals
//!  └─ 5. Quotation  table + export scalars + currency
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use docquote::{build_quotation, extract_tables, QuoteConfig};
//!
//! let body = "| Item | Amount |\n| --- | --- |\n| Pen | 10.00 |\n| Book | 20.00 |";
//! let extraction = extract_tables(body);
//! let quote = build_quotation(&extraction.tables[0], &QuoteConfig::default());
//! assert_eq!(quote.table.grand_total.as_deref(), Some("31.50"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docquote` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docquote = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod costing;
pub mod currency;
pub mod error;
pub mod normalize;
pub mod parse;
pub mod quote;
pub mod summary;
pub mod table;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    CostFactor, CostingFactors, CostingMode, PricingPolicy, QuoteConfig, QuoteConfigBuilder,
};
pub use costing::{apply_costing, markup_amounts};
pub use currency::Currency;
pub use error::{DocQuoteError, RegionError};
pub use normalize::{extract_tables, normalize_regions, Extraction, RawResponse, ResponseFormat};
pub use parse::TableSource;
pub use quote::{
    build_quotation, build_quotations, quote_file, quote_file_sync, read_input, write_output,
    QuoteOutput, Quotation,
};
pub use summary::derive_summary;
pub use table::Table;
