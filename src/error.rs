//! Error types for the docquote library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocQuoteError`] — **Fatal**: the caller's request cannot be served at
//!   all (input file unreadable, forced JSON shape that is not JSON, unknown
//!   currency, invalid configuration). Returned as `Err(DocQuoteError)`.
//!
//! * [`RegionError`] — **Non-fatal**: a single region of an OCR response
//!   could not be turned into a table, but other regions are fine. Collected
//!   in [`crate::normalize::Extraction::skipped`] so callers can report them
//!   without losing the tables that did parse.
//!
//! Malformed table markup and unparseable numbers are neither: the parsers
//! return `None` / an empty list and the numeric transforms treat the value
//! as a zero contribution.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docquote library.
#[derive(Debug, Error)]
pub enum DocQuoteError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input file could not be read.
    #[error("Failed to read input '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The caller asked for a JSON response shape but the text is not JSON.
    #[error("Response is not valid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Currency code is not in the preset table.
    #[error("Unknown currency '{code}'\nKnown currencies: {known}")]
    UnknownCurrency { code: String, known: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single response region.
///
/// `region` is the zero-based index of the item inside the response payload.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum RegionError {
    /// The region is typed as a table but neither its HTML nor its cells
    /// produced a table with at least one column.
    #[error("Region {region}: no table could be built from its payload")]
    NoTable { region: usize },

    /// The region's payload had the wrong JSON type for the field it uses.
    #[error("Region {region}: malformed '{field}' payload")]
    Malformed { region: usize, field: String },

    /// An entry of a prompt-extractor `tables` array did not match the table shape.
    #[error("Table entry {region}: {detail}")]
    BadTableEntry { region: usize, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_currency_display() {
        let e = DocQuoteError::UnknownCurrency {
            code: "XYZ".into(),
            known: "USD, EUR".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("XYZ"), "got: {msg}");
        assert!(msg.contains("USD, EUR"), "got: {msg}");
    }

    #[test]
    fn invalid_config_display() {
        let e = DocQuoteError::InvalidConfig("freight must be ≥ 0".into());
        assert!(e.to_string().contains("freight"));
    }

    #[test]
    fn region_error_display() {
        let e = RegionError::Malformed {
            region: 3,
            field: "cells".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Region 3"));
        assert!(msg.contains("cells"));
    }

    #[test]
    fn region_error_serializes() {
        let e = RegionError::NoTable { region: 1 };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("NoTable"), "got: {json}");
    }
}
