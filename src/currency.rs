//! Currencies and conversion between them.
//!
//! Rates are multipliers against a single base currency (USD = 1.0), so the
//! factor from `source` to `target` is `target.rate / source.rate` and no
//! pairwise table is needed.

use crate::error::DocQuoteError;
use serde::{Deserialize, Serialize};

/// A currency with its rate against the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 code, upper-case.
    pub code: String,
    /// Units of this currency per one unit of the base currency.
    pub rate: f64,
    /// Display symbol.
    pub symbol: String,
}

impl Currency {
    pub fn new(code: impl Into<String>, rate: f64, symbol: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            rate,
            symbol: symbol.into(),
        }
    }

    /// The base currency (rate 1.0).
    pub fn base() -> Self {
        Self::new("USD", 1.0, "$")
    }

    /// Look up a preset by code, case-insensitively.
    pub fn lookup(code: &str) -> Result<Self, DocQuoteError> {
        let wanted = code.trim().to_uppercase();
        PRESETS
            .iter()
            .find(|(c, _, _)| *c == wanted)
            .map(|(c, rate, symbol)| Self::new(*c, *rate, *symbol))
            .ok_or_else(|| DocQuoteError::UnknownCurrency {
                code: code.to_string(),
                known: PRESETS
                    .iter()
                    .map(|(c, _, _)| *c)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Multiplier converting an amount in `self` into `target`.
    pub fn conversion_to(&self, target: &Currency) -> f64 {
        target.rate / self.rate
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::base()
    }
}

// code, rate vs USD, symbol
const PRESETS: &[(&str, f64, &str)] = &[
    ("USD", 1.0, "$"),
    ("AED", 3.6725, "AED"),
    ("SAR", 3.75, "SAR"),
    ("EUR", 0.92, "€"),
    ("GBP", 0.79, "£"),
    ("INR", 83.0, "₹"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let aed = Currency::lookup("aed").unwrap();
        assert_eq!(aed.code, "AED");
        assert_eq!(aed.rate, 3.6725);
    }

    #[test]
    fn lookup_unknown_lists_known_codes() {
        let err = Currency::lookup("XYZ").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("XYZ"));
        assert!(msg.contains("USD"));
    }

    #[test]
    fn conversion_is_target_over_source() {
        let usd = Currency::base();
        let aed = Currency::lookup("AED").unwrap();
        assert_eq!(usd.conversion_to(&aed), 3.6725);
        assert_eq!(aed.conversion_to(&aed), 1.0);

        let sar = Currency::lookup("SAR").unwrap();
        assert!((aed.conversion_to(&sar) - 3.75 / 3.6725).abs() < 1e-12);
    }
}
