//! Configuration types for summary derivation and quotation pricing.
//!
//! Pricing policy (VAT rate, compounding order, summary labels) lives in
//! [`PricingPolicy`] instead of inline literals so that a deployment with a
//! different VAT regime only swaps a value. The defaults reproduce the
//! numbers every existing quotation was produced with: 5 % VAT and
//! margin → freight → customs → installation compounding.
//!
//! A full run is described by [`QuoteConfig`], built via its
//! [`QuoteConfigBuilder`].

use crate::currency::Currency;
use crate::error::DocQuoteError;
use serde::{Deserialize, Serialize};

/// One of the four percentage adjustments applied to a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostFactor {
    NetMargin,
    Freight,
    Customs,
    Installation,
}

impl CostFactor {
    pub const ALL: [CostFactor; 4] = [
        CostFactor::NetMargin,
        CostFactor::Freight,
        CostFactor::Customs,
        CostFactor::Installation,
    ];
}

/// Percent adjustments compounded onto each rate. All default to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostingFactors {
    pub net_margin: f64,
    pub freight: f64,
    pub customs: f64,
    pub installation: f64,
}

impl CostingFactors {
    pub fn new(net_margin: f64, freight: f64, customs: f64, installation: f64) -> Self {
        Self {
            net_margin,
            freight,
            customs,
            installation,
        }
    }

    pub fn get(&self, factor: CostFactor) -> f64 {
        match factor {
            CostFactor::NetMargin => self.net_margin,
            CostFactor::Freight => self.freight,
            CostFactor::Customs => self.customs,
            CostFactor::Installation => self.installation,
        }
    }

    /// True when every factor is zero.
    pub fn is_zero(&self) -> bool {
        CostFactor::ALL.iter().all(|f| self.get(*f) == 0.0)
    }

    /// Compound the factors onto `value` in the policy's order.
    ///
    /// Multiplies step by step (`value × (1+a) × (1+b) …`) so the floating
    /// point result is identical to the historical left-to-right product.
    pub fn apply(&self, value: f64, policy: &PricingPolicy) -> f64 {
        policy
            .factor_order
            .iter()
            .fold(value, |acc, f| acc * (1.0 + self.get(*f) / 100.0))
    }
}

/// Policy constants for summary rows and pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// VAT as a fraction of the total. Default: 0.05.
    pub vat_rate: f64,

    /// Order in which cost factors compound. Default: margin, freight,
    /// customs, installation.
    pub factor_order: [CostFactor; 4],

    /// Label of the appended total row. Must contain `total` (any case).
    /// Default: `Total`.
    pub total_label: String,

    /// Label of the appended grand-total row. Must contain `grand total`
    /// (any case). Default: `Grand Total`.
    pub grand_total_label: String,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            vat_rate: 0.05,
            factor_order: CostFactor::ALL,
            total_label: "Total".to_string(),
            grand_total_label: "Grand Total".to_string(),
        }
    }
}

impl PricingPolicy {
    /// Label of the VAT row, e.g. `VAT 5%`.
    pub fn vat_label(&self) -> String {
        let pct = format!("{:.4}", self.vat_rate * 100.0);
        let pct = pct.trim_end_matches('0').trim_end_matches('.');
        format!("VAT {pct}%")
    }

    fn validate(&self) -> Result<(), DocQuoteError> {
        if !self.vat_rate.is_finite() || self.vat_rate < 0.0 {
            return Err(DocQuoteError::InvalidConfig(format!(
                "VAT rate must be a non-negative number, got {}",
                self.vat_rate
            )));
        }
        // Summary presence is detected by substring, so the appended labels
        // must be recognised on the next pass.
        if !self.total_label.to_lowercase().contains("total") {
            return Err(DocQuoteError::InvalidConfig(format!(
                "total label must contain 'total', got '{}'",
                self.total_label
            )));
        }
        if !self.grand_total_label.to_lowercase().contains("grand total") {
            return Err(DocQuoteError::InvalidConfig(format!(
                "grand total label must contain 'grand total', got '{}'",
                self.grand_total_label
            )));
        }
        for f in CostFactor::ALL {
            if !self.factor_order.contains(&f) {
                return Err(DocQuoteError::InvalidConfig(format!(
                    "factor order must list every cost factor once, {f:?} is missing"
                )));
            }
        }
        Ok(())
    }
}

/// How the costing step prices a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CostingMode {
    /// Reprice rates, convert currency, regenerate totals.
    /// See [`crate::costing::apply_costing`]. (default)
    #[default]
    Reprice,
    /// Scale the amount column of every row by the factors, no currency
    /// conversion. See [`crate::costing::markup_amounts`].
    Markup,
}

/// Configuration for turning an extracted table into a quotation.
///
/// # Example
/// ```rust
/// use docquote::{CostingFactors, Currency, QuoteConfig};
///
/// let config = QuoteConfig::builder()
///     .factors(CostingFactors::new(10.0, 5.0, 2.0, 3.0))
///     .target_currency(Currency::lookup("AED").unwrap())
///     .build()
///     .unwrap();
/// assert!(config.apply_costing);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// VAT rate, compounding order and labels.
    pub policy: PricingPolicy,

    /// Cost adjustments. Default: all zero.
    pub factors: CostingFactors,

    /// Currency the document is priced in. Default: USD.
    pub source_currency: Currency,

    /// Currency the quotation is priced in. Default: USD.
    pub target_currency: Currency,

    /// Append missing Total / VAT / Grand Total rows. Default: true.
    pub derive_summary: bool,

    /// Run the costing transform. Default: false; the builder turns it on
    /// when factors or a target currency are set.
    pub apply_costing: bool,

    /// Which costing transform runs. Default: [`CostingMode::Reprice`].
    #[serde(default)]
    pub costing_mode: CostingMode,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            policy: PricingPolicy::default(),
            factors: CostingFactors::default(),
            source_currency: Currency::base(),
            target_currency: Currency::base(),
            derive_summary: true,
            apply_costing: false,
            costing_mode: CostingMode::Reprice,
        }
    }
}

impl QuoteConfig {
    /// Create a new builder for `QuoteConfig`.
    pub fn builder() -> QuoteConfigBuilder {
        QuoteConfigBuilder {
            config: Self::default(),
            costing_explicit: false,
        }
    }

    /// Multiplier from the source to the target currency.
    pub fn exchange_rate(&self) -> f64 {
        self.source_currency.conversion_to(&self.target_currency)
    }
}

/// Builder for [`QuoteConfig`].
#[derive(Debug)]
pub struct QuoteConfigBuilder {
    config: QuoteConfig,
    costing_explicit: bool,
}

impl QuoteConfigBuilder {
    pub fn policy(mut self, policy: PricingPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// VAT as a percent (5 → 5 %).
    pub fn vat_percent(mut self, pct: f64) -> Self {
        self.config.policy.vat_rate = pct / 100.0;
        self
    }

    pub fn factors(mut self, factors: CostingFactors) -> Self {
        self.config.factors = factors;
        self
    }

    pub fn source_currency(mut self, currency: Currency) -> Self {
        self.config.source_currency = currency;
        self
    }

    pub fn target_currency(mut self, currency: Currency) -> Self {
        self.config.target_currency = currency;
        self
    }

    pub fn derive_summary(mut self, v: bool) -> Self {
        self.config.derive_summary = v;
        self
    }

    pub fn costing_mode(mut self, mode: CostingMode) -> Self {
        self.config.costing_mode = mode;
        self
    }

    /// Force costing on or off regardless of factors and currencies.
    pub fn apply_costing(mut self, v: bool) -> Self {
        self.config.apply_costing = v;
        self.costing_explicit = true;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<QuoteConfig, DocQuoteError> {
        let c = &self.config;
        c.policy.validate()?;
        for f in CostFactor::ALL {
            let v = c.factors.get(f);
            if !v.is_finite() || v < 0.0 {
                return Err(DocQuoteError::InvalidConfig(format!(
                    "{f:?} must be a non-negative percent, got {v}"
                )));
            }
        }
        for cur in [&c.source_currency, &c.target_currency] {
            if !cur.rate.is_finite() || cur.rate <= 0.0 {
                return Err(DocQuoteError::InvalidConfig(format!(
                    "currency {} must have a positive rate, got {}",
                    cur.code, cur.rate
                )));
            }
        }
        if !self.costing_explicit {
            self.config.apply_costing = !self.config.factors.is_zero()
                || self.config.source_currency != self.config.target_currency;
        }
        Ok(self.config)
    }
}
