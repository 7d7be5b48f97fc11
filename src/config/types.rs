//! Configuration types for the billing and income-tax engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::calculation::RoundingRule;
use crate::models::TaxSlab;

/// Default mobile number printed for complaints.
pub const DEFAULT_COMPLAINT_MOBILE: &str = "03014630923";

/// Default landline number printed for complaints.
pub const DEFAULT_COMPLAINT_PTCL: &str = "04235759157(EXT 114)";

/// Default label of the consumed-units line.
pub const DEFAULT_PRODUCT_LABEL: &str = "Units";

/// Engine settings from engine.yaml.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Income-tax computation settings.
    #[serde(default)]
    pub income_tax: IncomeTaxSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Socket address to listen on, e.g. "127.0.0.1:8069".
    pub bind: String,
}

/// Income-tax computation settings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct IncomeTaxSettings {
    /// Rounding applied to the monthly withholding.
    #[serde(default)]
    pub rounding: RoundingRule,
}

/// A fixed charge added to every bill.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountLineConfig {
    /// Ledger account code the charge is booked on.
    pub account_code: String,
    /// Label printed on the bill.
    pub label: String,
    /// Charge amount.
    #[serde(default)]
    pub amount: Decimal,
}

/// Billing settings from billing.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BillingSettings {
    /// Label of the consumed-units line.
    #[serde(default = "default_product_label")]
    pub product_label: String,
    /// Price per consumed unit.
    #[serde(default)]
    pub unit_price: Decimal,
    /// Mobile number printed for complaints.
    #[serde(default = "default_complaint_mobile")]
    pub complaint_mobile_number: String,
    /// Landline number printed for complaints.
    #[serde(default = "default_complaint_ptcl")]
    pub complaint_ptcl_number: String,
    /// Fixed charges, in the order they appear on the bill.
    #[serde(default)]
    pub account_lines: Vec<AccountLineConfig>,
}

fn default_product_label() -> String {
    DEFAULT_PRODUCT_LABEL.to_string()
}

fn default_complaint_mobile() -> String {
    DEFAULT_COMPLAINT_MOBILE.to_string()
}

fn default_complaint_ptcl() -> String {
    DEFAULT_COMPLAINT_PTCL.to_string()
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            product_label: default_product_label(),
            unit_price: Decimal::ZERO,
            complaint_mobile_number: default_complaint_mobile(),
            complaint_ptcl_number: default_complaint_ptcl(),
            account_lines: ["700001", "251005", "251006", "251007"]
                .into_iter()
                .map(|code| AccountLineConfig {
                    account_code: code.to_string(),
                    label: format!("Account {}", code),
                    amount: Decimal::ZERO,
                })
                .collect(),
        }
    }
}

/// The complete engine configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    settings: EngineSettings,
    billing: BillingSettings,
    slabs: Vec<TaxSlab>,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(settings: EngineSettings, billing: BillingSettings, slabs: Vec<TaxSlab>) -> Self {
        Self {
            settings,
            billing,
            slabs,
        }
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the billing settings.
    pub fn billing(&self) -> &BillingSettings {
        &self.billing
    }

    /// Returns the seeded tax slabs.
    pub fn slabs(&self) -> &[TaxSlab] {
        &self.slabs
    }

    /// Returns the configured withholding rounding rule.
    pub fn rounding(&self) -> RoundingRule {
        self.settings.income_tax.rounding
    }
}
