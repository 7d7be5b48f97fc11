//! Application state for the billing and income-tax API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::calculation::RoundingRule;
use crate::config::ConfigLoader;
use crate::service::BillingService;
use crate::store::RecordStore;

/// Shared application state.
///
/// Holds the record store every handler reads and writes, the billing
/// service configured from billing.yaml, and the withholding rounding rule.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RecordStore>,
    billing: Arc<BillingService>,
    rounding: RoundingRule,
}

impl AppState {
    /// Creates application state over `store`.
    pub fn new(store: Arc<dyn RecordStore>, billing: BillingService, rounding: RoundingRule) -> Self {
        Self {
            store,
            billing: Arc::new(billing),
            rounding,
        }
    }

    /// Creates application state from loaded configuration.
    pub fn from_config(store: Arc<dyn RecordStore>, config: &ConfigLoader) -> Self {
        Self::new(
            store,
            BillingService::new(config.billing().clone()),
            config.rounding(),
        )
    }

    /// Returns the record store.
    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Returns the billing service.
    pub fn billing(&self) -> &BillingService {
        &self.billing
    }

    /// Returns the withholding rounding rule.
    pub fn rounding(&self) -> RoundingRule {
        self.rounding
    }
}
