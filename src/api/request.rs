//! Request types for the billing and income-tax API.
//!
//! Customer, contract, and bill bodies deserialize straight into the
//! `New*` model types; the types here cover the remaining endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::models::{ContractId, SlabId, TaxBand, TaxBandSpec, TaxSlab};

/// Request body for `POST /tax-slabs`.
///
/// Bands arrive unvalidated so that a bad rate or range is reported as a
/// validation error rather than malformed JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaxSlabRequest {
    /// Slab name.
    pub name: String,
    /// Bands in any order.
    #[serde(default)]
    pub bands: Vec<TaxBandSpec>,
}

impl CreateTaxSlabRequest {
    /// Validates every band and builds the slab.
    pub fn into_slab(self) -> EngineResult<TaxSlab> {
        let bands = self
            .bands
            .into_iter()
            .map(TaxBand::try_from)
            .collect::<EngineResult<Vec<_>>>()?;
        TaxSlab::new(self.name, bands)
    }
}

/// Request body for `POST /income-tax/compute`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComputeIncomeTaxRequest {
    /// The slab to apply.
    #[serde(default)]
    pub slab_id: Option<SlabId>,
    /// The contracts to update.
    #[serde(default)]
    pub contract_ids: Vec<ContractId>,
}

/// Request body for `POST /bills/:id/payments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPaymentRequest {
    /// Amount paid.
    pub amount: Decimal,
}

/// Request body for `PUT /bills/:id/reading`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetReadingRequest {
    /// The new closing meter reading.
    pub next_reading_value: Decimal,
}
