//! Utility customer (partner) model.
//!
//! Customers carry the meter they are billed against and the last meter
//! reading recorded for them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Identifier of a persisted partner.
pub type PartnerId = u64;

/// A billed customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    /// Store-assigned id.
    pub id: PartnerId,
    /// Customer display name.
    pub name: String,
    /// Meter the customer is billed against.
    pub meter_id: String,
    /// Utility reference number printed on bills.
    pub reference_no: String,
    /// National identity card number.
    pub cnic: String,
    /// Last meter reading recorded for the customer.
    #[serde(default)]
    pub previous_reading: Decimal,
}

/// Fields needed to create a partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPartner {
    /// Customer display name.
    pub name: String,
    /// Meter the customer is billed against.
    pub meter_id: String,
    /// Utility reference number.
    pub reference_no: String,
    /// National identity card number.
    pub cnic: String,
}

impl NewPartner {
    /// Rejects blank required fields.
    pub fn validate(&self) -> EngineResult<()> {
        let required = [
            ("name", &self.name),
            ("meter_id", &self.meter_id),
            ("reference_no", &self.reference_no),
            ("cnic", &self.cnic),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(EngineError::validation(field, "This field is required"));
            }
        }
        Ok(())
    }
}
