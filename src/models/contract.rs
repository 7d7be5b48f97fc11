//! Employee contract model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Identifier of a persisted contract.
pub type ContractId = u64;

/// An employee contract carrying the monthly wage and computed withholding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Store-assigned id.
    pub id: ContractId,
    /// Name of the employee the contract belongs to.
    pub employee_name: String,
    /// Gross monthly wage.
    pub wage: Decimal,
    /// Monthly income tax written by the last withholding computation.
    #[serde(default)]
    pub income_tax_amount: Decimal,
}

/// Fields needed to create a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContract {
    /// Name of the employee.
    pub employee_name: String,
    /// Gross monthly wage.
    pub wage: Decimal,
}

impl NewContract {
    /// Checks the fields before the contract is persisted.
    pub fn validate(&self) -> EngineResult<()> {
        if self.employee_name.trim().is_empty() {
            return Err(EngineError::validation(
                "employee_name",
                "Employee name is required",
            ));
        }
        if self.wage < Decimal::ZERO {
            return Err(EngineError::validation("wage", "Wage cannot be negative"));
        }
        Ok(())
    }
}
