//! Batch income-tax computation over employee contracts.
//!
//! The wizard applies one tax slab to a selection of contracts and writes
//! the monthly withholding back onto each of them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calculation::{RoundingRule, calculate_income_tax};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, AuditWarning, ContractId, SlabId};
use crate::store::{ContractRepository, TaxSlabRepository};

/// Shown when no slab was chosen.
pub const NO_SLAB_MESSAGE: &str = "Please select a tax slab.";

/// Shown when no contracts were chosen.
pub const NO_CONTRACTS_MESSAGE: &str = "No contracts selected to compute income tax.";

/// A request to compute income tax for a set of contracts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomeTaxWizard {
    /// The slab to apply.
    pub slab_id: Option<SlabId>,
    /// The contracts to update.
    pub contract_ids: Vec<ContractId>,
    /// Rounding applied to each monthly amount.
    pub rounding: RoundingRule,
}

/// The withholding written onto one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTaxUpdate {
    /// The updated contract.
    pub contract_id: ContractId,
    /// The employee on the contract.
    pub employee_name: String,
    /// Monthly wage the tax was computed from.
    pub wage: Decimal,
    /// Monthly income tax written onto the contract.
    pub income_tax_amount: Decimal,
    /// How the amount was reached.
    pub audit_step: AuditStep,
    /// Conditions worth an operator's attention.
    pub warnings: Vec<AuditWarning>,
}

/// A contract the wizard could not update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractFailure {
    /// The contract that failed.
    pub contract_id: ContractId,
    /// Why it failed.
    pub message: String,
}

/// The result of confirming the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardOutcome {
    /// The applied slab.
    pub slab_id: SlabId,
    /// Name of the applied slab.
    pub slab_name: String,
    /// Contracts whose withholding was written.
    pub updated: Vec<ContractTaxUpdate>,
    /// Contracts left untouched because of an error.
    pub failures: Vec<ContractFailure>,
}

impl IncomeTaxWizard {
    /// Creates a wizard with the default rounding rule.
    pub fn new(slab_id: Option<SlabId>, contract_ids: Vec<ContractId>) -> Self {
        Self {
            slab_id,
            contract_ids,
            rounding: RoundingRule::default(),
        }
    }

    /// Sets the rounding rule.
    pub fn with_rounding(mut self, rounding: RoundingRule) -> Self {
        self.rounding = rounding;
        self
    }

    /// Computes and writes the monthly income tax of every selected contract.
    ///
    /// Each contract is loaded, computed, and written on its own; a failure
    /// is recorded in [`WizardOutcome::failures`] and the remaining
    /// contracts are still processed. Earlier writes are never undone.
    ///
    /// # Errors
    ///
    /// * `UserError` if no slab or no contract was selected; nothing is written
    /// * `RecordNotFound` if the slab does not exist
    pub fn confirm<S>(&self, store: &S) -> EngineResult<WizardOutcome>
    where
        S: TaxSlabRepository + ContractRepository + ?Sized,
    {
        let slab_id = self.slab_id.ok_or_else(|| EngineError::user(NO_SLAB_MESSAGE))?;
        if self.contract_ids.is_empty() {
            return Err(EngineError::user(NO_CONTRACTS_MESSAGE));
        }

        let slab = store.get_slab(slab_id)?;
        info!(
            slab_id,
            slab = %slab.name,
            contracts = self.contract_ids.len(),
            "Computing income tax"
        );

        let mut updated = Vec::new();
        let mut failures = Vec::new();

        for (index, &contract_id) in self.contract_ids.iter().enumerate() {
            let step_number = index as u32 + 1;
            let result = store.get_contract(contract_id).and_then(|contract| {
                let tax = calculate_income_tax(contract.wage, &slab, self.rounding, step_number)?;
                store.write_income_tax(contract.id, tax.monthly_tax)?;
                Ok(ContractTaxUpdate {
                    contract_id: contract.id,
                    employee_name: contract.employee_name,
                    wage: contract.wage,
                    income_tax_amount: tax.monthly_tax,
                    audit_step: tax.audit_step,
                    warnings: tax.warnings,
                })
            });

            match result {
                Ok(update) => updated.push(update),
                Err(err) => {
                    warn!(contract_id, error = %err, "Income tax not written for contract");
                    failures.push(ContractFailure {
                        contract_id,
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            slab_id,
            updated = updated.len(),
            failed = failures.len(),
            "Income tax computation finished"
        );

        Ok(WizardOutcome {
            slab_id,
            slab_name: slab.name,
            updated,
            failures,
        })
    }
}
