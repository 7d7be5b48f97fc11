//! Workflows that read and write records through the store traits.
//!
//! - [`tax_wizard`] - batch income tax over employee contracts
//! - [`billing`] - electric bill creation, posting, payment, and history

pub mod billing;
pub mod tax_wizard;

pub use billing::{
    BillCreated, BillDetails, BillHistoryEntry, BillingService, HistoryQuery, NOT_AVAILABLE,
};
pub use tax_wizard::{
    ContractFailure, ContractTaxUpdate, IncomeTaxWizard, NO_CONTRACTS_MESSAGE, NO_SLAB_MESSAGE,
    WizardOutcome,
};
