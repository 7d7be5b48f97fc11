//! Core data models for the billing and income-tax engine.
//!
//! This module contains all the domain models used throughout the engine.

mod audit;
mod bill;
mod contract;
mod partner;
mod tax_slab;

pub use audit::{AuditStep, AuditWarning};
pub use bill::{Bill, BillId, BillLine, BillState, LineKind, MoveType, NewBill};
pub use contract::{Contract, ContractId, NewContract};
pub use partner::{NewPartner, Partner, PartnerId};
pub use tax_slab::{SlabId, TaxBand, TaxBandSpec, TaxSlab, TaxSlabSpec};
