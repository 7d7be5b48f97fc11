//! Record store interfaces.
//!
//! The engine never owns persistence. Every read and write goes through
//! the typed repository traits defined here, which a host platform
//! implements over its own storage. [`MemoryStore`] is the in-process
//! implementation used by the server binary and the tests.

mod criteria;
mod memory;

pub use criteria::BillCriteria;
pub use memory::MemoryStore;

use rust_decimal::Decimal;

use crate::error::EngineResult;
use crate::models::{
    Bill, BillId, Contract, ContractId, NewContract, NewPartner, Partner, PartnerId, SlabId,
    TaxSlab,
};

/// Storage for tax slabs.
pub trait TaxSlabRepository {
    /// Persists `slab`, assigning its id.
    fn create_slab(&self, slab: TaxSlab) -> EngineResult<TaxSlab>;

    /// Loads a slab by id.
    fn get_slab(&self, id: SlabId) -> EngineResult<TaxSlab>;

    /// Lists all slabs ordered by name.
    fn list_slabs(&self) -> EngineResult<Vec<TaxSlab>>;

    /// Deletes a slab together with its bands.
    fn delete_slab(&self, id: SlabId) -> EngineResult<()>;
}

/// Storage for employee contracts.
pub trait ContractRepository {
    /// Persists a new contract.
    fn create_contract(&self, contract: NewContract) -> EngineResult<Contract>;

    /// Loads a contract by id.
    fn get_contract(&self, id: ContractId) -> EngineResult<Contract>;

    /// Writes the computed monthly income tax onto a contract.
    fn write_income_tax(&self, id: ContractId, amount: Decimal) -> EngineResult<()>;
}

/// Storage for billed customers.
pub trait PartnerRepository {
    /// Persists a new partner.
    fn create_partner(&self, partner: NewPartner) -> EngineResult<Partner>;

    /// Loads a partner by id.
    fn get_partner(&self, id: PartnerId) -> EngineResult<Partner>;

    /// Lists all partners ordered by id.
    fn list_partners(&self) -> EngineResult<Vec<Partner>>;

    /// Records the latest meter reading on a partner.
    fn write_previous_reading(&self, id: PartnerId, reading: Decimal) -> EngineResult<()>;
}

/// Storage for bills.
pub trait BillRepository {
    /// Persists a new bill, assigning its id and sequence name.
    fn create_bill(&self, bill: Bill) -> EngineResult<Bill>;

    /// Loads a bill by id.
    fn get_bill(&self, id: BillId) -> EngineResult<Bill>;

    /// Overwrites a persisted bill.
    fn write_bill(&self, bill: &Bill) -> EngineResult<()>;

    /// Bills matching `criteria`, newest `billing_month` first.
    fn search_bills(&self, criteria: &BillCriteria) -> EngineResult<Vec<Bill>>;

    /// The newest bill matching `criteria`.
    fn find_latest(&self, criteria: &BillCriteria) -> EngineResult<Option<Bill>> {
        Ok(self.search_bills(criteria)?.into_iter().next())
    }
}

/// Everything the engine needs from a host platform.
pub trait RecordStore:
    TaxSlabRepository + ContractRepository + PartnerRepository + BillRepository + Send + Sync
{
}

impl<T> RecordStore for T where
    T: TaxSlabRepository + ContractRepository + PartnerRepository + BillRepository + Send + Sync
{
}
