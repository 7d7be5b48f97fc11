//! In-memory record store.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Datelike, Local};
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Bill, BillId, Contract, ContractId, NewContract, NewPartner, Partner, PartnerId, SlabId,
    TaxSlab,
};

use super::criteria::newest_first;
use super::{BillCriteria, BillRepository, ContractRepository, PartnerRepository, TaxSlabRepository};

/// A [`super::RecordStore`] kept entirely in process memory.
///
/// Each table hands out ids starting at 1; ids of deleted records are
/// never handed out again. Bill names follow a per-year sequence,
/// `BILL/{year}/{seq:05}`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    slabs: BTreeMap<SlabId, TaxSlab>,
    contracts: BTreeMap<ContractId, Contract>,
    partners: BTreeMap<PartnerId, Partner>,
    bills: BTreeMap<BillId, Bill>,
    bill_sequences: HashMap<i32, u32>,
    slab_ids: IdSequence,
    contract_ids: IdSequence,
    partner_ids: IdSequence,
    bill_ids: IdSequence,
}

/// Monotonic id counter for one table.
#[derive(Debug, Default)]
struct IdSequence {
    last: u64,
}

impl IdSequence {
    fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persists every slab in `slabs`, returning them with their ids.
    pub fn seed_slabs(&self, slabs: impl IntoIterator<Item = TaxSlab>) -> EngineResult<Vec<TaxSlab>> {
        slabs.into_iter().map(|slab| self.create_slab(slab)).collect()
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| EngineError::Store {
            message: "record store lock poisoned".to_string(),
        })
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| EngineError::Store {
            message: "record store lock poisoned".to_string(),
        })
    }
}

impl TaxSlabRepository for MemoryStore {
    fn create_slab(&self, mut slab: TaxSlab) -> EngineResult<TaxSlab> {
        let mut tables = self.write()?;
        slab.id = tables.slab_ids.next();
        tables.slabs.insert(slab.id, slab.clone());
        Ok(slab)
    }

    fn get_slab(&self, id: SlabId) -> EngineResult<TaxSlab> {
        self.read()?
            .slabs
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("tax_slab", id))
    }

    fn list_slabs(&self) -> EngineResult<Vec<TaxSlab>> {
        let mut slabs: Vec<TaxSlab> = self.read()?.slabs.values().cloned().collect();
        slabs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(slabs)
    }

    fn delete_slab(&self, id: SlabId) -> EngineResult<()> {
        self.write()?
            .slabs
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| EngineError::not_found("tax_slab", id))
    }
}

impl ContractRepository for MemoryStore {
    fn create_contract(&self, contract: NewContract) -> EngineResult<Contract> {
        contract.validate()?;
        let mut tables = self.write()?;
        let contract = Contract {
            id: tables.contract_ids.next(),
            employee_name: contract.employee_name,
            wage: contract.wage,
            income_tax_amount: Decimal::ZERO,
        };
        tables.contracts.insert(contract.id, contract.clone());
        Ok(contract)
    }

    fn get_contract(&self, id: ContractId) -> EngineResult<Contract> {
        self.read()?
            .contracts
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("contract", id))
    }

    fn write_income_tax(&self, id: ContractId, amount: Decimal) -> EngineResult<()> {
        let mut tables = self.write()?;
        let contract = tables
            .contracts
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found("contract", id))?;
        contract.income_tax_amount = amount;
        Ok(())
    }
}

impl PartnerRepository for MemoryStore {
    fn create_partner(&self, partner: NewPartner) -> EngineResult<Partner> {
        partner.validate()?;
        let mut tables = self.write()?;
        let partner = Partner {
            id: tables.partner_ids.next(),
            name: partner.name,
            meter_id: partner.meter_id,
            reference_no: partner.reference_no,
            cnic: partner.cnic,
            previous_reading: Decimal::ZERO,
        };
        tables.partners.insert(partner.id, partner.clone());
        Ok(partner)
    }

    fn get_partner(&self, id: PartnerId) -> EngineResult<Partner> {
        self.read()?
            .partners
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("partner", id))
    }

    fn list_partners(&self) -> EngineResult<Vec<Partner>> {
        Ok(self.read()?.partners.values().cloned().collect())
    }

    fn write_previous_reading(&self, id: PartnerId, reading: Decimal) -> EngineResult<()> {
        let mut tables = self.write()?;
        let partner = tables
            .partners
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found("partner", id))?;
        partner.previous_reading = reading;
        Ok(())
    }
}

impl BillRepository for MemoryStore {
    fn create_bill(&self, mut bill: Bill) -> EngineResult<Bill> {
        let mut tables = self.write()?;

        let year = bill
            .billing_month
            .or(bill.issue_date)
            .unwrap_or_else(|| Local::now().date_naive())
            .year();
        let sequence = tables.bill_sequences.entry(year).or_insert(0);
        *sequence += 1;
        bill.name = format!("BILL/{}/{:05}", year, sequence);

        bill.id = tables.bill_ids.next();
        tables.bills.insert(bill.id, bill.clone());
        Ok(bill)
    }

    fn get_bill(&self, id: BillId) -> EngineResult<Bill> {
        self.read()?
            .bills
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("bill", id))
    }

    fn write_bill(&self, bill: &Bill) -> EngineResult<()> {
        let mut tables = self.write()?;
        let stored = tables
            .bills
            .get_mut(&bill.id)
            .ok_or_else(|| EngineError::not_found("bill", bill.id))?;
        *stored = bill.clone();
        Ok(())
    }

    fn search_bills(&self, criteria: &BillCriteria) -> EngineResult<Vec<Bill>> {
        let mut bills: Vec<Bill> = self
            .read()?
            .bills
            .values()
            .filter(|bill| criteria.matches(bill))
            .cloned()
            .collect();
        bills.sort_by(newest_first);
        Ok(bills)
    }
}
