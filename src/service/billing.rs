//! Electric bill workflow: creation, posting, payment, and history.

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calculation::{apply_readings, consumed_units, previous_reading_for};
use crate::config::BillingSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{Bill, BillId, BillLine, BillState, LineKind, MoveType, NewBill};
use crate::store::{BillCriteria, BillRepository, PartnerRepository};

/// Shown in history and details for unset dates and unknown customers.
pub const NOT_AVAILABLE: &str = "N/A";

/// Format accepted for history date filters.
pub const HISTORY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Most signatories a bill can print.
pub const MAX_SIGNATORIES: usize = 3;

/// Returned after a bill is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillCreated {
    /// Sequence name of the new bill.
    pub bill_name: String,
    /// The billed customer.
    pub partner_name: String,
    /// The billed meter.
    pub meter_id: String,
    /// The persisted bill.
    pub bill: Bill,
}

/// Filters for [`BillingService::bill_history`], as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryQuery {
    /// Meter to list bills for.
    #[serde(default)]
    pub meter_id: Option<String>,
    /// Earliest billing month, `YYYY-MM-DD`.
    #[serde(default)]
    pub from_date: Option<String>,
    /// Latest billing month, `YYYY-MM-DD`.
    #[serde(default)]
    pub to_date: Option<String>,
}

/// One row of a meter's bill history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillHistoryEntry {
    /// Bill id.
    pub id: BillId,
    /// Sequence name.
    pub name: String,
    /// Posting date, or "N/A".
    pub invoice_date: String,
    /// Covered month, or "N/A".
    pub billing_month: String,
    /// Billed meter.
    pub meter_id: String,
    /// Billed customer, or "N/A".
    pub customer_name: String,
    /// Bill total.
    pub total_bill_amount: Decimal,
    /// Lifecycle state name.
    pub state: String,
    /// True once nothing is owed.
    pub paid: bool,
}

/// A bill with the figures printed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillDetails {
    /// Name of the billed customer.
    pub customer_name: String,
    /// Units billed on the product line.
    pub consumed_units: Decimal,
    /// True once nothing is owed.
    pub paid: bool,
    /// The bill itself.
    pub bill: Bill,
}

/// Creates and maintains electric bills against a record store.
#[derive(Debug, Clone)]
pub struct BillingService {
    settings: BillingSettings,
}

impl BillingService {
    /// Creates a service that lays out bills with `settings`.
    pub fn new(settings: BillingSettings) -> Self {
        Self { settings }
    }

    /// Returns the billing settings.
    pub fn settings(&self) -> &BillingSettings {
        &self.settings
    }

    /// Creates a draft bill for a customer from its next meter reading.
    ///
    /// The bill gets one product line with the reading, followed by the
    /// configured account lines. The opening reading is taken from the
    /// customer's last posted bill, and the new reading is recorded on the
    /// customer.
    ///
    /// # Errors
    ///
    /// * `RecordNotFound` if the partner does not exist
    /// * `Validation` for a negative reading, a reading below the opening
    ///   reading, or more than three signatories
    pub fn create_bill<S>(&self, store: &S, new_bill: NewBill) -> EngineResult<BillCreated>
    where
        S: PartnerRepository + BillRepository + ?Sized,
    {
        let partner = store.get_partner(new_bill.partner_id)?;

        if new_bill.next_reading_value.is_sign_negative() {
            return Err(EngineError::validation(
                "next_reading_value",
                format!(
                    "Meter reading cannot be negative, got {}",
                    new_bill.next_reading_value
                ),
            ));
        }
        if new_bill.signatory_names.len() > MAX_SIGNATORIES {
            return Err(EngineError::validation(
                "signatory_names",
                format!("At most {} signatories can be printed", MAX_SIGNATORIES),
            ));
        }

        let mut lines = Vec::with_capacity(self.settings.account_lines.len() + 1);
        lines.push(BillLine::product(
            self.settings.product_label.clone(),
            new_bill.next_reading_value,
            self.settings.unit_price,
        ));
        lines.extend(
            self.settings
                .account_lines
                .iter()
                .map(|line| BillLine::account(&line.label, &line.account_code, line.amount)),
        );

        let mut bill = Bill {
            id: 0,
            name: String::new(),
            partner_id: partner.id,
            meter_id: partner.meter_id.clone(),
            reference_no: partner.reference_no.clone(),
            move_type: MoveType::OutInvoice,
            is_bill: true,
            state: BillState::Draft,
            invoice_date: None,
            billing_month: new_bill.billing_month,
            reading_date: new_bill.reading_date,
            issue_date: new_bill.issue_date,
            due_date: new_bill.due_date,
            mf_value: new_bill.mf_value.unwrap_or(Decimal::ONE),
            previous_reading_unit: Decimal::ZERO,
            late_payment_surcharge: new_bill.late_payment_surcharge.unwrap_or(Decimal::ZERO),
            bill_notes: new_bill.bill_notes,
            signatory_names: new_bill.signatory_names,
            complaint_mobile_number: self.settings.complaint_mobile_number.clone(),
            complaint_ptcl_number: self.settings.complaint_ptcl_number.clone(),
            lines,
            amount_total: Decimal::ZERO,
            amount_residual: Decimal::ZERO,
        };

        let previous = previous_reading_for(store, &bill, today())?;
        ensure_reading_not_below(previous, new_bill.next_reading_value)?;
        set_opening_reading(&mut bill, previous);
        apply_readings(&mut bill)?;

        let bill = store.create_bill(bill)?;
        store.write_previous_reading(partner.id, new_bill.next_reading_value)?;

        info!(
            bill = %bill.name,
            partner = %partner.name,
            meter_id = %bill.meter_id,
            previous_reading = %previous,
            next_reading = %new_bill.next_reading_value,
            amount_total = %bill.amount_total,
            "Bill created"
        );

        Ok(BillCreated {
            bill_name: bill.name.clone(),
            partner_name: partner.name,
            meter_id: bill.meter_id.clone(),
            bill,
        })
    }

    /// Posts a draft bill, making its readings count for the next bill.
    ///
    /// The invoice date is the issue date, or today when unset.
    pub fn post_bill<S>(&self, store: &S, id: BillId) -> EngineResult<Bill>
    where
        S: BillRepository + ?Sized,
    {
        let mut bill = store.get_bill(id)?;
        if bill.state != BillState::Draft {
            return Err(EngineError::user(format!(
                "Only draft bills can be posted; {} is {}.",
                bill.name,
                bill.state.as_str()
            )));
        }

        bill.state = BillState::Posted;
        bill.invoice_date = Some(bill.issue_date.unwrap_or_else(today));
        store.write_bill(&bill)?;

        info!(bill = %bill.name, amount_total = %bill.amount_total, "Bill posted");
        Ok(bill)
    }

    /// Registers a payment against a posted bill.
    ///
    /// # Errors
    ///
    /// * `UserError` if the bill is not posted or already paid
    /// * `Validation` if `amount` is not positive
    pub fn register_payment<S>(&self, store: &S, id: BillId, amount: Decimal) -> EngineResult<Bill>
    where
        S: BillRepository + ?Sized,
    {
        if amount <= Decimal::ZERO {
            return Err(EngineError::validation(
                "amount",
                format!("Payment amount must be positive, got {}", amount),
            ));
        }

        let mut bill = store.get_bill(id)?;
        if bill.state != BillState::Posted {
            return Err(EngineError::user(format!(
                "Payments can only be registered on posted bills; {} is {}.",
                bill.name,
                bill.state.as_str()
            )));
        }
        if bill.is_paid() {
            return Err(EngineError::user(format!("{} is already paid.", bill.name)));
        }

        bill.amount_residual = (bill.amount_residual - amount).max(Decimal::ZERO);
        store.write_bill(&bill)?;

        info!(
            bill = %bill.name,
            amount = %amount,
            amount_residual = %bill.amount_residual,
            "Payment registered"
        );
        Ok(bill)
    }

    /// Replaces the next reading of a draft bill and records it on the customer.
    pub fn set_next_reading<S>(&self, store: &S, id: BillId, value: Decimal) -> EngineResult<Bill>
    where
        S: PartnerRepository + BillRepository + ?Sized,
    {
        let mut bill = store.get_bill(id)?;
        if bill.state != BillState::Draft {
            return Err(EngineError::user(format!(
                "Readings can only be changed on draft bills; {} is {}.",
                bill.name,
                bill.state.as_str()
            )));
        }

        let line = bill
            .lines
            .iter_mut()
            .find(|line| line.kind == LineKind::Product)
            .ok_or_else(|| EngineError::user(format!("{} has no units line.", bill.name)))?;
        ensure_reading_not_below(line.previous_reading_unit, value)?;
        line.next_reading_unit = value;

        apply_readings(&mut bill)?;
        store.write_bill(&bill)?;
        store.write_previous_reading(bill.partner_id, value)?;

        info!(bill = %bill.name, next_reading = %value, "Next reading updated");
        Ok(bill)
    }

    /// Lists a meter's bills, newest billing month first.
    ///
    /// Date filters that do not parse as `YYYY-MM-DD` are ignored.
    pub fn bill_history<S>(&self, store: &S, query: &HistoryQuery) -> EngineResult<Vec<BillHistoryEntry>>
    where
        S: PartnerRepository + BillRepository + ?Sized,
    {
        let meter_id = query
            .meter_id
            .as_deref()
            .map(str::trim)
            .filter(|meter| !meter.is_empty())
            .ok_or_else(|| EngineError::user("Meter ID is required."))?;

        let criteria = BillCriteria {
            meter_id: Some(meter_id.to_string()),
            billing_month_from: parse_filter_date("from_date", query.from_date.as_deref()),
            billing_month_to: parse_filter_date("to_date", query.to_date.as_deref()),
            is_bill: Some(true),
            ..BillCriteria::default()
        };

        let bills = store.search_bills(&criteria)?;
        let entries = bills
            .into_iter()
            .map(|bill| BillHistoryEntry {
                id: bill.id,
                customer_name: customer_name(store, &bill),
                invoice_date: display_date(bill.invoice_date),
                billing_month: display_date(bill.billing_month),
                meter_id: bill.meter_id.clone(),
                total_bill_amount: bill.amount_total,
                state: bill.state.as_str().to_string(),
                paid: bill.is_paid(),
                name: bill.name,
            })
            .collect::<Vec<_>>();

        info!(meter_id, bills = entries.len(), "Bill history listed");
        Ok(entries)
    }

    /// Loads a bill together with its printed figures.
    pub fn bill_details<S>(&self, store: &S, id: BillId) -> EngineResult<BillDetails>
    where
        S: PartnerRepository + BillRepository + ?Sized,
    {
        let bill = store.get_bill(id)?;
        let consumed = bill
            .lines
            .iter()
            .find(|line| line.kind == LineKind::Product)
            .map(|line| match line.quantity {
                Some(quantity) => Ok(quantity),
                None => consumed_units(line.previous_reading_unit, line.next_reading_unit, bill.mf_value),
            })
            .transpose()?
            .unwrap_or(Decimal::ZERO);

        Ok(BillDetails {
            customer_name: customer_name(store, &bill),
            consumed_units: consumed,
            paid: bill.is_paid(),
            bill,
        })
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn ensure_reading_not_below(previous: Decimal, next: Decimal) -> EngineResult<()> {
    if next < previous {
        return Err(EngineError::validation(
            "next_reading_value",
            format!(
                "Next reading {} is lower than the previous reading {}",
                next, previous
            ),
        ));
    }
    Ok(())
}

fn set_opening_reading(bill: &mut Bill, previous: Decimal) {
    bill.previous_reading_unit = previous;
    if let Some(line) = bill.lines.first_mut() {
        line.previous_reading_unit = previous;
    }
}

fn parse_filter_date(field: &str, value: Option<&str>) -> Option<NaiveDate> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match NaiveDate::parse_from_str(value, HISTORY_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(field, value, error = %e, "Ignoring unparseable date filter");
            None
        }
    }
}

fn display_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(HISTORY_DATE_FORMAT).to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn customer_name<S: PartnerRepository + ?Sized>(store: &S, bill: &Bill) -> String {
    store
        .get_partner(bill.partner_id)
        .map(|partner| partner.name)
        .unwrap_or_else(|_| NOT_AVAILABLE.to_string())
}
