//! Electric bill (customer invoice) models.
//!
//! A [`Bill`] is an invoice flagged as a utility bill. It carries the
//! meter metadata of the billed customer and one product line holding the
//! meter readings, followed by the fixed account lines.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PartnerId;
use crate::error::{EngineError, EngineResult};

/// Identifier of a persisted bill.
pub type BillId = u64;

/// Lifecycle state of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillState {
    /// Editable, not yet counted for previous readings.
    Draft,
    /// Final; its readings feed the next bill of the same customer.
    Posted,
    /// Voided.
    Cancelled,
}

impl BillState {
    /// Lowercase name used in history listings.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillState::Draft => "draft",
            BillState::Posted => "posted",
            BillState::Cancelled => "cancelled",
        }
    }
}

/// Accounting direction of the underlying invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    /// Customer invoice. Every bill created by the engine is one.
    OutInvoice,
    /// Customer credit note.
    OutRefund,
}

/// Kind of a bill line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Consumed units, priced per unit.
    Product,
    /// Fixed charge booked on a ledger account.
    Account,
}

/// A single line of a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLine {
    /// Whether the line bills units or a fixed charge.
    pub kind: LineKind,
    /// Display label (product name or charge description).
    pub label: String,
    /// Ledger account code for account lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_code: Option<String>,
    /// Meter reading at the start of the billing period.
    #[serde(default)]
    pub previous_reading_unit: Decimal,
    /// Meter reading at the end of the billing period.
    #[serde(default)]
    pub next_reading_unit: Decimal,
    /// Billed quantity; `None` for lines that are not products.
    #[serde(default)]
    pub quantity: Option<Decimal>,
    /// Price per unit, or the fixed charge for account lines.
    pub price_unit: Decimal,
    /// Line total.
    #[serde(default)]
    pub subtotal: Decimal,
}

impl BillLine {
    /// A product line carrying the next meter reading.
    pub fn product(label: impl Into<String>, next_reading: Decimal, price_unit: Decimal) -> Self {
        Self {
            kind: LineKind::Product,
            label: label.into(),
            account_code: None,
            previous_reading_unit: Decimal::ZERO,
            next_reading_unit: next_reading,
            quantity: None,
            price_unit,
            subtotal: Decimal::ZERO,
        }
    }

    /// A fixed-charge line booked on `account_code`.
    pub fn account(
        label: impl Into<String>,
        account_code: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            kind: LineKind::Account,
            label: label.into(),
            account_code: Some(account_code.into()),
            previous_reading_unit: Decimal::ZERO,
            next_reading_unit: Decimal::ZERO,
            quantity: None,
            price_unit: amount,
            subtotal: Decimal::ZERO,
        }
    }
}

/// An electric bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    /// Store-assigned id; zero until persisted.
    pub id: BillId,
    /// Store-assigned sequence name, e.g. `BILL/2025/00001`.
    pub name: String,
    /// The billed customer.
    pub partner_id: PartnerId,
    /// Meter id copied from the customer.
    pub meter_id: String,
    /// Reference number copied from the customer.
    pub reference_no: String,
    /// Accounting direction.
    pub move_type: MoveType,
    /// Marks the invoice as a utility bill.
    pub is_bill: bool,
    /// Lifecycle state.
    pub state: BillState,
    /// Date the invoice was posted.
    pub invoice_date: Option<NaiveDate>,
    /// Month the bill covers.
    pub billing_month: Option<NaiveDate>,
    /// Date the meter was read.
    pub reading_date: Option<NaiveDate>,
    /// Date the bill was issued.
    pub issue_date: Option<NaiveDate>,
    /// Payment due date.
    pub due_date: Option<NaiveDate>,
    /// Meter multiplying factor.
    pub mf_value: Decimal,
    /// Reading carried over from the customer's last posted bill.
    pub previous_reading_unit: Decimal,
    /// Surcharge printed for payment after the due date.
    pub late_payment_surcharge: Decimal,
    /// Free-form notes.
    pub bill_notes: Option<String>,
    /// Up to three signatories printed on the bill.
    pub signatory_names: Vec<String>,
    /// Mobile number for complaints.
    pub complaint_mobile_number: String,
    /// Landline number for complaints.
    pub complaint_ptcl_number: String,
    /// Bill lines; the first is the product line for bills built by the engine.
    pub lines: Vec<BillLine>,
    /// Sum of line subtotals.
    pub amount_total: Decimal,
    /// Amount still owed.
    pub amount_residual: Decimal,
}

impl Bill {
    /// Returns the first line of the bill, if any.
    pub fn first_line(&self) -> Option<&BillLine> {
        self.lines.first()
    }

    /// Returns true once nothing is owed on the bill.
    pub fn is_paid(&self) -> bool {
        self.amount_residual.is_zero()
    }

    /// Recomputes `amount_total` from the line subtotals, keeping what was
    /// already paid.
    ///
    /// Leaves the bill untouched and returns `Validation` when the total
    /// does not fit in a `Decimal`.
    pub fn refresh_totals(&mut self) -> EngineResult<()> {
        let total = self
            .lines
            .iter()
            .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.subtotal))
            .ok_or_else(|| EngineError::validation("amount_total", "Bill total is out of range"))?;

        let paid = self.amount_total - self.amount_residual;
        self.amount_total = total;
        self.amount_residual = total
            .checked_sub(paid)
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO);
        Ok(())
    }
}

/// Fields submitted to create a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBill {
    /// The billed customer.
    pub partner_id: PartnerId,
    /// Meter reading at the end of the billing period.
    pub next_reading_value: Decimal,
    /// Month the bill covers.
    #[serde(default)]
    pub billing_month: Option<NaiveDate>,
    /// Date the meter was read.
    #[serde(default)]
    pub reading_date: Option<NaiveDate>,
    /// Date the bill was issued.
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    /// Payment due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Meter multiplying factor.
    #[serde(default)]
    pub mf_value: Option<Decimal>,
    /// Surcharge for late payment.
    #[serde(default)]
    pub late_payment_surcharge: Option<Decimal>,
    /// Free-form notes.
    #[serde(default)]
    pub bill_notes: Option<String>,
    /// Signatories printed on the bill.
    #[serde(default)]
    pub signatory_names: Vec<String>,
}
