//! Search criteria for bills.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::models::{Bill, BillId, BillState, PartnerId};

/// Filter over bills. Unset fields match everything.
///
/// Bills without a `billing_month` never match a date bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillCriteria {
    /// Only bills of this customer.
    pub partner_id: Option<PartnerId>,
    /// Only bills for this meter.
    pub meter_id: Option<String>,
    /// Only invoices with this bill flag.
    pub is_bill: Option<bool>,
    /// Only bills in this state.
    pub state: Option<BillState>,
    /// `billing_month` strictly before this date.
    pub billing_month_before: Option<NaiveDate>,
    /// `billing_month` on or after this date.
    pub billing_month_from: Option<NaiveDate>,
    /// `billing_month` on or before this date.
    pub billing_month_to: Option<NaiveDate>,
    /// Skip the bill with this id.
    pub exclude_id: Option<BillId>,
}

impl BillCriteria {
    /// Returns true if `bill` satisfies every set field.
    pub fn matches(&self, bill: &Bill) -> bool {
        if self.partner_id.is_some_and(|id| bill.partner_id != id) {
            return false;
        }
        if self
            .meter_id
            .as_deref()
            .is_some_and(|meter| bill.meter_id != meter)
        {
            return false;
        }
        if self.is_bill.is_some_and(|flag| bill.is_bill != flag) {
            return false;
        }
        if self.state.is_some_and(|state| bill.state != state) {
            return false;
        }
        if self.exclude_id.is_some_and(|id| bill.id == id) {
            return false;
        }

        let month = bill.billing_month;
        let bounded = self.billing_month_before.is_some()
            || self.billing_month_from.is_some()
            || self.billing_month_to.is_some();
        match month {
            None => !bounded,
            Some(month) => {
                self.billing_month_before.is_none_or(|before| month < before)
                    && self.billing_month_from.is_none_or(|from| month >= from)
                    && self.billing_month_to.is_none_or(|to| month <= to)
            }
        }
    }
}

/// Orders bills newest `billing_month` first, undated bills last, then by
/// id descending.
pub(crate) fn newest_first(a: &Bill, b: &Bill) -> Ordering {
    match (a.billing_month, b.billing_month) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.id.cmp(&a.id))
}
