//! Meter reading calculations for electric bills.
//!
//! A bill's opening reading is the closing reading of the customer's most
//! recent posted bill for an earlier month. Consumed units are the
//! difference between the two readings, scaled by the meter's multiplying
//! factor.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{Bill, BillLine, BillState, LineKind, MoveType};
use crate::store::{BillCriteria, BillRepository};

/// Looks up the opening meter reading for `bill`.
///
/// Searches the customer's posted bills with a `billing_month` strictly
/// before this bill's month (or `today` when the month is unset), skipping
/// the bill itself, and returns the closing reading on the first line of
/// the newest one. Returns zero when there is no such bill, when that bill
/// has no lines, or when `bill` is not a utility bill.
pub fn previous_reading_for<S>(store: &S, bill: &Bill, today: NaiveDate) -> EngineResult<Decimal>
where
    S: BillRepository + ?Sized,
{
    if !bill.is_bill {
        return Ok(Decimal::ZERO);
    }

    let criteria = BillCriteria {
        partner_id: Some(bill.partner_id),
        is_bill: Some(true),
        state: Some(BillState::Posted),
        billing_month_before: Some(bill.billing_month.unwrap_or(today)),
        exclude_id: Some(bill.id),
        ..BillCriteria::default()
    };

    let reading = store
        .find_latest(&criteria)?
        .and_then(|last| last.first_line().map(|line| line.next_reading_unit))
        .unwrap_or(Decimal::ZERO);

    Ok(reading)
}

/// Units consumed between two readings, scaled by `mf_value`.
///
/// A zero multiplying factor is treated as unset. Fails with `Validation`
/// when the result does not fit in a `Decimal`.
///
/// # Examples
///
/// ```
/// use utility_payroll_engine::calculation::consumed_units;
/// use rust_decimal::Decimal;
///
/// let units = consumed_units(Decimal::from(1200), Decimal::from(1350), Decimal::from(2)).unwrap();
/// assert_eq!(units, Decimal::from(300));
/// ```
pub fn consumed_units(previous: Decimal, next: Decimal, mf_value: Decimal) -> EngineResult<Decimal> {
    let consumed = next.checked_sub(previous);
    let scaled = if mf_value.is_zero() {
        consumed
    } else {
        consumed.and_then(|units| units.checked_mul(mf_value))
    };

    scaled.ok_or_else(|| {
        EngineError::validation(
            "next_reading_unit",
            format!(
                "Consumption from {} to {} (MF {}) is out of range",
                previous, next, mf_value
            ),
        )
    })
}

/// Billed quantity of `line` on `bill`.
///
/// Account lines carry no quantity. Product lines of a customer bill bill
/// their consumed units; any other product line keeps its quantity, or one.
pub fn line_quantity(line: &BillLine, bill: &Bill) -> EngineResult<Option<Decimal>> {
    let quantity = match line.kind {
        LineKind::Account => None,
        LineKind::Product if bill.is_bill && bill.move_type == MoveType::OutInvoice => Some(
            consumed_units(line.previous_reading_unit, line.next_reading_unit, bill.mf_value)?,
        ),
        LineKind::Product => Some(line.quantity.unwrap_or(Decimal::ONE)),
    };
    Ok(quantity)
}

/// Recomputes line quantities, subtotals, and bill totals.
///
/// Account lines are fixed charges: their subtotal is their price. Every
/// amount is computed before any line is touched, so an out-of-range
/// amount leaves `bill` unchanged.
pub fn apply_readings(bill: &mut Bill) -> EngineResult<()> {
    let priced = bill
        .lines
        .iter()
        .map(|line| {
            let quantity = line_quantity(line, bill)?;
            let subtotal = match quantity {
                Some(quantity) => quantity.checked_mul(line.price_unit).ok_or_else(|| {
                    EngineError::validation(
                        "price_unit",
                        format!(
                            "Line '{}': {} x {} is out of range",
                            line.label, quantity, line.price_unit
                        ),
                    )
                })?,
                None => line.price_unit,
            };
            Ok::<_, EngineError>((quantity, subtotal))
        })
        .collect::<EngineResult<Vec<_>>>()?;

    let mut updated = bill.clone();
    for (line, (quantity, subtotal)) in updated.lines.iter_mut().zip(priced) {
        line.quantity = quantity;
        line.subtotal = subtotal;
    }
    updated.refresh_totals()?;

    *bill = updated;
    Ok(())
}
