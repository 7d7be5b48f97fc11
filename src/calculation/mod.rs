//! Calculation logic for the billing and income-tax engine.
//!
//! This module contains the pure calculation functions: the monthly
//! income-tax withholding from a progressive tax slab, and the meter
//! reading arithmetic behind electric bills (previous reading lookup,
//! consumed units, line and bill totals).

mod income_tax;
mod meter_reading;

pub use income_tax::{
    IncomeTaxResult, MONTHS_PER_YEAR, RoundingRule, calculate_income_tax, compute_monthly_tax,
};
pub use meter_reading::{apply_readings, consumed_units, line_quantity, previous_reading_for};
