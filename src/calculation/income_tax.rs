//! Monthly income-tax withholding from a progressive tax slab.
//!
//! The wage is annualized, tested against every band of the slab, and the
//! resulting annual tax is spread back over twelve months.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, AuditWarning, TaxSlab};

/// Number of pay months in a fiscal year.
pub const MONTHS_PER_YEAR: u32 = 12;

/// Rule used to round the monthly withholding to a whole unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingRule {
    /// Banker's rounding: halves go to the nearest even unit.
    #[default]
    HalfEven,
    /// Halves go away from zero.
    HalfAwayFromZero,
}

impl RoundingRule {
    /// Rounds `value` to zero decimal places.
    ///
    /// # Examples
    ///
    /// ```
    /// use utility_payroll_engine::calculation::RoundingRule;
    /// use rust_decimal::Decimal;
    ///
    /// let half = Decimal::new(25, 1); // 2.5
    /// assert_eq!(RoundingRule::HalfEven.apply(half), Decimal::from(2));
    /// assert_eq!(RoundingRule::HalfAwayFromZero.apply(half), Decimal::from(3));
    /// ```
    pub fn apply(self, value: Decimal) -> Decimal {
        let strategy = match self {
            RoundingRule::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingRule::HalfAwayFromZero => RoundingStrategy::MidpointAwayFromZero,
        };
        value.round_dp_with_strategy(0, strategy)
    }
}

/// The result of a withholding computation, including the audit step.
#[derive(Debug, Clone)]
pub struct IncomeTaxResult {
    /// Monthly wage multiplied by twelve.
    pub annual_gross: Decimal,
    /// Unrounded annual tax summed over all matching bands.
    pub annual_tax: Decimal,
    /// Rounded monthly withholding.
    pub monthly_tax: Decimal,
    /// Indices (into [`TaxSlab::bands`]) of the bands that applied.
    pub matched_bands: Vec<usize>,
    /// The audit step recording this computation.
    pub audit_step: AuditStep,
    /// Conditions worth an operator's attention.
    pub warnings: Vec<AuditWarning>,
}

/// Computes the monthly withholding for `monthly_wage` under `slab`.
///
/// Uses [`RoundingRule::HalfEven`]. See [`calculate_income_tax`] for the
/// detailed form.
///
/// # Examples
///
/// ```
/// use utility_payroll_engine::calculation::compute_monthly_tax;
/// use utility_payroll_engine::models::{TaxBand, TaxSlab};
/// use rust_decimal::Decimal;
///
/// let flat = TaxBand::new(Decimal::ZERO, None, Decimal::from(10), Decimal::ZERO).unwrap();
/// let slab = TaxSlab::new("Flat 10%", vec![flat]).unwrap();
///
/// let tax = compute_monthly_tax(Decimal::from(1000), &slab).unwrap();
/// assert_eq!(tax, Decimal::from(100));
/// ```
pub fn compute_monthly_tax(monthly_wage: Decimal, slab: &TaxSlab) -> EngineResult<Decimal> {
    calculate_income_tax(monthly_wage, slab, RoundingRule::default(), 1)
        .map(|result| result.monthly_tax)
}

/// Computes the monthly withholding and records how it was reached.
///
/// Every band whose `[start_limit, end_limit)` range holds the annual gross
/// contributes `(annual_gross - start_limit) * rate_percent / 100 + fixed_amount`.
/// Contributions of overlapping bands are summed and flagged with an
/// `OVERLAPPING_BANDS` warning. An annual gross outside every band yields
/// zero and a `NO_MATCHING_BAND` warning.
///
/// # Arguments
///
/// * `monthly_wage` - Gross monthly wage, must not be negative
/// * `slab` - The tax schedule to apply
/// * `rounding` - Rule used to round the monthly amount
/// * `step_number` - The step number for audit trail sequencing
///
/// # Errors
///
/// Returns `Validation` when `monthly_wage` is negative.
pub fn calculate_income_tax(
    monthly_wage: Decimal,
    slab: &TaxSlab,
    rounding: RoundingRule,
    step_number: u32,
) -> EngineResult<IncomeTaxResult> {
    if monthly_wage < Decimal::ZERO {
        return Err(EngineError::validation(
            "wage",
            format!("Monthly wage cannot be negative, got {}", monthly_wage),
        ));
    }

    let months = Decimal::from(MONTHS_PER_YEAR);
    let annual_gross = monthly_wage
        .checked_mul(months)
        .ok_or_else(|| out_of_range(monthly_wage))?;

    let mut annual_tax = Decimal::ZERO;
    let mut matched_bands = Vec::new();
    for (index, band) in slab.bands().iter().enumerate() {
        if band.contains(annual_gross) {
            annual_tax = band
                .annual_tax(annual_gross)
                .and_then(|tax| annual_tax.checked_add(tax))
                .ok_or_else(|| out_of_range(monthly_wage))?;
            matched_bands.push(index);
        }
    }

    let monthly_tax = rounding.apply(annual_tax / months);

    let mut warnings = Vec::new();
    if matched_bands.is_empty() && !slab.is_empty() {
        warnings.push(AuditWarning::new(
            "NO_MATCHING_BAND",
            format!(
                "Annual gross {} falls outside every band of slab '{}'; no tax applied",
                annual_gross, slab.name
            ),
            "medium",
        ));
    }
    if matched_bands.len() > 1 {
        warn!(
            slab = %slab.name,
            annual_gross = %annual_gross,
            bands = ?matched_bands,
            "Annual gross matched overlapping tax bands; contributions summed"
        );
        warnings.push(AuditWarning::new(
            "OVERLAPPING_BANDS",
            format!(
                "Annual gross {} matched {} bands of slab '{}'; their taxes were summed",
                annual_gross,
                matched_bands.len(),
                slab.name
            ),
            "high",
        ));
    }

    debug!(
        slab = %slab.name,
        annual_gross = %annual_gross,
        annual_tax = %annual_tax,
        monthly_tax = %monthly_tax,
        "Income tax computed"
    );

    let reasoning = if matched_bands.is_empty() {
        format!(
            "Annual gross {} is not covered by slab '{}': monthly tax 0",
            annual_gross, slab.name
        )
    } else {
        format!(
            "Annual gross {} (= {} x 12) gives annual tax {}; {} / 12 rounded = {}",
            annual_gross, monthly_wage, annual_tax, annual_tax, monthly_tax
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "income_tax_slab".to_string(),
        rule_name: "Income Tax Slab".to_string(),
        input: serde_json::json!({
            "monthly_wage": monthly_wage.to_string(),
            "slab": slab.name,
            "rounding": rounding,
        }),
        output: serde_json::json!({
            "annual_gross": annual_gross.to_string(),
            "annual_tax": annual_tax.to_string(),
            "monthly_tax": monthly_tax.to_string(),
            "matched_bands": matched_bands,
        }),
        reasoning,
    };

    Ok(IncomeTaxResult {
        annual_gross,
        annual_tax,
        monthly_tax,
        matched_bands,
        audit_step,
        warnings,
    })
}

fn out_of_range(monthly_wage: Decimal) -> EngineError {
    EngineError::validation(
        "wage",
        format!("Monthly wage {} overflows the annual tax computation", monthly_wage),
    )
}
