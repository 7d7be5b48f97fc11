//! Income-tax slab model and related types.
//!
//! A [`TaxSlab`] is a named schedule of progressive [`TaxBand`]s for one
//! fiscal period. Bands are validated when they are built, so a slab never
//! holds a malformed band.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Identifier of a persisted tax slab.
pub type SlabId = u64;

/// One bracket of a progressive annual tax schedule.
///
/// A band covers annual gross salary in `[start_limit, end_limit)`. An
/// `end_limit` of `None` leaves the band open at the top.
///
/// # Example
///
/// ```
/// use utility_payroll_engine::models::TaxBand;
/// use rust_decimal::Decimal;
///
/// let band = TaxBand::new(
///     Decimal::from(600_000),
///     Some(Decimal::from(1_200_000)),
///     Decimal::from(5),
///     Decimal::ZERO,
/// )
/// .unwrap();
/// assert!(band.contains(Decimal::from(600_000)));
/// assert!(!band.contains(Decimal::from(1_200_000)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaxBandSpec")]
pub struct TaxBand {
    start_limit: Decimal,
    end_limit: Option<Decimal>,
    rate_percent: Decimal,
    fixed_amount: Decimal,
}

/// Unvalidated band fields as they arrive from YAML or JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxBandSpec {
    /// Inclusive lower bound of annual gross salary.
    pub start_limit: Decimal,
    /// Exclusive upper bound; absent for an open-ended top band.
    #[serde(default)]
    pub end_limit: Option<Decimal>,
    /// Marginal rate in percent.
    pub rate_percent: Decimal,
    /// Tax already accumulated by the lower bands.
    pub fixed_amount: Decimal,
}

impl TryFrom<TaxBandSpec> for TaxBand {
    type Error = EngineError;

    fn try_from(spec: TaxBandSpec) -> Result<Self, Self::Error> {
        TaxBand::new(
            spec.start_limit,
            spec.end_limit,
            spec.rate_percent,
            spec.fixed_amount,
        )
    }
}

impl TaxBand {
    /// Builds a band, rejecting a rate outside `[0, 100]` or an empty range.
    pub fn new(
        start_limit: Decimal,
        end_limit: Option<Decimal>,
        rate_percent: Decimal,
        fixed_amount: Decimal,
    ) -> EngineResult<Self> {
        if rate_percent < Decimal::ZERO || rate_percent > Decimal::ONE_HUNDRED {
            return Err(EngineError::validation(
                "rate_percent",
                format!("Tax Rate must be between 0% and 100%, got {}%", rate_percent),
            ));
        }

        if let Some(end) = end_limit {
            if start_limit >= end {
                return Err(EngineError::validation(
                    "end_limit",
                    format!(
                        "Start limit must be less than end limit ({} >= {})",
                        start_limit, end
                    ),
                ));
            }
        }

        Ok(Self {
            start_limit,
            end_limit,
            rate_percent,
            fixed_amount,
        })
    }

    /// Inclusive lower bound of the band.
    pub fn start_limit(&self) -> Decimal {
        self.start_limit
    }

    /// Exclusive upper bound of the band, `None` when unbounded.
    pub fn end_limit(&self) -> Option<Decimal> {
        self.end_limit
    }

    /// Marginal rate in percent.
    pub fn rate_percent(&self) -> Decimal {
        self.rate_percent
    }

    /// Base tax carried from lower bands.
    pub fn fixed_amount(&self) -> Decimal {
        self.fixed_amount
    }

    /// Returns true if `annual_gross` falls inside `[start_limit, end_limit)`.
    pub fn contains(&self, annual_gross: Decimal) -> bool {
        annual_gross >= self.start_limit && self.end_limit.is_none_or(|end| annual_gross < end)
    }

    /// Annual tax owed by this band alone for `annual_gross`.
    ///
    /// The caller is expected to have checked [`TaxBand::contains`].
    /// Returns `None` if the amount does not fit in a `Decimal`.
    pub fn annual_tax(&self, annual_gross: Decimal) -> Option<Decimal> {
        annual_gross
            .checked_sub(self.start_limit)?
            .checked_mul(self.rate_percent)?
            .checked_div(Decimal::ONE_HUNDRED)?
            .checked_add(self.fixed_amount)
    }

    fn overlaps(&self, later: &TaxBand) -> bool {
        self.end_limit.is_none_or(|end| end > later.start_limit)
    }
}

/// A named, ordered collection of tax bands for one fiscal period.
///
/// Bands are kept sorted by `start_limit` ascending. Deserialization goes
/// through [`TaxSlab::new`], so a slab read from YAML or JSON is unsaved and
/// already ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaxSlabSpec")]
pub struct TaxSlab {
    /// Store-assigned id; zero until the slab is persisted.
    pub id: SlabId,
    /// Slab name, e.g. "FY 2025-26".
    pub name: String,
    bands: Vec<TaxBand>,
}

/// Unvalidated slab fields, e.g. one file under `slabs/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxSlabSpec {
    /// Slab name.
    pub name: String,
    /// Bands in any order.
    #[serde(default)]
    pub bands: Vec<TaxBand>,
}

impl TryFrom<TaxSlabSpec> for TaxSlab {
    type Error = EngineError;

    fn try_from(spec: TaxSlabSpec) -> Result<Self, Self::Error> {
        TaxSlab::new(spec.name, spec.bands)
    }
}

impl TaxSlab {
    /// Builds an unsaved slab from already-validated bands.
    pub fn new(name: impl Into<String>, bands: Vec<TaxBand>) -> EngineResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EngineError::validation("name", "Slab Name is required"));
        }

        let mut slab = Self {
            id: 0,
            name,
            bands: Vec::with_capacity(bands.len()),
        };
        for band in bands {
            slab.add_band(band);
        }
        Ok(slab)
    }

    /// Inserts a band, keeping the `start_limit` ordering.
    pub fn add_band(&mut self, band: TaxBand) {
        let position = self
            .bands
            .partition_point(|existing| existing.start_limit <= band.start_limit);
        self.bands.insert(position, band);
    }

    /// The bands in ascending `start_limit` order.
    pub fn bands(&self) -> &[TaxBand] {
        &self.bands
    }

    /// Returns true if the slab holds no bands.
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Index pairs of bands whose ranges overlap.
    pub fn overlapping_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, earlier) in self.bands.iter().enumerate() {
            for (j, later) in self.bands.iter().enumerate().skip(i + 1) {
                if earlier.overlaps(later) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    /// Human-readable description of the bands, one line per band.
    ///
    /// # Example
    ///
    /// ```
    /// use utility_payroll_engine::models::{TaxBand, TaxSlab};
    /// use rust_decimal::Decimal;
    ///
    /// let band = TaxBand::new(Decimal::ZERO, None, Decimal::from(10), Decimal::ZERO).unwrap();
    /// let slab = TaxSlab::new("Flat", vec![band]).unwrap();
    /// assert_eq!(slab.summary(), "0.00 and above: 10.00% (Fixed: 0.00)");
    /// ```
    pub fn summary(&self) -> String {
        if self.bands.is_empty() {
            return "No tax slab lines defined.".to_string();
        }

        self.bands
            .iter()
            .map(|band| {
                let range = match band.end_limit {
                    Some(end) => format!("{:.2} - {:.2}", band.start_limit, end),
                    None => format!("{:.2} and above", band.start_limit),
                };
                format!(
                    "{}: {:.2}% (Fixed: {:.2})",
                    range, band.rate_percent, band.fixed_amount
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
