//! Seasonal-cycle removal, baseline rebasing and annual aggregation
//!
//! Applied to each spliced trajectory in a fixed order: subtract the monthly
//! climatology, subtract the mean over the pre-industrial reference window,
//! then collapse to annual means. Each step is a pure function of its inputs
//! so they can be tested in isolation.

use crate::errors::{GmstError, Result};
use crate::series::{AnnualAnomalySeries, SplicedSeries};
use crate::time::{YearMonth, YearRange};

/// Long-term mean per calendar month, computed across an entire series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyClimatology {
    /// Index 0 = January; NaN where a month never occurs in the series
    values: [f64; 12],
}

impl MonthlyClimatology {
    /// Compute the climatology of a monthly series by grouping on calendar
    /// month and averaging finite values within each group
    pub fn from_series(months: &[YearMonth], values: &[f64]) -> Self {
        let mut sums = [0.0_f64; 12];
        let mut counts = [0_u32; 12];

        for (stamp, &value) in months.iter().zip(values.iter()) {
            if value.is_finite() {
                let idx = (stamp.month - 1) as usize;
                sums[idx] += value;
                counts[idx] += 1;
            }
        }

        let mut result = [f64::NAN; 12];
        for idx in 0..12 {
            if counts[idx] > 0 {
                result[idx] = sums[idx] / f64::from(counts[idx]);
            }
        }
        Self { values: result }
    }

    /// Climatological mean for a 1-based calendar month
    pub fn value_for(&self, month: u32) -> f64 {
        self.values[(month - 1) as usize]
    }
}

/// Subtracts the per-month climatology from each value, leaving the
/// deseasonalized anomaly
pub fn subtract_climatology(
    months: &[YearMonth],
    values: &[f64],
    climatology: &MonthlyClimatology,
) -> Vec<f64> {
    months
        .iter()
        .zip(values.iter())
        .map(|(stamp, &value)| value - climatology.value_for(stamp.month))
        .collect()
}

/// Subtracts the mean over the reference window, anchoring the series to a
/// pre-industrial baseline.
///
/// # Errors
///
/// Returns `EmptyReferenceWindow` if no finite value falls inside the
/// window, since the baseline would otherwise be undefined.
pub fn rebase_to_reference(
    label: &str,
    months: &[YearMonth],
    values: &[f64],
    reference: YearRange,
) -> Result<Vec<f64>> {
    let mut sum = 0.0_f64;
    let mut count = 0_u32;

    for (stamp, &value) in months.iter().zip(values.iter()) {
        if reference.contains(stamp.year) && value.is_finite() {
            sum += value;
            count += 1;
        }
    }

    if count == 0 {
        return Err(GmstError::EmptyReferenceWindow {
            label: label.to_string(),
            window: reference.to_string(),
        });
    }

    let baseline = sum / f64::from(count);
    Ok(values.iter().map(|&value| value - baseline).collect())
}

/// Collapses a monthly series to one mean per calendar year.
///
/// Years appear in series order; months with non-finite values are skipped
/// and a year with no finite months yields NaN.
pub fn annual_means(months: &[YearMonth], values: &[f64]) -> (Vec<i32>, Vec<f64>) {
    let mut years = Vec::new();
    let mut means = Vec::new();

    let mut current_year: Option<i32> = None;
    let mut sum = 0.0_f64;
    let mut count = 0_u32;

    let mut flush = |year: Option<i32>, sum: f64, count: u32| {
        if let Some(year) = year {
            years.push(year);
            means.push(if count > 0 {
                sum / f64::from(count)
            } else {
                f64::NAN
            });
        }
    };

    for (stamp, &value) in months.iter().zip(values.iter()) {
        if current_year != Some(stamp.year) {
            flush(current_year, sum, count);
            current_year = Some(stamp.year);
            sum = 0.0;
            count = 0;
        }
        if value.is_finite() {
            sum += value;
            count += 1;
        }
    }
    flush(current_year, sum, count);

    (years, means)
}

/// Runs the full post-processing chain on one spliced trajectory:
/// climatology subtraction, reference rebasing, annual aggregation.
///
/// # Errors
///
/// Returns `EmptyReferenceWindow` if the trajectory has no finite data
/// inside the reference window.
pub fn annualize(series: &SplicedSeries, reference: YearRange) -> Result<AnnualAnomalySeries> {
    let climatology = MonthlyClimatology::from_series(&series.months, &series.values);
    let deseasonalized = subtract_climatology(&series.months, &series.values, &climatology);
    let rebased = rebase_to_reference(&series.label, &series.months, &deseasonalized, reference)?;
    let (years, values) = annual_means(&series.months, &rebased);

    Ok(AnnualAnomalySeries {
        label: series.label.clone(),
        scenario: series.scenario.clone(),
        years,
        values,
        units: series.units.clone(),
    })
}
