//! Joining future-scenario runs to their historical counterparts
//!
//! CMIP6 publishes the historical experiment and each ssp* projection as
//! separate runs. A full 1850-2100 trajectory needs the two concatenated.
//! Matching is by exact equality of the model field, and a scenario with
//! zero or several historical candidates is an explicit per-run error
//! instead of a silent skip or an arbitrary pick.

use crate::errors::{GmstError, Result};
use crate::run_id::RunId;
use crate::series::{GlobalMeanSeries, SplicedSeries};
use crate::time::is_contiguous_monthly;
use std::collections::BTreeMap;

/// Finds the single historical run whose model exactly equals the scenario's.
///
/// # Errors
///
/// Returns `NoMatchingHistoricalRun` when no historical run carries the
/// model, and `AmbiguousHistoricalMatch` when several do (e.g. two ensemble
/// members); the caller must narrow the pool rather than have one picked
/// arbitrarily.
pub fn find_historical_match<'a>(
    scenario: &RunId,
    runs: &'a BTreeMap<RunId, GlobalMeanSeries>,
) -> Result<&'a RunId> {
    let candidates: Vec<&RunId> = runs
        .keys()
        .filter(|id| id.is_historical() && id.model == scenario.model)
        .collect();

    match candidates.as_slice() {
        [] => Err(GmstError::NoMatchingHistoricalRun {
            run: scenario.to_string(),
        }),
        [single] => Ok(single),
        many => Err(GmstError::AmbiguousHistoricalMatch {
            run: scenario.to_string(),
            candidates: many.iter().map(|id| id.to_string()).collect(),
        }),
    }
}

/// Concatenates a historical series with its scenario continuation.
///
/// Values pass through unchanged; the only transformation is the join. The
/// combined time axis must advance by exactly one month per step, which
/// rules out duplicated stamps, overlaps and gaps in one check.
///
/// # Errors
///
/// Returns `SpliceMismatch` if either input is empty or the concatenated
/// axis is not contiguous monthly.
pub fn splice_series(
    scenario_id: &RunId,
    scenario: &GlobalMeanSeries,
    historical_id: &RunId,
    historical: &GlobalMeanSeries,
) -> Result<SplicedSeries> {
    let label = scenario_id.splice_label();

    if historical.is_empty() || scenario.is_empty() {
        return Err(GmstError::SpliceMismatch {
            message: format!(
                "{}: Cannot splice empty series (historical has {} steps, scenario has {})",
                label,
                historical.len(),
                scenario.len()
            ),
        });
    }

    let mut months = Vec::with_capacity(historical.len() + scenario.len());
    months.extend_from_slice(&historical.months);
    months.extend_from_slice(&scenario.months);

    if let Some(i) = months.windows(2).position(|pair| !is_contiguous_monthly(pair)) {
        return Err(GmstError::SpliceMismatch {
            message: format!(
                "{}: Time axis breaks between {} and {} after concatenation",
                label,
                months[i],
                months[i + 1]
            ),
        });
    }

    let mut values = Vec::with_capacity(months.len());
    values.extend_from_slice(&historical.values);
    values.extend_from_slice(&scenario.values);

    Ok(SplicedSeries {
        label,
        scenario: scenario_id.clone(),
        historical: historical_id.clone(),
        months,
        values,
        units: scenario.units.clone(),
    })
}
