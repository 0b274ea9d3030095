//! Writing batch results to NetCDF and JSON
//!
//! The terminal artifacts are annual anomaly trajectories. The NetCDF writer
//! lays them out on a shared `year` dimension (the union across
//! trajectories, NaN-filled where a trajectory has no value) so downstream
//! plotting tools can read one coordinate. The JSON writer mirrors the full
//! batch outcome including per-run failures.

use crate::errors::{GmstError, Result};
use crate::pipeline::BatchOutcome;
use crate::time::YearRange;
use chrono::Utc;
use ndarray::Array1;
use serde_json::json;
use std::collections::BTreeSet;
use std::{fs, path::Path};

/// NetCDF variable names allow a restricted character set; anything outside
/// it becomes an underscore
fn sanitize_name(label: &str) -> String {
    let mut name: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Writes every completed trajectory to a NetCDF file.
///
/// One `f64` variable per trajectory over a shared `year` coordinate, with
/// run identity and units attached as variable attributes and the reference
/// period recorded globally.
///
/// # Errors
///
/// Returns `Generic` if the batch holds no completed trajectories, or a
/// NetCDF error if the file cannot be written.
pub fn write_trajectories_netcdf(
    outcome: &BatchOutcome,
    reference: YearRange,
    output_path: &Path,
) -> Result<()> {
    if outcome.trajectories.is_empty() {
        return Err(GmstError::Generic(
            "No completed trajectories to write".to_string(),
        ));
    }

    if output_path.exists() {
        fs::remove_file(output_path)?;
    }

    let mut file = netcdf::create(output_path)?;

    // Shared year axis: union over all trajectories, ascending
    let year_set: BTreeSet<i32> = outcome
        .trajectories
        .values()
        .flat_map(|series| series.years.iter().copied())
        .collect();
    let years: Vec<i32> = year_set.into_iter().collect();

    file.add_dimension("year", years.len())?;
    let mut year_var = file.add_variable::<i32>("year", &["year"])?;
    year_var.put_attribute("long_name", "calendar year")?;
    year_var.put(Array1::from(years.clone()).view(), ..)?;

    let mut used_names: BTreeSet<String> = BTreeSet::new();
    for series in outcome.trajectories.values() {
        let base = sanitize_name(&series.label);
        let mut name = base.clone();
        let mut suffix = 2;
        while used_names.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        used_names.insert(name.clone());

        let mut aligned = vec![f64::NAN; years.len()];
        for (year, &value) in series.years.iter().zip(series.values.iter()) {
            if let Ok(idx) = years.binary_search(year) {
                aligned[idx] = value;
            }
        }

        let mut var = file.add_variable::<f64>(&name, &["year"])?;
        var.put_attribute("_FillValue", f64::NAN)?;
        var.put_attribute("units", series.units.as_str())?;
        var.put_attribute("long_name", "near-surface air temperature anomaly")?;
        var.put_attribute("source_id", series.scenario.model.as_str())?;
        var.put_attribute("experiment_id", series.scenario.experiment.as_str())?;
        var.put_attribute("variant_label", series.scenario.member.as_str())?;
        var.put(Array1::from(aligned).view(), ..)?;
    }

    file.add_attribute(
        "history",
        format!("Created by RuGMST on {}", Utc::now().to_rfc3339()),
    )?;
    file.add_attribute("reference_period", reference.to_string())?;
    file.add_attribute("frequency", "yr")?;

    println!(
        "✅ Wrote {} trajectories to {}",
        outcome.trajectories.len(),
        output_path.display()
    );
    Ok(())
}

/// Writes the full batch outcome, trajectories and failures both, as
/// pretty-printed JSON.
///
/// Non-finite anomaly values serialize as `null`.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn write_trajectories_json(
    outcome: &BatchOutcome,
    reference: YearRange,
    output_path: &Path,
) -> Result<()> {
    let trajectories: Vec<serde_json::Value> = outcome
        .trajectories
        .values()
        .map(|series| {
            json!({
                "label": series.label,
                "model": series.scenario.model,
                "experiment": series.scenario.experiment,
                "member": series.scenario.member,
                "units": series.units,
                "years": series.years,
                "anomalies": series.values,
            })
        })
        .collect();

    let failures: Vec<serde_json::Value> = outcome
        .failures
        .iter()
        .map(|(run, err)| {
            json!({
                "run": run.to_string(),
                "error": err.to_string(),
            })
        })
        .collect();

    let report = json!({
        "generated": Utc::now().to_rfc3339(),
        "reference_period": reference.to_string(),
        "runs_discovered": outcome.n_discovered,
        "historical_series": outcome.n_historical,
        "trajectories": trajectories,
        "failures": failures,
    });

    let body = serde_json::to_string_pretty(&report)
        .map_err(|e| GmstError::Generic(format!("Failed to serialize report: {}", e)))?;
    fs::write(output_path, body)?;

    println!("✅ Wrote batch report to {}", output_path.display());
    Ok(())
}
