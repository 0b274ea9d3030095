//! End-to-end batch orchestration
//!
//! Drives discovery, per-run reduction, splicing and post-processing for a
//! whole archive. Every run gets an explicit outcome: a finished trajectory,
//! or the error that stopped it. One broken run never aborts the batch, and
//! nothing is dropped silently.

use crate::catalog::{CatalogQuery, DatasetSource, RunHandle};
use crate::errors::{GmstError, Result};
use crate::loader::{normalize_run, LoadOptions};
use crate::run_id::RunId;
use crate::series::{AnnualAnomalySeries, GlobalMeanSeries};
use crate::splice::{find_historical_match, splice_series};
use crate::stats::{annualize, global_mean};
use crate::time::YearRange;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Settings for one batch, assembled by the CLI or a demo driver
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub query: CatalogQuery,
    pub load: LoadOptions,
    /// Baseline window the anomalies are rebased to
    pub reference: YearRange,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            query: CatalogQuery::default(),
            load: LoadOptions::default(),
            reference: YearRange {
                start: 1850,
                end: 1900,
            },
        }
    }
}

/// Result of one batch: every discovered run is accounted for either as a
/// finished trajectory, a supporting historical series, or a failure
#[derive(Debug)]
pub struct BatchOutcome {
    /// One annual anomaly trajectory per successfully spliced scenario run
    pub trajectories: BTreeMap<RunId, AnnualAnomalySeries>,
    /// Per-run failures with the error that caused them
    pub failures: BTreeMap<RunId, GmstError>,
    /// Number of runs the catalog surfaced for the query
    pub n_discovered: usize,
    /// Historical runs that were reduced and available for splicing
    pub n_historical: usize,
}

impl BatchOutcome {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Print a per-run account of the batch
    pub fn print_summary(&self) {
        println!("\n📊 Batch Summary");
        println!("==============================");
        println!(" Runs discovered: {}", self.n_discovered);
        println!(" Historical series available: {}", self.n_historical);
        println!(" Trajectories completed: {}", self.trajectories.len());
        println!(" Failures: {}", self.failures.len());

        for (run, series) in &self.trajectories {
            let span = match (series.years.first(), series.years.last()) {
                (Some(first), Some(last)) => format!("{}-{}", first, last),
                _ => "empty".to_string(),
            };
            println!("   ✅ {} ({} years, {})", run, series.len(), span);
        }

        for (run, err) in &self.failures {
            println!("   ❌ {}: {}", run, err);
        }
    }
}

/// Reduces one run to its global-mean series: normalize, force the load,
/// then area-weight over the grid.
///
/// # Errors
///
/// Propagates any schema, time decoding or read error from the stages.
pub fn reduce_run(handle: &RunHandle, options: &LoadOptions) -> Result<GlobalMeanSeries> {
    let normalized = normalize_run(&handle.path, options)?;
    let field = normalized.load()?;
    global_mean(&field)
}

/// Runs the full pipeline against a dataset source.
///
/// Discovery is awaited once; reduction then fans out across the Rayon pool
/// with every worker opening its own file. Splicing and post-processing run
/// over the reduced pool in deterministic identity order.
///
/// # Errors
///
/// Returns an error only when discovery itself fails; per-run problems are
/// collected into the outcome instead.
pub async fn run_pipeline(
    source: &dyn DatasetSource,
    config: &PipelineConfig,
) -> Result<BatchOutcome> {
    println!("🚀 Discovering runs in {}", source.describe());
    let handles = source.discover(&config.query).await?;
    let n_discovered = handles.len();
    println!("✅ Discovered {} matching runs", n_discovered);

    if n_discovered == 0 {
        return Ok(BatchOutcome {
            trajectories: BTreeMap::new(),
            failures: BTreeMap::new(),
            n_discovered: 0,
            n_historical: 0,
        });
    }

    println!(
        "⚡ Reducing {} runs across {} CPU cores",
        n_discovered,
        rayon::current_num_threads()
    );

    let handle_list: Vec<&RunHandle> = handles.values().collect();
    let reduced: Vec<(RunId, Result<GlobalMeanSeries>)> = handle_list
        .into_par_iter()
        .map(|handle| {
            let result = reduce_run(handle, &config.load);
            match &result {
                Ok(series) => {
                    let span = series
                        .span()
                        .map(|(first, last)| format!("{} to {}", first, last))
                        .unwrap_or_else(|| "empty".to_string());
                    println!("   ✅ {} ({} months, {})", handle.run, series.len(), span);
                }
                Err(err) => println!("   ❌ {}: {}", handle.run, err),
            }
            (handle.run.clone(), result)
        })
        .collect();

    let mut means: BTreeMap<RunId, GlobalMeanSeries> = BTreeMap::new();
    let mut failures: BTreeMap<RunId, GmstError> = BTreeMap::new();
    for (run, result) in reduced {
        match result {
            Ok(series) => {
                means.insert(run, series);
            }
            Err(err) => {
                failures.insert(run, err);
            }
        }
    }

    let n_historical = means.keys().filter(|id| id.is_historical()).count();
    let scenario_ids: Vec<RunId> = means.keys().filter(|id| id.is_scenario()).cloned().collect();

    println!(
        "🔗 Splicing {} scenario runs against {} historical series",
        scenario_ids.len(),
        n_historical
    );

    let mut trajectories: BTreeMap<RunId, AnnualAnomalySeries> = BTreeMap::new();
    for scenario_id in scenario_ids {
        match splice_and_annualize(&scenario_id, &means, config.reference) {
            Ok(series) => {
                println!("   ✅ {} ({} years)", series.label, series.len());
                trajectories.insert(scenario_id, series);
            }
            Err(err) => {
                println!("   ❌ {}: {}", scenario_id, err);
                failures.insert(scenario_id, err);
            }
        }
    }

    Ok(BatchOutcome {
        trajectories,
        failures,
        n_discovered,
        n_historical,
    })
}

fn splice_and_annualize(
    scenario_id: &RunId,
    means: &BTreeMap<RunId, GlobalMeanSeries>,
    reference: YearRange,
) -> Result<AnnualAnomalySeries> {
    let historical_id = find_historical_match(scenario_id, means)?.clone();
    let scenario_series = &means[scenario_id];
    let historical_series = &means[&historical_id];
    let spliced = splice_series(scenario_id, scenario_series, &historical_id, historical_series)?;
    annualize(&spliced, reference)
}
