//! Entry point for the RuGMST application.
//! Handles CLI parsing, archive discovery, and dispatches the batch pipeline
//! or the single-file inspection modes.

use clap::Parser;
use ru_gmst::catalog::{CatalogQuery, DatasetSource, LocalArchive};
use ru_gmst::cli::Args;
use ru_gmst::errors::GmstError;
use ru_gmst::loader::{normalize_run, LoadOptions};
use ru_gmst::netcdf_io::{write_trajectories_json, write_trajectories_netcdf};
use ru_gmst::parallel::{get_parallel_info, ParallelConfig};
use ru_gmst::pipeline::{run_pipeline, BatchOutcome};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!(
        r#"
------------------------------------------------------------------
        ______        _____  ___  ___  _____   _____
        | ___ \      |  __ \ |  \/  | /  ___| |_   _|
        | |_/ /_   _ | |  \/ | .  . | \ `--.    | |
        |    /| | | || | __  | |\/| |  `--. \   | |
        | |\ \| |_| || |_\ \ | |  | | /\__/ /   | |
        \_| \_|\__,_| \____/ \_|  |_/ \____/    \_/
                CMIP6 GMST trajectory pipeline
------------------------------------------------------------------
                        "#
    );

    // Single-file inspection needs no archive or thread pool
    if let Some(path) = &args.describe {
        describe_file(path, &args)?;
        return Ok(());
    }

    ParallelConfig::new(args.threads).setup_global_pool()?;
    if args.verbose {
        get_parallel_info().print_info();
    }

    let archive_path = args.archive.clone().ok_or_else(|| {
        GmstError::Generic("An archive path is required (use --archive)".to_string())
    })?;
    let archive = LocalArchive::new(archive_path)?;
    let config = args.pipeline_config();

    if args.list_runs {
        list_runs(&archive, &config.query).await?;
        return Ok(());
    }

    let outcome = run_pipeline(&archive, &config).await?;
    outcome.print_summary();

    if let Some(path) = &args.output_netcdf {
        write_trajectories_netcdf(&outcome, config.reference, path)?;
    }
    if let Some(path) = &args.output_json {
        write_trajectories_json(&outcome, config.reference, path)?;
    }
    if args.output_netcdf.is_none() && args.output_json.is_none() {
        print_final_anomalies(&outcome);
    }

    if !outcome.is_complete_success() {
        println!(
            "\n⚠ Batch completed with {} per-run failures (see summary above)",
            outcome.failures.len()
        );
    }

    Ok(())
}

/// Print identity, grid and time span for one file
fn describe_file(path: &Path, args: &Args) -> ru_gmst::errors::Result<()> {
    let options = LoadOptions {
        variable: args.variable.clone(),
        window: args.window,
    };
    let normalized = normalize_run(path, &options)?;

    println!("📂 Describing: {}", path.display());
    println!("==============================");
    println!(" Run: {}", normalized.run);
    println!("   Activity:    {}", normalized.run.activity);
    println!("   Institution: {}", normalized.run.institution);
    println!("   Model:       {}", normalized.run.model);
    println!("   Experiment:  {}", normalized.run.experiment);
    println!("   Member:      {}", normalized.run.member);
    println!("   Grid label:  {}", normalized.run.variant);
    println!(
        " Grid: {} lat × {} lon",
        normalized.lats.len(),
        normalized.lons.len()
    );
    match (normalized.months.first(), normalized.months.last()) {
        (Some(first), Some(last)) => println!(
            " Time: {} monthly steps, {} to {}",
            normalized.n_time(),
            first,
            last
        ),
        _ => println!(" Time: no steps inside the analysis window"),
    }
    println!(" Calendar: {}", normalized.calendar.as_str());
    println!(" Units: {}", normalized.units);

    Ok(())
}

/// List runs matching the query without reducing them
async fn list_runs(archive: &LocalArchive, query: &CatalogQuery) -> ru_gmst::errors::Result<()> {
    let runs = archive.discover(query).await?;

    println!(
        "\n📋 Matching runs under {}: {}",
        archive.root().display(),
        runs.len()
    );
    println!("==============================");
    for (run, handle) in &runs {
        println!("   {} [{}]", run, handle.path.display());
    }

    Ok(())
}

/// Terminal fallback when no output file was requested: show where each
/// trajectory ends up
fn print_final_anomalies(outcome: &BatchOutcome) {
    if outcome.trajectories.is_empty() {
        return;
    }

    println!("\n🌡 Final anomalies (relative to reference period):");
    for series in outcome.trajectories.values() {
        let last_finite = series
            .values
            .iter()
            .rev()
            .find(|v| v.is_finite())
            .copied()
            .unwrap_or(f64::NAN);
        let last_year = series.years.last().copied().unwrap_or_default();
        println!(
            "   {}: {:+.2} {} at {}",
            series.label, last_finite, series.units, last_year
        );
    }
    println!("\n💡 Tip: Use --output-netcdf or --output-json to save trajectories");
}
