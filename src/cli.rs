//! Defines command-line interface options using `clap` for the RuGMST application.

use crate::catalog::CatalogQuery;
use crate::loader::LoadOptions;
use crate::pipeline::PipelineConfig;
use crate::time::YearRange;
use clap::Parser;
use std::path::PathBuf;

/// A CLI tool for computing GMST trajectories from CMIP6 archives
#[derive(Parser, Debug)]
#[command(
    author = "Sam Green",
    version = "0.3.0",
    name = "RuGMST",
    about = "App for computing global-mean surface temperature trajectories from CMIP6 NetCDF archives"
)]
pub struct Args {
    /// Path to the root of a CMIP6 NetCDF archive
    #[arg(short, long, required_unless_present = "describe")]
    pub archive: Option<PathBuf>,

    /// Scenario experiments to process, comma separated
    #[arg(long, value_delimiter = ',', default_value = "ssp126,ssp245,ssp370,ssp585")]
    pub scenarios: Vec<String>,

    /// Temperature variable to reduce
    #[arg(long, default_value = "tas")]
    pub variable: String,

    /// Restrict to one ensemble member (e.g. r1i1p1f1). All members when unset.
    #[arg(short, long)]
    pub member: Option<String>,

    /// Analysis window, formatted as <start>:<end>
    #[arg(long, value_parser = parse_year_range, default_value = "1850:2100")]
    pub window: YearRange,

    /// Reference period the anomalies are rebased to, formatted as <start>:<end>
    #[arg(long, value_parser = parse_year_range, default_value = "1850:1900")]
    pub reference: YearRange,

    /// Path to save trajectories as NetCDF. If not set, prints to terminal.
    #[arg(long)]
    pub output_netcdf: Option<PathBuf>,

    /// Path to save the batch report (trajectories and failures) as JSON
    #[arg(long)]
    pub output_json: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// List runs matching the query without processing them
    #[arg(long)]
    pub list_runs: bool,

    /// Describe a single NetCDF file (identity, grid, time span) and exit
    #[arg(long)]
    pub describe: Option<PathBuf>,
}

impl Args {
    /// Assemble the batch configuration from the parsed flags.
    ///
    /// The historical experiment is always queried alongside the requested
    /// scenarios since every splice needs it.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut experiments: Vec<String> = vec!["historical".to_string()];
        for scenario in &self.scenarios {
            if !experiments.contains(scenario) {
                experiments.push(scenario.clone());
            }
        }

        PipelineConfig {
            query: CatalogQuery {
                experiments,
                variable: self.variable.clone(),
                frequency: "mon".to_string(),
                member: self.member.clone(),
            },
            load: LoadOptions {
                variable: self.variable.clone(),
                window: self.window,
            },
            reference: self.reference,
        }
    }
}

fn parse_year_range(s: &str) -> Result<YearRange, String> {
    s.parse()
}
