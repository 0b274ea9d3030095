//! RuGMST: Global-mean surface temperature trajectories from CMIP6 archives
//!
//! A Rust library and CLI for turning archives of CMIP6 near-surface air
//! temperature files into continuous, annual GMST anomaly trajectories.
//! RuGMST normalizes heterogeneous NetCDF files, reduces them with
//! cosine-latitude area weighting, splices future scenarios onto their
//! historical runs, and post-processes the result into annual anomalies
//! relative to a pre-industrial baseline, using parallel processing
//! throughout.
//!
//! ## Key Features
//!
//! - **Schema Normalization**: Canonical `time`/`lat`/`lon` coordinates from
//!   either CMIP6 naming convention, with calendar-aware time decoding
//! - **Area-Weighted Reduction**: Cosine-latitude weighted global means
//!   computed in parallel with Rayon
//! - **Scenario Splicing**: Exact model-equality joins of `ssp*` runs to
//!   their historical counterparts, with validated monthly continuity
//! - **Per-Run Accounting**: One bad run never aborts a batch; every run
//!   ends as a trajectory or a reported failure
//! - **NetCDF & JSON Output**: Trajectories on a shared year axis, plus a
//!   full machine-readable batch report
//!
//! ## Module Organization
//!
//! The library is organized into logical modules:
//!
//! - [`catalog`]: Run discovery over local archives
//! - [`loader`]: File normalization and deferred field loading
//! - [`stats`]: Spatial reduction and anomaly post-processing
//! - [`splice`]: Historical/scenario joining
//! - [`pipeline`]: Batch orchestration with per-run outcomes
//! - [`netcdf_io`]: Trajectory and report writers
//! - [`parallel`]: Parallel processing configuration
//! - [`errors`]: Centralized error handling
//!
//! ## Usage Examples
//!
//! ### Batch Processing
//! ```rust,no_run
//! use ru_gmst::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let archive = LocalArchive::new("cmip6_archive/").unwrap();
//!     let config = PipelineConfig::default();
//!
//!     let outcome = run_pipeline(&archive, &config).await.unwrap();
//!     outcome.print_summary();
//! }
//! ```
//!
//! ### Single-Run Reduction
//! ```rust,no_run
//! use ru_gmst::loader::{normalize_run, LoadOptions};
//! use ru_gmst::stats::global_mean;
//! use std::path::Path;
//!
//! let options = LoadOptions::default();
//! let normalized = normalize_run(Path::new("tas_historical.nc"), &options).unwrap();
//! let field = normalized.load().unwrap();
//! let series = global_mean(&field).unwrap();
//! println!("{} monthly global means", series.len());
//! ```
//!
//! The library is designed to process whole archives of simulation runs
//! efficiently and provides clear per-run error reporting for debugging and
//! analysis.

// Core modules
pub mod catalog;
pub mod cli;
pub mod errors;
pub mod loader;
pub mod netcdf_io;
pub mod parallel;
pub mod pipeline;
pub mod run_id;
pub mod series;
pub mod splice;
pub mod stats;
pub mod time;

// Direct re-exports for the public API
pub use catalog::*;
pub use errors::*;
pub use loader::*;
pub use netcdf_io::*;
pub use parallel::*;
pub use pipeline::*;
pub use run_id::*;
pub use series::*;
pub use splice::*;
pub use stats::*;
pub use time::*;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::catalog::{CatalogQuery, DatasetSource, LocalArchive, RunHandle};
    pub use crate::errors::{GmstError, Result};
    pub use crate::loader::{normalize_run, LoadOptions, NormalizedRun};
    pub use crate::netcdf_io::{write_trajectories_json, write_trajectories_netcdf};
    pub use crate::parallel::ParallelConfig;
    pub use crate::pipeline::{run_pipeline, BatchOutcome, PipelineConfig};
    pub use crate::run_id::RunId;
    pub use crate::series::{AnnualAnomalySeries, GlobalMeanSeries, GriddedField, SplicedSeries};
    pub use crate::splice::{find_historical_match, splice_series};
    pub use crate::stats::{annualize, global_mean, MonthlyClimatology};
    pub use crate::time::{CfCalendar, YearMonth, YearRange};
}
