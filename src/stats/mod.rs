//! Statistical reductions for the GMST pipeline
//!
//! This module provides the two numerical stages of the pipeline: spatial
//! reduction of gridded fields and temporal post-processing of spliced
//! series.
//!
//! # Organization
//!
//! - [`spatial`]: Area-weighted reduction over latitude/longitude
//! - [`anomaly`]: Seasonal-cycle removal, baseline rebasing and annual means
//!
//! All reductions accumulate in f64 regardless of input precision and skip
//! non-finite values, yielding NaN where a reduction window contains no
//! valid data.

pub mod anomaly;
pub mod spatial;

pub use anomaly::{annualize, MonthlyClimatology};
pub use spatial::{global_mean, latitude_weights};
