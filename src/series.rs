//! Core data structures flowing through the GMST pipeline
//!
//! Each stage consumes one of these types and produces the next:
//! `GriddedField` (loader output) -> `GlobalMeanSeries` (spatial reduction) ->
//! `SplicedSeries` (historical + scenario join) -> `AnnualAnomalySeries`
//! (terminal artifact). All of them are immutable after construction and are
//! cheap to move between worker threads.

use crate::errors::{GmstError, Result};
use crate::run_id::RunId;
use crate::time::YearMonth;
use ndarray::Array3;

/// A normalized temperature field for one run: `(time, lat, lon)` with
/// canonical coordinate arrays and monthly time stamps
#[derive(Debug, Clone)]
pub struct GriddedField {
    /// Data in canonical `(time, lat, lon)` order, missing cells as NaN
    pub data: Array3<f32>,
    /// One stamp per time step, same length as axis 0
    pub months: Vec<YearMonth>,
    /// Latitude in degrees north, same length as axis 1
    pub lats: Vec<f64>,
    /// Longitude in degrees east, same length as axis 2
    pub lons: Vec<f64>,
    /// Physical units carried through to derived series, typically `K`
    pub units: String,
}

impl GriddedField {
    /// Construct a field, checking that coordinate lengths match the array shape
    pub fn new(
        data: Array3<f32>,
        months: Vec<YearMonth>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        units: String,
    ) -> Result<Self> {
        let shape = data.shape();
        if shape[0] != months.len() || shape[1] != lats.len() || shape[2] != lons.len() {
            return Err(GmstError::UnsupportedSchema {
                run: "<unlabelled>".to_string(),
                reason: format!(
                    "Field shape {:?} does not match coordinate lengths (time={}, lat={}, lon={})",
                    shape,
                    months.len(),
                    lats.len(),
                    lons.len()
                ),
            });
        }
        Ok(Self {
            data,
            months,
            lats,
            lons,
            units,
        })
    }

    pub fn n_time(&self) -> usize {
        self.months.len()
    }

    pub fn n_lat(&self) -> usize {
        self.lats.len()
    }

    pub fn n_lon(&self) -> usize {
        self.lons.len()
    }
}

/// Area-weighted global mean per time step, detached from the gridded field
/// it was reduced from
#[derive(Debug, Clone)]
pub struct GlobalMeanSeries {
    pub months: Vec<YearMonth>,
    pub values: Vec<f64>,
    pub units: String,
}

impl GlobalMeanSeries {
    pub fn new(months: Vec<YearMonth>, values: Vec<f64>, units: String) -> Result<Self> {
        if months.len() != values.len() {
            return Err(GmstError::StatisticsError(format!(
                "Series has {} time stamps but {} values",
                months.len(),
                values.len()
            )));
        }
        Ok(Self {
            months,
            values,
            units,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First and last stamp, if the series is non-empty
    pub fn span(&self) -> Option<(YearMonth, YearMonth)> {
        match (self.months.first(), self.months.last()) {
            (Some(&a), Some(&b)) => Some((a, b)),
            _ => None,
        }
    }
}

/// A scenario trajectory extended backward with its matching historical run.
///
/// Construction goes through [`crate::splice::splice_series`], which checks
/// the concatenated axis is strictly monthly with no duplicates or gaps.
#[derive(Debug, Clone)]
pub struct SplicedSeries {
    /// Human-readable label, `model.experiment.member`
    pub label: String,
    pub scenario: RunId,
    pub historical: RunId,
    pub months: Vec<YearMonth>,
    pub values: Vec<f64>,
    pub units: String,
}

impl SplicedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn span(&self) -> Option<(YearMonth, YearMonth)> {
        match (self.months.first(), self.months.last()) {
            (Some(&a), Some(&b)) => Some((a, b)),
            _ => None,
        }
    }
}

/// Terminal artifact: annual-mean anomalies relative to the seasonal cycle
/// and a reference-period baseline
#[derive(Debug, Clone)]
pub struct AnnualAnomalySeries {
    pub label: String,
    pub scenario: RunId,
    pub years: Vec<i32>,
    pub values: Vec<f64>,
    /// Anomaly units match the source field, typically `K`
    pub units: String,
}

impl AnnualAnomalySeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up the anomaly for one calendar year
    pub fn value_for_year(&self, year: i32) -> Option<f64> {
        self.years
            .iter()
            .position(|&y| y == year)
            .map(|i| self.values[i])
    }
}
