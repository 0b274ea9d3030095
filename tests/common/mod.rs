//! Shared fixtures: synthetic CMIP6 files for integration tests
#![allow(dead_code)]

use chrono::NaiveDate;
use ndarray::Array1;
use netcdf::create;
use std::fs;
use std::path::Path;

/// Cumulative days before each month in a noleap year
const CUM_DAYS_365: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Default test grid: 3 latitudes, 4 longitudes
pub const TEST_LATS: [f64; 3] = [-60.0, 0.0, 60.0];
pub const TEST_LONS: [f64; 4] = [-135.0, -45.0, 45.0, 135.0];

/// Description of one synthetic run file
pub struct RunSpec {
    pub activity: &'static str,
    pub institution: &'static str,
    pub model: &'static str,
    pub experiment: &'static str,
    pub member: &'static str,
    pub grid_label: &'static str,
    pub start_year: i32,
    pub end_year: i32,
    pub calendar: &'static str,
    pub lat_name: &'static str,
    pub lon_name: &'static str,
    /// Insert a singleton `height` dimension between time and latitude
    pub with_height_dim: bool,
}

impl RunSpec {
    /// A spec with CMIP6-typical defaults; activity follows the experiment
    pub fn new(model: &'static str, experiment: &'static str, start_year: i32, end_year: i32) -> Self {
        let activity = if experiment == "historical" {
            "CMIP"
        } else {
            "ScenarioMIP"
        };
        Self {
            activity,
            institution: "TEST",
            model,
            experiment,
            member: "r1i1p1f1",
            grid_label: "gn",
            start_year,
            end_year,
            calendar: "noleap",
            lat_name: "lat",
            lon_name: "lon",
            with_height_dim: false,
        }
    }

    pub fn n_time(&self) -> usize {
        ((self.end_year - self.start_year + 1) * 12) as usize
    }
}

/// Days since 1850-01-01 for the middle of a month, in the given calendar
pub fn mid_month_offset(year: i32, month: u32, calendar: &str) -> f64 {
    match calendar {
        "noleap" => {
            (i64::from(year - 1850) * 365 + CUM_DAYS_365[(month - 1) as usize] + 15) as f64
        }
        "360_day" => (i64::from(year - 1850) * 360 + i64::from(month - 1) * 30 + 15) as f64,
        _ => {
            let base = NaiveDate::from_ymd_opt(1850, 1, 1).unwrap();
            let date = NaiveDate::from_ymd_opt(year, month, 15).unwrap();
            date.signed_duration_since(base).num_days() as f64
        }
    }
}

/// Writes a synthetic CMIP6 temperature file; `value_fn(step, lat_idx,
/// lon_idx)` supplies each cell
pub fn write_run<F>(path: &Path, spec: &RunSpec, value_fn: F)
where
    F: Fn(usize, usize, usize) -> f32,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create archive directory");
    }
    let mut file = create(path).expect("Failed to create test NetCDF file");

    file.add_attribute("activity_id", spec.activity).unwrap();
    file.add_attribute("institution_id", spec.institution).unwrap();
    file.add_attribute("source_id", spec.model).unwrap();
    file.add_attribute("experiment_id", spec.experiment).unwrap();
    file.add_attribute("variant_label", spec.member).unwrap();
    file.add_attribute("grid_label", spec.grid_label).unwrap();
    file.add_attribute("variable_id", "tas").unwrap();
    file.add_attribute("frequency", "mon").unwrap();

    let n_time = spec.n_time();
    file.add_dimension("time", n_time).unwrap();
    if spec.with_height_dim {
        file.add_dimension("height", 1).unwrap();
    }
    file.add_dimension(spec.lat_name, TEST_LATS.len()).unwrap();
    file.add_dimension(spec.lon_name, TEST_LONS.len()).unwrap();

    {
        let mut time_var = file.add_variable::<f64>("time", &["time"]).unwrap();
        time_var
            .put_attribute("units", "days since 1850-01-01")
            .unwrap();
        time_var.put_attribute("calendar", spec.calendar).unwrap();

        let mut offsets = Vec::with_capacity(n_time);
        for year in spec.start_year..=spec.end_year {
            for month in 1..=12 {
                offsets.push(mid_month_offset(year, month, spec.calendar));
            }
        }
        time_var.put(Array1::from(offsets).view(), ..).unwrap();
    }

    {
        let mut lat_var = file
            .add_variable::<f64>(spec.lat_name, &[spec.lat_name])
            .unwrap();
        lat_var.put_attribute("units", "degrees_north").unwrap();
        lat_var
            .put(Array1::from(TEST_LATS.to_vec()).view(), ..)
            .unwrap();
    }

    {
        let mut lon_var = file
            .add_variable::<f64>(spec.lon_name, &[spec.lon_name])
            .unwrap();
        lon_var.put_attribute("units", "degrees_east").unwrap();
        lon_var
            .put(Array1::from(TEST_LONS.to_vec()).view(), ..)
            .unwrap();
    }

    {
        let dims: Vec<&str> = if spec.with_height_dim {
            vec!["time", "height", spec.lat_name, spec.lon_name]
        } else {
            vec!["time", spec.lat_name, spec.lon_name]
        };
        let mut tas_var = file.add_variable::<f32>("tas", &dims).unwrap();
        tas_var.put_attribute("units", "K").unwrap();
        tas_var.put_attribute("standard_name", "air_temperature").unwrap();
        tas_var.put_attribute("_FillValue", -999.0f32).unwrap();

        let mut data = Vec::with_capacity(n_time * TEST_LATS.len() * TEST_LONS.len());
        for step in 0..n_time {
            for lat_idx in 0..TEST_LATS.len() {
                for lon_idx in 0..TEST_LONS.len() {
                    data.push(value_fn(step, lat_idx, lon_idx));
                }
            }
        }

        // The height axis is singleton, so the buffer works for both layouts
        if spec.with_height_dim {
            let array = Array1::from(data)
                .into_shape((n_time, 1, TEST_LATS.len(), TEST_LONS.len()))
                .unwrap();
            tas_var.put(array.view(), ..).unwrap();
        } else {
            let array = Array1::from(data)
                .into_shape((n_time, TEST_LATS.len(), TEST_LONS.len()))
                .unwrap();
            tas_var.put(array.view(), ..).unwrap();
        }
    }
}

/// Writes a file carrying full CMIP6 identity attributes but no variables
pub fn write_empty_run(path: &Path, spec: &RunSpec) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create archive directory");
    }
    let mut file = create(path).expect("Failed to create test NetCDF file");

    file.add_attribute("activity_id", spec.activity).unwrap();
    file.add_attribute("institution_id", spec.institution).unwrap();
    file.add_attribute("source_id", spec.model).unwrap();
    file.add_attribute("experiment_id", spec.experiment).unwrap();
    file.add_attribute("variant_label", spec.member).unwrap();
    file.add_attribute("grid_label", spec.grid_label).unwrap();
    file.add_attribute("variable_id", "tas").unwrap();
    file.add_attribute("frequency", "mon").unwrap();
}

/// Writes a NetCDF file with no CMIP6 identity attributes
pub fn write_bystander_file(path: &Path) {
    let mut file = create(path).expect("Failed to create bystander file");
    file.add_attribute("title", "not a CMIP6 product").unwrap();
    file.add_dimension("x", 4).unwrap();
    let mut var = file.add_variable::<f32>("noise", &["x"]).unwrap();
    var.put(Array1::from(vec![1.0f32, 2.0, 3.0, 4.0]).view(), ..)
        .unwrap();
}
