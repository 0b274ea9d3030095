//! Loading and normalizing CMIP6 temperature files
//!
//! Source files disagree on coordinate naming (`lat` vs `latitude`), axis
//! ordering, calendars and packing attributes. Normalization resolves all of
//! that up front and produces a read plan; the gridded data itself is only
//! pulled from disk when [`NormalizedRun::load`] forces it. Keeping the two
//! steps separate means a batch can be cataloged and reported on cheaply,
//! and each worker forces exactly the hyperslab it needs.

use crate::errors::{GmstError, Result};
use crate::run_id::RunId;
use crate::series::GriddedField;
use crate::time::{decode_time_axis, is_strictly_increasing, CfCalendar, CfTimeUnits, YearMonth, YearRange};
use ndarray::{ArrayD, Axis, Ix3};
use netcdf::{AttributeValue, File, Variable};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Accepted spellings for the latitude dimension
const LAT_NAMES: [&str; 2] = ["lat", "latitude"];

/// Accepted spellings for the longitude dimension
const LON_NAMES: [&str; 2] = ["lon", "longitude"];

/// Name of the time dimension and its coordinate variable
const TIME_NAME: &str = "time";

/// Settings controlling normalization, shared by every run in a batch
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Name of the temperature variable, `tas` for CMIP6 near-surface air
    /// temperature
    pub variable: String,
    /// Analysis window; time steps outside it are discarded at load time
    pub window: YearRange,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            variable: "tas".to_string(),
            window: YearRange {
                start: 1850,
                end: 2100,
            },
        }
    }
}

/// A normalized run: identity, canonical coordinates and a read plan for the
/// windowed temperature hyperslab.
///
/// Construction via [`normalize_run`] reads only metadata and coordinate
/// arrays. The field itself is materialized once, by [`NormalizedRun::load`],
/// which re-opens the file so forcing can happen on any worker thread.
#[derive(Debug, Clone)]
pub struct NormalizedRun {
    pub run: RunId,
    pub path: PathBuf,
    /// Month stamps inside the analysis window, one per kept time step
    pub months: Vec<YearMonth>,
    /// Latitude in degrees north
    pub lats: Vec<f64>,
    /// Longitude in degrees east
    pub lons: Vec<f64>,
    pub units: String,
    /// Calendar the time axis was decoded with
    pub calendar: CfCalendar,
    variable: String,
    /// Read range per on-disk dimension of the variable, in disk order
    dim_ranges: Vec<Range<usize>>,
    /// On-disk axes that are neither time, lat nor lon, recorded highest
    /// index first so they can be dropped in order after the read
    squeeze_axes: Vec<usize>,
    /// Positions of the time, lat and lon axes among the remaining
    /// dimensions, used to permute into canonical `(time, lat, lon)` order
    axis_positions: [usize; 3],
    fill_value: Option<f32>,
    missing_value: Option<f32>,
    scale_factor: Option<f64>,
    add_offset: Option<f64>,
}

impl NormalizedRun {
    pub fn n_time(&self) -> usize {
        self.months.len()
    }

    /// Forces the deferred read: pulls the windowed hyperslab from disk,
    /// reorders axes to `(time, lat, lon)`, applies packing attributes and
    /// masks fill values to NaN.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can no longer be read or its shape
    /// changed since normalization.
    pub fn load(&self) -> Result<GriddedField> {
        let file = netcdf::open(&self.path)?;
        let var = file
            .variable(&self.variable)
            .ok_or_else(|| GmstError::UnsupportedSchema {
                run: self.run.to_string(),
                reason: format!("Variable '{}' disappeared from {}", self.variable, self.path.display()),
            })?;

        let raw: Vec<f32> = match self.dim_ranges.len() {
            3 => var.get_values::<f32, _>((
                self.dim_ranges[0].clone(),
                self.dim_ranges[1].clone(),
                self.dim_ranges[2].clone(),
            ))?,
            4 => var.get_values::<f32, _>((
                self.dim_ranges[0].clone(),
                self.dim_ranges[1].clone(),
                self.dim_ranges[2].clone(),
                self.dim_ranges[3].clone(),
            ))?,
            n => {
                return Err(GmstError::UnsupportedSchema {
                    run: self.run.to_string(),
                    reason: format!("Unsupported variable rank {} (expected 3 or 4)", n),
                })
            }
        };

        let shape: Vec<usize> = self.dim_ranges.iter().map(|r| r.len()).collect();
        let mut data = ArrayD::from_shape_vec(shape, raw)?;

        // Drop the extra axes (e.g. a singleton height level), highest
        // index first so earlier positions stay valid
        for &axis in &self.squeeze_axes {
            data = data.index_axis_move(Axis(axis), 0);
        }

        let data = data.into_dimensionality::<Ix3>()?;
        let [pos_t, pos_lat, pos_lon] = self.axis_positions;
        let mut data = data.permuted_axes([pos_t, pos_lat, pos_lon]);

        let scale = self.scale_factor.unwrap_or(1.0);
        let offset = self.add_offset.unwrap_or(0.0);
        let fill = self.fill_value;
        let missing = self.missing_value;

        data.mapv_inplace(|x| {
            if Some(x) == fill || Some(x) == missing || !x.is_finite() {
                f32::NAN
            } else {
                (f64::from(x) * scale + offset) as f32
            }
        });

        GriddedField::new(
            data,
            self.months.clone(),
            self.lats.clone(),
            self.lons.clone(),
            self.units.clone(),
        )
    }
}

/// Reads the six CMIP6 identity attributes from a file's global attributes.
///
/// # Errors
///
/// Returns `UnsupportedSchema` naming the missing attribute; `label` is used
/// for the error's run field since no identity exists yet.
pub fn read_run_id(file: &File, label: &str) -> Result<RunId> {
    let fetch = |name: &str| -> Result<String> {
        global_attr_string(file, name).ok_or_else(|| GmstError::UnsupportedSchema {
            run: label.to_string(),
            reason: format!("Missing global attribute '{}'", name),
        })
    };

    Ok(RunId::new(
        fetch("activity_id")?,
        fetch("institution_id")?,
        fetch("source_id")?,
        fetch("experiment_id")?,
        fetch("variant_label")?,
        fetch("grid_label")?,
    ))
}

/// Reads a global attribute as a string, if present and string-typed
pub fn global_attr_string(file: &File, name: &str) -> Option<String> {
    file.attribute(name).and_then(|attr| match attr.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        AttributeValue::Strs(mut v) => {
            if v.is_empty() {
                None
            } else {
                Some(v.remove(0))
            }
        }
        _ => None,
    })
}

/// Normalizes one file into a [`NormalizedRun`].
///
/// Identifies the time/lat/lon dimensions under either naming convention,
/// decodes the calendar-aware time axis, restricts it to the analysis window
/// and records the hyperslab to read later. No field data is touched.
///
/// # Errors
///
/// Returns `UnsupportedSchema` for missing identity attributes, an absent or
/// unrecognizable coordinate layout, or an empty analysis window, and
/// `TimeDecode` if the time axis cannot be interpreted.
pub fn normalize_run(path: &Path, options: &LoadOptions) -> Result<NormalizedRun> {
    let file = netcdf::open(path)?;
    let run = read_run_id(&file, &path.display().to_string())?;
    let schema_err = |reason: String| GmstError::UnsupportedSchema {
        run: run.to_string(),
        reason,
    };

    let var = file
        .variable(&options.variable)
        .ok_or_else(|| schema_err(format!("Variable '{}' not found", options.variable)))?;

    let dims: Vec<(String, usize)> = var
        .dimensions()
        .iter()
        .map(|d| (d.name(), d.len()))
        .collect();

    let mut time_dim: Option<usize> = None;
    let mut lat_dim: Option<usize> = None;
    let mut lon_dim: Option<usize> = None;

    for (idx, (name, len)) in dims.iter().enumerate() {
        if name == TIME_NAME {
            time_dim = Some(idx);
        } else if LAT_NAMES.contains(&name.as_str()) {
            lat_dim = Some(idx);
        } else if LON_NAMES.contains(&name.as_str()) {
            lon_dim = Some(idx);
        } else if *len != 1 {
            return Err(schema_err(format!(
                "Unexpected dimension '{}' of length {} on variable '{}'",
                name, len, options.variable
            )));
        }
    }

    let time_dim = time_dim.ok_or_else(|| schema_err("No time dimension found".to_string()))?;
    let lat_dim = lat_dim
        .ok_or_else(|| schema_err("No latitude dimension found (tried lat, latitude)".to_string()))?;
    let lon_dim = lon_dim
        .ok_or_else(|| schema_err("No longitude dimension found (tried lon, longitude)".to_string()))?;

    if dims.len() > 4 {
        return Err(schema_err(format!(
            "Variable '{}' has rank {} (expected 3 or 4)",
            options.variable,
            dims.len()
        )));
    }

    // Decode the full time axis, then restrict to the analysis window
    let time_var = file
        .variable(TIME_NAME)
        .ok_or_else(|| schema_err("No 'time' coordinate variable".to_string()))?;
    let time_values: Vec<f64> = time_var.get_values::<f64, _>(..)?;

    let units_attr = var_attr_string(&time_var, "units")
        .ok_or_else(|| schema_err("Time variable has no 'units' attribute".to_string()))?;
    let time_units = CfTimeUnits::parse(&units_attr)?;

    // CF default when the attribute is absent
    let calendar = match var_attr_string(&time_var, "calendar") {
        Some(name) => CfCalendar::parse(&name).ok_or_else(|| GmstError::TimeDecode {
            message: format!("Unsupported calendar '{}' in {}", name, run),
        })?,
        None => CfCalendar::Standard,
    };

    let all_months = decode_time_axis(&time_values, &time_units, calendar)?;
    if !is_strictly_increasing(&all_months) {
        return Err(schema_err("Time axis is not strictly increasing".to_string()));
    }

    let first = all_months
        .iter()
        .position(|m| options.window.contains(m.year))
        .ok_or_else(|| {
            schema_err(format!(
                "No time steps inside analysis window {}",
                options.window
            ))
        })?;
    let last = all_months
        .iter()
        .rposition(|m| options.window.contains(m.year))
        .unwrap_or(first);
    let months = all_months[first..=last].to_vec();

    // Coordinate variables carry the same names as their dimensions
    let lat_name = &dims[lat_dim].0;
    let lon_name = &dims[lon_dim].0;
    let lats: Vec<f64> = file
        .variable(lat_name)
        .ok_or_else(|| schema_err(format!("No '{}' coordinate variable", lat_name)))?
        .get_values::<f64, _>(..)?;
    let lons: Vec<f64> = file
        .variable(lon_name)
        .ok_or_else(|| schema_err(format!("No '{}' coordinate variable", lon_name)))?
        .get_values::<f64, _>(..)?;

    if let Some(&bad) = lats.iter().find(|l| !(-90.0..=90.0).contains(*l)) {
        return Err(schema_err(format!("Latitude {} outside [-90, 90]", bad)));
    }

    let dim_ranges: Vec<Range<usize>> = dims
        .iter()
        .enumerate()
        .map(|(idx, (_, len))| {
            if idx == time_dim {
                first..last + 1
            } else if idx == lat_dim || idx == lon_dim {
                0..*len
            } else {
                0..1
            }
        })
        .collect();

    // Axis positions among the dims that survive squeezing
    let kept: Vec<usize> = (0..dims.len())
        .filter(|&i| i == time_dim || i == lat_dim || i == lon_dim)
        .collect();
    let squeeze_axes: Vec<usize> = (0..dims.len()).rev().filter(|i| !kept.contains(i)).collect();
    let position_of = |dim: usize| -> usize {
        kept.iter()
            .position(|&i| i == dim)
            .unwrap_or_default()
    };
    let axis_positions = [
        position_of(time_dim),
        position_of(lat_dim),
        position_of(lon_dim),
    ];

    let units = var_attr_string(&var, "units").unwrap_or_else(|| "K".to_string());

    Ok(NormalizedRun {
        run,
        path: path.to_path_buf(),
        months,
        lats,
        lons,
        units,
        calendar,
        variable: options.variable.clone(),
        dim_ranges,
        squeeze_axes,
        axis_positions,
        fill_value: var_attr_f32(&var, "_FillValue"),
        missing_value: var_attr_f32(&var, "missing_value"),
        scale_factor: var_attr_f64(&var, "scale_factor"),
        add_offset: var_attr_f64(&var, "add_offset"),
    })
}

fn var_attr_string(var: &Variable, name: &str) -> Option<String> {
    var.attribute(name).and_then(|attr| match attr.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    })
}

fn var_attr_f32(var: &Variable, name: &str) -> Option<f32> {
    var.attribute(name).and_then(|attr| match attr.value().ok()? {
        AttributeValue::Float(v) => Some(v),
        AttributeValue::Double(v) => Some(v as f32),
        AttributeValue::Short(v) => Some(f32::from(v)),
        AttributeValue::Int(v) => Some(v as f32),
        _ => None,
    })
}

fn var_attr_f64(var: &Variable, name: &str) -> Option<f64> {
    var.attribute(name).and_then(|attr| match attr.value().ok()? {
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Double(v) => Some(v),
        _ => None,
    })
}
