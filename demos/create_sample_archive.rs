//! Creates a small synthetic CMIP6 archive for demonstrating RuGMST.
//!
//! Two fictitious models with different calendars and coordinate naming
//! conventions, each with a historical run and one or two scenario
//! continuations. The scenario runs carry a linear warming trend so the
//! resulting trajectories have something to show.

use chrono::NaiveDate;
use ndarray::Array1;
use netcdf::create;
use std::fs;
use std::path::Path;

const LATS: [f64; 4] = [-67.5, -22.5, 22.5, 67.5];
const N_LON: usize = 8;

/// Cumulative days before each month in a noleap year
const CUM_DAYS_365: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

struct RunSpec<'a> {
    activity: &'a str,
    institution: &'a str,
    model: &'a str,
    experiment: &'a str,
    member: &'a str,
    start_year: i32,
    end_year: i32,
    calendar: &'a str,
    /// Coordinate naming: `("lat", "lon")` or `("latitude", "longitude")`
    coord_names: (&'a str, &'a str),
    /// Warming applied linearly from the run start, in K per century
    trend_per_century: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let root = Path::new("sample_archive");

    println!("🔨 Creating sample CMIP6 archive under {}", root.display());

    let runs = [
        RunSpec {
            activity: "CMIP",
            institution: "TINY",
            model: "TinyESM-1",
            experiment: "historical",
            member: "r1i1p1f1",
            start_year: 1850,
            end_year: 2014,
            calendar: "noleap",
            coord_names: ("lat", "lon"),
            trend_per_century: 0.0,
        },
        RunSpec {
            activity: "ScenarioMIP",
            institution: "TINY",
            model: "TinyESM-1",
            experiment: "ssp245",
            member: "r1i1p1f1",
            start_year: 2015,
            end_year: 2100,
            calendar: "noleap",
            coord_names: ("lat", "lon"),
            trend_per_century: 1.8,
        },
        RunSpec {
            activity: "ScenarioMIP",
            institution: "TINY",
            model: "TinyESM-1",
            experiment: "ssp585",
            member: "r1i1p1f1",
            start_year: 2015,
            end_year: 2100,
            calendar: "noleap",
            coord_names: ("lat", "lon"),
            trend_per_century: 3.5,
        },
        RunSpec {
            activity: "CMIP",
            institution: "MICRO",
            model: "MicroGCM-2",
            experiment: "historical",
            member: "r1i1p1f1",
            start_year: 1850,
            end_year: 2014,
            calendar: "standard",
            coord_names: ("latitude", "longitude"),
            trend_per_century: 0.0,
        },
        RunSpec {
            activity: "ScenarioMIP",
            institution: "MICRO",
            model: "MicroGCM-2",
            experiment: "ssp245",
            member: "r1i1p1f1",
            start_year: 2015,
            end_year: 2100,
            calendar: "standard",
            coord_names: ("latitude", "longitude"),
            trend_per_century: 2.1,
        },
    ];

    for spec in &runs {
        let dir = root.join(spec.model);
        fs::create_dir_all(&dir)?;
        let filename = format!(
            "tas_Amon_{}_{}_{}_gn.nc",
            spec.model, spec.experiment, spec.member
        );
        let path = dir.join(filename);
        write_run(&path, spec)?;
        println!(
            "   ✅ {} ({} {}-{})",
            path.display(),
            spec.experiment,
            spec.start_year,
            spec.end_year
        );
    }

    println!("\n✅ Sample archive ready: {} runs", runs.len());
    println!("\n🧪 Process it with:");
    println!("   cargo run -- --archive sample_archive --scenarios ssp245,ssp585");

    Ok(())
}

/// Days since 1850-01-01 for the middle of a month, in the run's calendar
fn mid_month_offset(year: i32, month: u32, calendar: &str) -> f64 {
    match calendar {
        "noleap" => {
            let days = i64::from(year - 1850) * 365 + CUM_DAYS_365[(month - 1) as usize] + 15;
            days as f64
        }
        _ => {
            let base = NaiveDate::from_ymd_opt(1850, 1, 1).unwrap();
            let date = NaiveDate::from_ymd_opt(year, month, 15).unwrap();
            date.signed_duration_since(base).num_days() as f64
        }
    }
}

fn write_run(path: &Path, spec: &RunSpec) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        fs::remove_file(path)?;
    }

    let mut file = create(path)?;

    // CMIP6 identity and filter attributes
    file.add_attribute("activity_id", spec.activity)?;
    file.add_attribute("institution_id", spec.institution)?;
    file.add_attribute("source_id", spec.model)?;
    file.add_attribute("experiment_id", spec.experiment)?;
    file.add_attribute("variant_label", spec.member)?;
    file.add_attribute("grid_label", "gn")?;
    file.add_attribute("variable_id", "tas")?;
    file.add_attribute("frequency", "mon")?;
    file.add_attribute("title", format!("{} {} sample run", spec.model, spec.experiment))?;

    let n_years = (spec.end_year - spec.start_year + 1) as usize;
    let n_time = n_years * 12;
    let (lat_name, lon_name) = spec.coord_names;

    file.add_dimension("time", n_time)?;
    file.add_dimension(lat_name, LATS.len())?;
    file.add_dimension(lon_name, N_LON)?;

    {
        let mut time_var = file.add_variable::<f64>("time", &["time"])?;
        time_var.put_attribute("units", "days since 1850-01-01")?;
        time_var.put_attribute("calendar", spec.calendar)?;
        time_var.put_attribute("long_name", "time")?;

        let mut time_data = Vec::with_capacity(n_time);
        for year in spec.start_year..=spec.end_year {
            for month in 1..=12 {
                time_data.push(mid_month_offset(year, month, spec.calendar));
            }
        }
        time_var.put(Array1::from(time_data).view(), ..)?;
    }

    {
        let mut lat_var = file.add_variable::<f64>(lat_name, &[lat_name])?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put_attribute("long_name", "latitude")?;
        lat_var.put(Array1::from(LATS.to_vec()).view(), ..)?;
    }

    {
        let mut lon_var = file.add_variable::<f64>(lon_name, &[lon_name])?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put_attribute("long_name", "longitude")?;
        let lons: Vec<f64> = (0..N_LON).map(|i| -157.5 + i as f64 * 45.0).collect();
        lon_var.put(Array1::from(lons).view(), ..)?;
    }

    {
        let mut tas_var = file.add_variable::<f32>("tas", &["time", lat_name, lon_name])?;
        tas_var.put_attribute("units", "K")?;
        tas_var.put_attribute("long_name", "Near-Surface Air Temperature")?;
        tas_var.put_attribute("standard_name", "air_temperature")?;
        tas_var.put_attribute("_FillValue", -999.0f32)?;

        let mut data = Vec::with_capacity(n_time * LATS.len() * N_LON);
        for step in 0..n_time {
            let month = step % 12;
            let years_elapsed = step as f64 / 12.0;
            let seasonal = 5.0 * (month as f64 * std::f64::consts::PI / 6.0).cos();
            let warming = spec.trend_per_century * years_elapsed / 100.0;

            for &lat in &LATS {
                let lat_effect = -25.0 * (lat.abs() / 90.0);
                for lon_idx in 0..N_LON {
                    // Small zonal wobble so the field is not constant
                    let zonal = 0.5 * (lon_idx as f64 * std::f64::consts::PI / 4.0).sin();
                    let value = 287.0 + lat_effect + seasonal + warming + zonal;
                    data.push(value as f32);
                }
            }
        }

        let array = Array1::from(data)
            .into_shape((n_time, LATS.len(), N_LON))
            .unwrap();
        tas_var.put(array.view(), ..)?;
    }

    Ok(())
}
