//! Unit tests for time decoding, run identity, statistics and configuration
//!
//! These cover the pure logic of the pipeline stages; file-backed behavior
//! lives in the integration tests.

use ndarray::Array3;
use ru_gmst::{
    errors::GmstError,
    parallel::{get_parallel_info, ParallelConfig},
    run_id::RunId,
    series::{GlobalMeanSeries, GriddedField, SplicedSeries},
    stats::{
        anomaly::{annual_means, rebase_to_reference, subtract_climatology, MonthlyClimatology},
        global_mean, latitude_weights,
    },
    time::{
        decode_time_axis, is_contiguous_monthly, is_strictly_increasing, CfCalendar, CfTimeUnits,
        YearMonth, YearRange,
    },
};

fn ym(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).unwrap()
}

/// A contiguous monthly axis starting in January of `start_year`
fn monthly_axis(start_year: i32, n_months: usize) -> Vec<YearMonth> {
    let mut months = Vec::with_capacity(n_months);
    let mut stamp = ym(start_year, 1);
    for _ in 0..n_months {
        months.push(stamp);
        stamp = stamp.succ();
    }
    months
}

#[test]
fn test_year_month_basics() {
    assert_eq!(ym(1850, 1).to_string(), "1850-01");
    assert_eq!(ym(2100, 12).to_string(), "2100-12");

    // December rolls into the next year
    assert_eq!(ym(1850, 12).succ(), ym(1851, 1));
    assert_eq!(ym(1850, 6).succ(), ym(1850, 7));

    // Month index is dense across year boundaries
    assert_eq!(ym(1850, 12).month_index() + 1, ym(1851, 1).month_index());

    // Rejects out-of-range months
    assert!(YearMonth::new(1850, 0).is_none());
    assert!(YearMonth::new(1850, 13).is_none());

    assert!(ym(1850, 12) < ym(1851, 1));
}

#[test]
fn test_year_range_parsing() {
    let range: YearRange = "1850:1900".parse().unwrap();
    assert_eq!(range.start, 1850);
    assert_eq!(range.end, 1900);
    assert_eq!(range.to_string(), "1850:1900");

    assert!(range.contains(1850));
    assert!(range.contains(1900));
    assert!(!range.contains(1849));
    assert!(!range.contains(1901));

    assert!("1850".parse::<YearRange>().is_err());
    assert!("1850:1900:2000".parse::<YearRange>().is_err());
    assert!("abc:1900".parse::<YearRange>().is_err());
    // Start after end is rejected
    assert!("1900:1850".parse::<YearRange>().is_err());
}

#[test]
fn test_calendar_parsing() {
    assert_eq!(CfCalendar::parse("standard"), Some(CfCalendar::Standard));
    assert_eq!(CfCalendar::parse("gregorian"), Some(CfCalendar::Standard));
    assert_eq!(
        CfCalendar::parse("proleptic_gregorian"),
        Some(CfCalendar::ProlepticGregorian)
    );
    assert_eq!(CfCalendar::parse("noleap"), Some(CfCalendar::NoLeap));
    assert_eq!(CfCalendar::parse("365_day"), Some(CfCalendar::NoLeap));
    assert_eq!(CfCalendar::parse("all_leap"), Some(CfCalendar::AllLeap));
    assert_eq!(CfCalendar::parse("360_day"), Some(CfCalendar::Day360));

    // Case-insensitive with surrounding whitespace
    assert_eq!(CfCalendar::parse(" NOLEAP "), Some(CfCalendar::NoLeap));

    assert_eq!(CfCalendar::parse("julian"), None);
    assert_eq!(CfCalendar::parse(""), None);
}

#[test]
fn test_time_units_parsing() {
    assert!(CfTimeUnits::parse("days since 1850-01-01").is_ok());
    assert!(CfTimeUnits::parse("hours since 1850-1-1 00:00:00").is_ok());
    assert!(CfTimeUnits::parse("seconds since 2000-01-01T00:00:00Z").is_ok());
    assert!(CfTimeUnits::parse("months since 1850-01-01").is_ok());

    assert!(CfTimeUnits::parse("fortnights since 1850-01-01").is_err());
    assert!(CfTimeUnits::parse("days until 1850-01-01").is_err());
    assert!(CfTimeUnits::parse("days since").is_err());
    assert!(CfTimeUnits::parse("days since 1850-13-01").is_err());
    assert!(CfTimeUnits::parse("garbage").is_err());
}

#[test]
fn test_decode_standard_calendar() {
    let units = CfTimeUnits::parse("days since 1850-01-01").unwrap();
    let months = decode_time_axis(&[15.0, 45.0, 74.0, 365.0], &units, CfCalendar::Standard).unwrap();
    assert_eq!(months, vec![ym(1850, 1), ym(1850, 2), ym(1850, 3), ym(1851, 1)]);
}

#[test]
fn test_decode_hours_unit() {
    let units = CfTimeUnits::parse("hours since 1850-1-1 00:00:00").unwrap();
    // 31 days of hours lands on the first of February
    let months = decode_time_axis(&[0.0, 744.0], &units, CfCalendar::Standard).unwrap();
    assert_eq!(months, vec![ym(1850, 1), ym(1850, 2)]);
}

#[test]
fn test_decode_noleap_calendar() {
    let units = CfTimeUnits::parse("days since 1850-01-01").unwrap();

    // One noleap year is exactly 365 days, even across real leap years
    let months = decode_time_axis(&[0.0, 365.0, 3650.0], &units, CfCalendar::NoLeap).unwrap();
    assert_eq!(months, vec![ym(1850, 1), ym(1851, 1), ym(1860, 1)]);

    // 150 noleap years plus the days before mid-March
    let offset = (150 * 365 + 59 + 15) as f64;
    let months = decode_time_axis(&[offset], &units, CfCalendar::NoLeap).unwrap();
    assert_eq!(months, vec![ym(2000, 3)]);
}

#[test]
fn test_decode_360_day_calendar() {
    let units = CfTimeUnits::parse("days since 1850-01-01").unwrap();
    let months = decode_time_axis(&[0.0, 195.0, 360.0], &units, CfCalendar::Day360).unwrap();
    assert_eq!(months, vec![ym(1850, 1), ym(1850, 7), ym(1851, 1)]);
}

#[test]
fn test_decode_months_unit() {
    let units = CfTimeUnits::parse("months since 1850-01-01").unwrap();
    let months = decode_time_axis(&[0.0, 13.0], &units, CfCalendar::Standard).unwrap();
    assert_eq!(months, vec![ym(1850, 1), ym(1851, 2)]);
}

#[test]
fn test_decode_rejects_non_finite() {
    let units = CfTimeUnits::parse("days since 1850-01-01").unwrap();
    let result = decode_time_axis(&[f64::NAN], &units, CfCalendar::Standard);
    assert!(matches!(result, Err(GmstError::TimeDecode { .. })));
}

#[test]
fn test_decode_rejects_absurd_offsets() {
    // An offset far beyond any representable date must come back as a
    // decode error on every calendar, never a panic
    let days = CfTimeUnits::parse("days since 1850-01-01").unwrap();
    for calendar in [
        CfCalendar::Standard,
        CfCalendar::NoLeap,
        CfCalendar::AllLeap,
        CfCalendar::Day360,
    ] {
        let result = decode_time_axis(&[1.0e300], &days, calendar);
        assert!(
            matches!(result, Err(GmstError::TimeDecode { .. })),
            "calendar {} accepted an absurd offset",
            calendar.as_str()
        );
    }

    let months = CfTimeUnits::parse("months since 1850-01-01").unwrap();
    let result = decode_time_axis(&[1.0e300], &months, CfCalendar::Standard);
    assert!(matches!(result, Err(GmstError::TimeDecode { .. })));
}

#[test]
fn test_axis_checks() {
    let dense = monthly_axis(1850, 24);
    assert!(is_contiguous_monthly(&dense));
    assert!(is_strictly_increasing(&dense));

    let gapped = vec![ym(1850, 1), ym(1850, 3)];
    assert!(!is_contiguous_monthly(&gapped));
    assert!(is_strictly_increasing(&gapped));

    let duplicated = vec![ym(1850, 1), ym(1850, 1)];
    assert!(!is_contiguous_monthly(&duplicated));
    assert!(!is_strictly_increasing(&duplicated));

    assert!(is_contiguous_monthly(&[]));
    assert!(is_contiguous_monthly(&[ym(1850, 1)]));
}

#[test]
fn test_run_id_display_and_classification() {
    let historical = RunId::new("CMIP", "TEST", "TinyESM-1", "historical", "r1i1p1f1", "gn");
    let scenario = RunId::new("ScenarioMIP", "TEST", "TinyESM-1", "ssp585", "r1i1p1f1", "gn");

    assert_eq!(
        historical.to_string(),
        "CMIP.TEST.TinyESM-1.historical.r1i1p1f1.gn"
    );
    assert!(historical.is_historical());
    assert!(!historical.is_scenario());
    assert!(scenario.is_scenario());
    assert!(!scenario.is_historical());

    assert_eq!(scenario.splice_label(), "TinyESM-1.ssp585.r1i1p1f1");
}

#[test]
fn test_run_id_parsing() {
    let id: RunId = "CMIP.MOHC.UKESM1-0-LL.historical.r1i1p1f1.gn"
        .parse()
        .unwrap();
    assert_eq!(id.activity, "CMIP");
    assert_eq!(id.model, "UKESM1-0-LL");
    assert_eq!(id.experiment, "historical");

    // Display and parse are inverses
    assert_eq!(id.to_string().parse::<RunId>().unwrap(), id);

    assert!("only.three.fields".parse::<RunId>().is_err());
    assert!("a.b..d.e.f".parse::<RunId>().is_err());
    assert!("".parse::<RunId>().is_err());
}

#[test]
fn test_error_types() {
    // NetCDF error conversion
    let netcdf_err = GmstError::NetCDFError(netcdf::Error::NotFound("test".to_string()));
    assert!(format!("{}", netcdf_err).contains("NetCDF error"));

    let no_match = GmstError::NoMatchingHistoricalRun {
        run: "ScenarioMIP.TEST.M.ssp585.r1i1p1f1.gn".to_string(),
    };
    assert!(format!("{}", no_match).contains("No historical run matches"));

    let ambiguous = GmstError::AmbiguousHistoricalMatch {
        run: "ScenarioMIP.TEST.M.ssp585.r1i1p1f1.gn".to_string(),
        candidates: vec!["a".to_string(), "b".to_string()],
    };
    let text = format!("{}", ambiguous);
    assert!(text.contains("a"));
    assert!(text.contains("b"));

    let empty_window = GmstError::EmptyReferenceWindow {
        label: "M.ssp585.r1i1p1f1".to_string(),
        window: "1850:1900".to_string(),
    };
    assert!(format!("{}", empty_window).contains("1850:1900"));

    let generic = GmstError::Generic("plain message".to_string());
    assert_eq!(format!("{}", generic), "plain message");
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::default();
    assert!(default_config.num_threads.is_none());

    let config_4 = ParallelConfig::new(Some(4));
    assert_eq!(config_4.num_threads, Some(4));

    let all_cores = ParallelConfig::all_cores();
    assert!(all_cores.num_threads.unwrap() > 0);

    let info = get_parallel_info();
    assert!(info.current_threads > 0);
    assert!(info.available_cores > 0);
    info.print_info();
}

#[test]
fn test_latitude_weights() {
    let weights = latitude_weights(&[0.0, 60.0, -60.0]);
    assert!((weights[0] - 1.0).abs() < 1e-12);
    assert!((weights[1] - 0.5).abs() < 1e-12);
    assert!((weights[2] - 0.5).abs() < 1e-12);

    // Poles carry effectively no area
    let polar = latitude_weights(&[90.0, -90.0]);
    assert!(polar[0].abs() < 1e-12);
    assert!(polar[1].abs() < 1e-12);
}

#[test]
fn test_global_mean_constant_field() {
    // A spatially uniform field reduces to exactly its value, whatever
    // the grid resolution
    for (n_lat, n_lon) in [(1, 1), (2, 3), (5, 9), (17, 33), (64, 128)] {
        let n_time = 24;
        let months = monthly_axis(1850, n_time);
        let lats: Vec<f64> = (0..n_lat)
            .map(|j| -90.0 + 180.0 * (j as f64 + 0.5) / n_lat as f64)
            .collect();
        let lons: Vec<f64> = (0..n_lon)
            .map(|k| -180.0 + 360.0 * k as f64 / n_lon as f64)
            .collect();
        let data = Array3::from_elem((n_time, n_lat, n_lon), 288.0_f32);

        let field = GriddedField::new(data, months, lats, lons, "K".to_string()).unwrap();
        let series = global_mean(&field).unwrap();

        assert_eq!(series.len(), n_time);
        for &value in &series.values {
            assert!(
                (value - 288.0).abs() < 1e-9,
                "{}x{} grid drifted to {}",
                n_lat,
                n_lon,
                value
            );
        }
    }
}

#[test]
fn test_global_mean_weights_by_latitude() {
    // Two bands at 0N and 60N with cosine weights 1 and 0.5. Band values
    // 10 and 4 give (10 * 1 + 4 * 0.5) / 1.5 = 8, offset by t per step.
    let n_time = 3;
    let months = monthly_axis(2000, n_time);
    let lats = vec![0.0, 60.0];
    let lons = vec![-135.0, -45.0, 45.0, 135.0];
    let data = Array3::from_shape_fn((n_time, 2, 4), |(t, j, _)| {
        let band = if j == 0 { 10.0 } else { 4.0 };
        t as f32 + band
    });

    let field = GriddedField::new(data, months, lats, lons, "K".to_string()).unwrap();
    let series = global_mean(&field).unwrap();

    for (t, &value) in series.values.iter().enumerate() {
        assert!((value - (t as f64 + 8.0)).abs() < 1e-9);
    }
}

#[test]
fn test_climatology_of_periodic_signal_is_the_signal() {
    let months = monthly_axis(1850, 48);
    let values: Vec<f64> = (0..48).map(|i| (i % 12) as f64).collect();

    let climatology = MonthlyClimatology::from_series(&months, &values);
    for month in 1..=12 {
        assert!((climatology.value_for(month) - (month - 1) as f64).abs() < 1e-12);
    }

    // Subtracting the climatology from a perfectly periodic series leaves
    // an all-zero anomaly
    let anomalies = subtract_climatology(&months, &values, &climatology);
    assert!(anomalies.iter().all(|a| a.abs() < 1e-12));
}

#[test]
fn test_climatology_skips_non_finite() {
    let months = monthly_axis(1850, 24);
    let mut values: Vec<f64> = vec![2.0; 24];
    values[0] = f64::NAN;
    values[12] = 4.0;

    let climatology = MonthlyClimatology::from_series(&months, &values);
    // January: only the finite 4.0 remains
    assert!((climatology.value_for(1) - 4.0).abs() < 1e-12);
    // February: both years finite
    assert!((climatology.value_for(2) - 2.0).abs() < 1e-12);
}

#[test]
fn test_rebase_zeroes_the_reference_window() {
    // Ten years: 2.0 for the first five, 4.0 after
    let months = monthly_axis(1850, 120);
    let values: Vec<f64> = months
        .iter()
        .map(|m| if m.year < 1855 { 2.0 } else { 4.0 })
        .collect();

    let reference = YearRange::new(1850, 1854).unwrap();
    let rebased = rebase_to_reference("test", &months, &values, reference).unwrap();

    // Mean over the reference window is exactly zero
    let window_sum: f64 = months
        .iter()
        .zip(rebased.iter())
        .filter(|(m, _)| reference.contains(m.year))
        .map(|(_, v)| v)
        .sum();
    assert!(window_sum.abs() < 1e-9);

    // Everything after the step sits at +2
    assert!((rebased[119] - 2.0).abs() < 1e-12);
}

#[test]
fn test_rebase_fails_on_empty_window() {
    let months = monthly_axis(1850, 12);
    let values = vec![1.0; 12];
    let reference = YearRange::new(1700, 1710).unwrap();

    let result = rebase_to_reference("M.ssp585.r1i1p1f1", &months, &values, reference);
    match result {
        Err(GmstError::EmptyReferenceWindow { label, window }) => {
            assert_eq!(label, "M.ssp585.r1i1p1f1");
            assert_eq!(window, "1700:1710");
        }
        _ => panic!("Expected EmptyReferenceWindow error"),
    }
}

#[test]
fn test_annual_means() {
    let months = monthly_axis(1850, 24);
    let values: Vec<f64> = (0..24).map(|i| i as f64).collect();

    let (years, means) = annual_means(&months, &values);
    assert_eq!(years, vec![1850, 1851]);
    // (0 + 1 + ... + 11) / 12 and (12 + ... + 23) / 12
    assert!((means[0] - 5.5).abs() < 1e-12);
    assert!((means[1] - 17.5).abs() < 1e-12);
}

#[test]
fn test_annual_means_with_gaps() {
    let months = monthly_axis(1850, 24);
    let mut values: Vec<f64> = vec![1.0; 24];
    // First year: half the months missing, mean of the rest
    for i in 0..6 {
        values[i] = f64::NAN;
    }
    // Second year: nothing finite at all
    for i in 12..24 {
        values[i] = f64::NAN;
    }

    let (years, means) = annual_means(&months, &values);
    assert_eq!(years, vec![1850, 1851]);
    assert!((means[0] - 1.0).abs() < 1e-12);
    assert!(means[1].is_nan());
}

#[test]
fn test_series_length_invariant() {
    let months = monthly_axis(1850, 12);
    let result = GlobalMeanSeries::new(months, vec![1.0; 11], "K".to_string());
    assert!(matches!(result, Err(GmstError::StatisticsError(_))));

    let series = GlobalMeanSeries::new(monthly_axis(1850, 12), vec![1.0; 12], "K".to_string());
    let series = series.unwrap();
    assert_eq!(series.len(), 12);
    assert!(!series.is_empty());
    assert_eq!(series.span(), Some((ym(1850, 1), ym(1850, 12))));
}

#[test]
fn test_spliced_series_span() {
    let months = monthly_axis(1850, 24);
    let series = SplicedSeries {
        label: "M.ssp585.r1i1p1f1".to_string(),
        scenario: RunId::new("ScenarioMIP", "T", "M", "ssp585", "r1i1p1f1", "gn"),
        historical: RunId::new("CMIP", "T", "M", "historical", "r1i1p1f1", "gn"),
        months: months.clone(),
        values: vec![0.0; 24],
        units: "K".to_string(),
    };
    assert_eq!(series.span(), Some((ym(1850, 1), ym(1851, 12))));
    assert_eq!(series.len(), 24);
}
