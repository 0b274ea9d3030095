//! Calendar-aware time handling for CMIP6 archives
//!
//! CMIP6 time coordinates are numeric offsets from a base date, described by CF
//! `units` (e.g. `"days since 1850-01-01"`) and `calendar` attributes. Models
//! publish on several calendars (standard, noleap, 360_day, ...), so decoding
//! cannot assume Gregorian month lengths. This module decodes such axes into
//! [`YearMonth`] stamps, the resolution everything downstream (windowing,
//! climatology, splicing, annual means) operates at.

use crate::errors::{GmstError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Cumulative days before each month in a 365-day year
const CUM_DAYS_365: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Cumulative days before each month in a 366-day year
const CUM_DAYS_366: [i64; 12] = [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];

/// One calendar month of a specific year, the time resolution of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based month (1 = January)
    pub month: u32,
}

impl YearMonth {
    /// Create a stamp, rejecting months outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The following calendar month
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Total month count since year 0, used for gap and ordering checks
    pub fn month_index(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    fn from_month_index(index: i64) -> Option<Self> {
        let year = i32::try_from(index.div_euclid(12)).ok()?;
        let month = (index.rem_euclid(12) + 1) as u32;
        Some(Self { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive range of calendar years, e.g. the analysis window or reference period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: i32, end: i32) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Whether a year falls inside the range (inclusive on both ends)
    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for YearRange {
    type Err = String;

    /// Parse a `<start>:<end>` specification such as `1850:1900`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [start, end] => {
                let start = start
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| format!("Invalid start year '{}'", start))?;
                let end = end
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| format!("Invalid end year '{}'", end))?;
                YearRange::new(start, end)
                    .ok_or_else(|| format!("Start year {} is after end year {}", start, end))
            }
            _ => Err("Invalid format: Expected '<start>:<end>', e.g. '1850:1900'".to_string()),
        }
    }
}

/// CF calendar systems used by CMIP6 models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfCalendar {
    /// Mixed Julian/Gregorian; treated as proleptic Gregorian, which is
    /// identical for all dates this pipeline handles (1582 onward)
    Standard,
    ProlepticGregorian,
    /// Every year has 365 days (no February 29)
    NoLeap,
    /// Every year has 366 days
    AllLeap,
    /// Twelve 30-day months
    Day360,
}

impl CfCalendar {
    /// Parse a CF `calendar` attribute value, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "standard" | "gregorian" => Some(Self::Standard),
            "proleptic_gregorian" => Some(Self::ProlepticGregorian),
            "noleap" | "365_day" => Some(Self::NoLeap),
            "all_leap" | "366_day" => Some(Self::AllLeap),
            "360_day" => Some(Self::Day360),
            _ => None,
        }
    }

    /// CF attribute spelling of the calendar
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ProlepticGregorian => "proleptic_gregorian",
            Self::NoLeap => "noleap",
            Self::AllLeap => "all_leap",
            Self::Day360 => "360_day",
        }
    }
}

/// Step unit of a CF time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Months,
}

impl TimeUnit {
    fn parse(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "second" | "seconds" | "sec" | "secs" | "s" => Some(Self::Seconds),
            "minute" | "minutes" | "min" | "mins" => Some(Self::Minutes),
            "hour" | "hours" | "hr" | "hrs" | "h" => Some(Self::Hours),
            "day" | "days" | "d" => Some(Self::Days),
            "month" | "months" => Some(Self::Months),
            _ => None,
        }
    }

    fn seconds_per_step(self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3_600.0,
            Self::Days => 86_400.0,
            // Months are handled by index arithmetic, never via seconds
            Self::Months => f64::NAN,
        }
    }
}

/// Parsed form of a CF `units` attribute (`"<unit> since <date>"`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CfTimeUnits {
    unit: TimeUnit,
    base_year: i32,
    base_month: u32,
    base_day: u32,
}

impl CfTimeUnits {
    /// Parse a `units` string such as `"days since 1850-01-01"` or
    /// `"hours since 1850-1-1 00:00:00"`.
    ///
    /// The optional time-of-day suffix is ignored; month stamps never depend
    /// on sub-day precision for the offsets CMIP6 archives carry.
    ///
    /// # Errors
    ///
    /// Returns `TimeDecode` if the unit token, the `since` keyword, or the
    /// base date cannot be interpreted.
    pub fn parse(units: &str) -> Result<Self> {
        let tokens: Vec<&str> = units.split_whitespace().collect();
        if tokens.len() < 3 || !tokens[1].eq_ignore_ascii_case("since") {
            return Err(GmstError::TimeDecode {
                message: format!("Expected '<unit> since <date>', got '{}'", units),
            });
        }

        let unit = TimeUnit::parse(tokens[0]).ok_or_else(|| GmstError::TimeDecode {
            message: format!("Unsupported time unit '{}'", tokens[0]),
        })?;

        // The date token may carry a T-separated time suffix ("1850-01-01T00:00:00Z")
        let date_token = tokens[2].split('T').next().unwrap_or(tokens[2]);
        let date_parts: Vec<&str> = date_token.split('-').collect();
        if date_parts.len() != 3 {
            return Err(GmstError::TimeDecode {
                message: format!("Invalid base date '{}' in units '{}'", tokens[2], units),
            });
        }

        let parse_part = |part: &str, what: &str| -> Result<i64> {
            part.parse::<i64>().map_err(|_| GmstError::TimeDecode {
                message: format!("Invalid {} '{}' in units '{}'", what, part, units),
            })
        };

        let base_year = parse_part(date_parts[0], "year")? as i32;
        let base_month = parse_part(date_parts[1], "month")? as u32;
        let base_day = parse_part(date_parts[2], "day")? as u32;

        if !(1..=12).contains(&base_month) || !(1..=31).contains(&base_day) {
            return Err(GmstError::TimeDecode {
                message: format!("Base date '{}' is out of range", date_token),
            });
        }

        Ok(Self {
            unit,
            base_year,
            base_month,
            base_day,
        })
    }
}

/// Decodes a numeric CF time axis into one [`YearMonth`] per step.
///
/// # Arguments
///
/// * `values` - Raw time coordinate values from the dataset
/// * `units` - Parsed `units` attribute
/// * `calendar` - Calendar the offsets are expressed in
///
/// # Errors
///
/// Returns `TimeDecode` if a value is not finite or falls outside the
/// representable date range of the calendar arithmetic.
pub fn decode_time_axis(
    values: &[f64],
    units: &CfTimeUnits,
    calendar: CfCalendar,
) -> Result<Vec<YearMonth>> {
    values
        .iter()
        .map(|&value| decode_step(value, units, calendar))
        .collect()
}

fn decode_step(value: f64, units: &CfTimeUnits, calendar: CfCalendar) -> Result<YearMonth> {
    if !value.is_finite() {
        return Err(GmstError::TimeDecode {
            message: format!("Non-finite time coordinate value {}", value),
        });
    }

    if units.unit == TimeUnit::Months {
        let base = YearMonth::new(units.base_year, units.base_month).ok_or_else(|| {
            GmstError::TimeDecode {
                message: format!("Invalid base month {}", units.base_month),
            }
        })?;
        let steps = value.floor() as i64;
        let index = base
            .month_index()
            .checked_add(steps)
            .ok_or_else(|| offset_overflow(steps, "months"))?;
        return YearMonth::from_month_index(index).ok_or_else(|| offset_overflow(steps, "months"));
    }

    let days = value * units.unit.seconds_per_step() / 86_400.0;
    let whole_days = days.floor() as i64;

    match calendar {
        CfCalendar::Standard | CfCalendar::ProlepticGregorian => {
            let base = NaiveDate::from_ymd_opt(units.base_year, units.base_month, units.base_day)
                .ok_or_else(|| GmstError::TimeDecode {
                message: format!(
                    "Invalid base date {:04}-{:02}-{:02}",
                    units.base_year, units.base_month, units.base_day
                ),
            })?;
            // Duration::days panics beyond its own bound, so go through the
            // fallible constructor
            let delta =
                Duration::try_days(whole_days).ok_or_else(|| offset_overflow(whole_days, "days"))?;
            let date = base
                .checked_add_signed(delta)
                .ok_or_else(|| offset_overflow(whole_days, "days"))?;
            Ok(YearMonth {
                year: date.year(),
                month: date.month(),
            })
        }
        CfCalendar::NoLeap => fixed_year_date(units, whole_days, 365, &CUM_DAYS_365),
        CfCalendar::AllLeap => fixed_year_date(units, whole_days, 366, &CUM_DAYS_366),
        CfCalendar::Day360 => {
            let base_ordinal = i64::from(units.base_year) * 360
                + i64::from(units.base_month - 1) * 30
                + i64::from(units.base_day - 1);
            let total = base_ordinal
                .checked_add(whole_days)
                .ok_or_else(|| offset_overflow(whole_days, "days"))?;
            let year = i32::try_from(total.div_euclid(360))
                .map_err(|_| offset_overflow(whole_days, "days"))?;
            let day_of_year = total.rem_euclid(360);
            Ok(YearMonth {
                year,
                month: (day_of_year / 30 + 1) as u32,
            })
        }
    }
}

/// Date arithmetic for calendars where every year has the same length
fn fixed_year_date(
    units: &CfTimeUnits,
    whole_days: i64,
    year_len: i64,
    cum_days: &[i64; 12],
) -> Result<YearMonth> {
    let month_idx = (units.base_month - 1) as usize;
    let base_ordinal =
        i64::from(units.base_year) * year_len + cum_days[month_idx] + i64::from(units.base_day - 1);
    let total = base_ordinal
        .checked_add(whole_days)
        .ok_or_else(|| offset_overflow(whole_days, "days"))?;
    let year = i32::try_from(total.div_euclid(year_len))
        .map_err(|_| offset_overflow(whole_days, "days"))?;
    let day_of_year = total.rem_euclid(year_len);

    let month = cum_days
        .iter()
        .rposition(|&cum| cum <= day_of_year)
        .unwrap_or(0)
        + 1;

    Ok(YearMonth {
        year,
        month: month as u32,
    })
}

fn offset_overflow(amount: i64, unit: &str) -> GmstError {
    GmstError::TimeDecode {
        message: format!("Time offset {} {} overflows the calendar", amount, unit),
    }
}

/// Checks that month stamps advance by exactly one month per step.
///
/// Splicing and annual resampling assume a dense monthly axis.
pub fn is_contiguous_monthly(months: &[YearMonth]) -> bool {
    months
        .windows(2)
        .all(|pair| pair[1].month_index() == pair[0].month_index() + 1)
}

/// Checks that month stamps never repeat or run backward
pub fn is_strictly_increasing(months: &[YearMonth]) -> bool {
    months
        .windows(2)
        .all(|pair| pair[1].month_index() > pair[0].month_index())
}
