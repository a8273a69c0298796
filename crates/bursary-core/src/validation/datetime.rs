//! Compound date/time rule.
//!
//! Checks run in a fixed order and the first failure wins:
//! format → leap year → calendar → time range → timezone → bounds.
//! Every function here is pure; the same input always yields the same result.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The only accepted textual layout, as a `chrono` format string.
pub const CANONICAL_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// Default distance into the future a bounded date may lie.
pub const DEFAULT_HORIZON_YEARS: u32 = 5;

/// Why a date/time field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DateTimeErrorKind {
    Required,
    InvalidFormat,
    InvalidLeapYear,
    InvalidDate,
    InvalidTime,
    InvalidTimezone,
    PastDate,
    FutureDate,
}

impl DateTimeErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::InvalidFormat => "invalid_format",
            Self::InvalidLeapYear => "invalid_leap_year",
            Self::InvalidDate => "invalid_date",
            Self::InvalidTime => "invalid_time",
            Self::InvalidTimezone => "invalid_timezone",
            Self::PastDate => "past_date",
            Self::FutureDate => "future_date",
        }
    }

    /// User-facing message. `horizon_years` only appears in `future_date`.
    #[must_use]
    pub fn message(self, horizon_years: u32) -> String {
        match self {
            Self::Required => "This field is required.".into(),
            Self::InvalidFormat => "Invalid date format. Use YYYY-MM-DD HH:MM:SS.".into(),
            Self::InvalidLeapYear => "February 29 is only valid in leap years.".into(),
            Self::InvalidDate => "Invalid date values.".into(),
            Self::InvalidTime => "Invalid time values.".into(),
            Self::InvalidTimezone => {
                "This time does not exist or is ambiguous in the configured timezone.".into()
            }
            Self::PastDate => "Date must be in the future.".into(),
            Self::FutureDate => {
                format!("Date cannot be more than {horizon_years} years in the future.")
            }
        }
    }
}

impl fmt::Display for DateTimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Past/future limits for business dates such as application deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub horizon_years: u32,
}

impl Default for DateBounds {
    fn default() -> Self {
        Self {
            horizon_years: DEFAULT_HORIZON_YEARS,
        }
    }
}

/// Gregorian leap-year rule.
#[must_use]
pub const fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

struct Components {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
}

/// Split `YYYY-MM-DD HH:MM:SS` into numbers without judging their ranges.
fn split_components(raw: &str) -> Option<Components> {
    let bytes = raw.as_bytes();
    if bytes.len() != 19 {
        return None;
    }
    for (i, b) in bytes.iter().enumerate() {
        let ok = match i {
            4 | 7 => *b == b'-',
            10 => *b == b' ',
            13 | 16 => *b == b':',
            _ => b.is_ascii_digit(),
        };
        if !ok {
            return None;
        }
    }

    let num = |range: std::ops::Range<usize>| raw[range].parse::<u32>().ok();
    Some(Components {
        year: raw[0..4].parse().ok()?,
        month: num(5..7)?,
        day: num(8..10)?,
        hour: num(11..13)?,
        minute: num(14..16)?,
        second: num(17..19)?,
    })
}

/// Parse and range-check a canonical string into a naive local date/time.
///
/// The layout is matched exactly; surrounding whitespace is `invalid_format`.
/// Blank input is `required`. Form fields are trimmed by [`DateTimeRule::check`].
///
/// # Errors
///
/// Returns the first failing kind among `required`, `invalid_format`,
/// `invalid_leap_year`, `invalid_date`, and `invalid_time`.
pub fn parse_naive(raw: &str) -> Result<NaiveDateTime, DateTimeErrorKind> {
    if raw.trim().is_empty() {
        return Err(DateTimeErrorKind::Required);
    }

    let c = split_components(raw).ok_or(DateTimeErrorKind::InvalidFormat)?;

    if c.month == 2 && c.day == 29 && !is_leap_year(c.year) {
        return Err(DateTimeErrorKind::InvalidLeapYear);
    }

    let date =
        NaiveDate::from_ymd_opt(c.year, c.month, c.day).ok_or(DateTimeErrorKind::InvalidDate)?;

    if c.hour > 23 || c.minute > 59 || c.second > 59 {
        return Err(DateTimeErrorKind::InvalidTime);
    }
    let time = NaiveTime::from_hms_opt(c.hour, c.minute, c.second)
        .ok_or(DateTimeErrorKind::InvalidTime)?;

    Ok(date.and_time(time))
}

/// Interpret a naive local time in `tz` and convert it to UTC.
///
/// # Errors
///
/// Returns `invalid_timezone` for local times that are skipped or repeated by
/// a DST transition.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, DateTimeErrorKind> {
    tz.from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or(DateTimeErrorKind::InvalidTimezone)
}

/// Reject instants at or before `now`, or beyond the configured horizon.
///
/// # Errors
///
/// Returns `past_date` or `future_date`.
pub fn check_bounds(
    instant: DateTime<Utc>,
    now: DateTime<Utc>,
    bounds: DateBounds,
) -> Result<(), DateTimeErrorKind> {
    if instant <= now {
        return Err(DateTimeErrorKind::PastDate);
    }
    let limit = now.checked_add_months(Months::new(bounds.horizon_years.saturating_mul(12)));
    if limit.is_some_and(|limit| instant > limit) {
        return Err(DateTimeErrorKind::FutureDate);
    }
    Ok(())
}

/// Validate a canonical date/time string and return the UTC instant.
///
/// Applies format, leap-year, calendar, time-range, and timezone checks.
///
/// # Errors
///
/// Returns the kind of the first failing check.
pub fn validate_datetime(raw: &str, tz: Tz) -> Result<DateTime<Utc>, DateTimeErrorKind> {
    localize(parse_naive(raw)?, tz)
}

/// [`validate_datetime`] followed by the past/future business bounds.
///
/// # Errors
///
/// Returns the kind of the first failing check.
pub fn validate_bounded_datetime(
    raw: &str,
    now: DateTime<Utc>,
    tz: Tz,
    bounds: DateBounds,
) -> Result<DateTime<Utc>, DateTimeErrorKind> {
    let instant = validate_datetime(raw, tz)?;
    check_bounds(instant, now, bounds)?;
    Ok(instant)
}

/// How one form field applies the date/time rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTimeRule {
    pub optional: bool,
    pub bounds: Option<DateBounds>,
}

impl DateTimeRule {
    /// Apply the rule. An empty optional field yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the kind of the first failing check.
    pub fn check(
        &self,
        raw: Option<&str>,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> Result<Option<DateTime<Utc>>, DateTimeErrorKind> {
        let raw = raw.map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return if self.optional {
                Ok(None)
            } else {
                Err(DateTimeErrorKind::Required)
            };
        }
        let instant = match self.bounds {
            Some(bounds) => validate_bounded_datetime(raw, now, tz, bounds)?,
            None => validate_datetime(raw, tz)?,
        };
        Ok(Some(instant))
    }
}
