//! Month arithmetic shared by settlement and recurrence calculations.
//!
//! Every helper clamps to the real length of the target month, so February,
//! leap years, and 30-day months never produce an invalid date.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, TimeZone};

/// Normalizes a point in time to the calendar day it falls on.
pub trait StartOfDay {
    fn start_of_day(&self) -> NaiveDate;
}

impl StartOfDay for NaiveDate {
    fn start_of_day(&self) -> NaiveDate {
        *self
    }
}

impl StartOfDay for NaiveDateTime {
    fn start_of_day(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> StartOfDay for DateTime<Tz> {
    fn start_of_day(&self) -> NaiveDate {
        self.date_naive()
    }
}

/// Returns the number of days in `month` of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Returns the last calendar day of the month containing `date`.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let last = days_in_month(date.year(), date.month());
    date.with_day(last).unwrap_or(date)
}

/// Returns the first calendar day of the month containing `date`.
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Adds whole months, clamping the day to the target month's length
/// (`2024-01-31 + 1 month == 2024-02-29`).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

/// Adds whole years, clamping Feb 29 to Feb 28 in non-leap years.
pub fn add_years(date: NaiveDate, years: u32) -> NaiveDate {
    add_months(date, years.saturating_mul(12))
}

/// Moves `date` to `day` within the same month. A day of 31 or more, or one
/// past the month's length, snaps to the last day of that month.
pub fn set_day_with_month_end_fallback(date: NaiveDate, day: u32) -> NaiveDate {
    let last = days_in_month(date.year(), date.month());
    let target = if day >= 31 || day > last {
        last
    } else {
        day.max(1)
    };
    date.with_day(target).unwrap_or(date)
}

/// Moves `date` into `month` of the same year, keeping the first of the month.
pub fn with_month_start(date: NaiveDate, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or_else(|| first_day_of_month(date))
}
