// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Calendar arithmetic for activity cycles, calendar months and the
//! operational "today".

use crate::error::DomainError;
use chrono::{Datelike, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, OffsetDateTime};

/// An inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    /// First day, inclusive.
    pub start: Date,
    /// Last day, inclusive.
    pub end: Date,
}

impl DateSpan {
    /// Returns whether `date` falls inside the span, bounds included.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Computes the activity cycle containing `date`.
///
/// A cycle runs from `start_day` of one month to `start_day - 1` of the next.
/// With the default start day of 10, 2026-03-15 lies in 2026-03-10..=2026-04-09
/// and 2026-03-05 lies in 2026-02-10..=2026-03-09.
///
/// # Arguments
///
/// * `date` - Any day inside the wanted cycle
/// * `start_day` - Day of month on which cycles start (2..=28)
///
/// # Errors
///
/// Returns an error if a boundary date cannot be represented.
pub fn activity_cycle(date: Date, start_day: u8) -> Result<DateSpan, DomainError> {
    let (start_year, start_month): (i32, Month) = if date.day() >= start_day {
        (date.year(), date.month())
    } else {
        previous_month(date.year(), date.month())
    };
    let (end_year, end_month): (i32, Month) = next_month(start_year, start_month);

    let start: Date = Date::from_calendar_date(start_year, start_month, start_day)
        .map_err(|_| DomainError::DateArithmeticOverflow)?;
    let end: Date = Date::from_calendar_date(end_year, end_month, start_day - 1)
        .map_err(|_| DomainError::DateArithmeticOverflow)?;

    Ok(DateSpan { start, end })
}

/// Computes the calendar month containing `date`.
///
/// # Errors
///
/// Returns an error if a boundary date cannot be represented.
pub fn calendar_month(date: Date) -> Result<DateSpan, DomainError> {
    let last_day: u8 = date.month().length(date.year());
    let start: Date = Date::from_calendar_date(date.year(), date.month(), 1)
        .map_err(|_| DomainError::DateArithmeticOverflow)?;
    let end: Date = Date::from_calendar_date(date.year(), date.month(), last_day)
        .map_err(|_| DomainError::DateArithmeticOverflow)?;
    Ok(DateSpan { start, end })
}

/// Returns whether both dates fall in the same calendar month.
#[must_use]
pub fn same_month(a: Date, b: Date) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Returns the day after `date`.
///
/// # Errors
///
/// Returns an error at the end of the representable calendar.
pub fn next_day(date: Date) -> Result<Date, DomainError> {
    date.next_day().ok_or(DomainError::DateArithmeticOverflow)
}

/// Whole days from `today` until `date`; negative for past dates.
#[must_use]
pub fn days_until(today: Date, date: Date) -> i64 {
    (date - today).whole_days()
}

/// Resolves the calendar date of `now` in the operational timezone.
///
/// Lead-time and past-date checks compare against the local day where the
/// operations take place, not the UTC day of the server clock.
///
/// # Errors
///
/// Returns an error if the timezone is unknown or the instant cannot be
/// represented.
pub fn operational_today(now: OffsetDateTime, timezone: &str) -> Result<Date, DomainError> {
    let tz: Tz = timezone
        .parse::<Tz>()
        .map_err(|_| DomainError::InvalidTimezone(timezone.to_string()))?;

    let utc = Utc
        .timestamp_opt(now.unix_timestamp(), 0)
        .single()
        .ok_or(DomainError::DateArithmeticOverflow)?;
    let local: chrono::NaiveDate = utc.with_timezone(&tz).date_naive();

    let month_number: u8 =
        u8::try_from(local.month()).map_err(|_| DomainError::DateArithmeticOverflow)?;
    let day: u8 = u8::try_from(local.day()).map_err(|_| DomainError::DateArithmeticOverflow)?;
    let month: Month =
        Month::try_from(month_number).map_err(|_| DomainError::DateArithmeticOverflow)?;

    Date::from_calendar_date(local.year(), month, day)
        .map_err(|_| DomainError::DateArithmeticOverflow)
}

/// Shifts `date` by a signed number of days.
///
/// # Errors
///
/// Returns an error if the result cannot be represented.
pub fn shift_days(date: Date, days: i64) -> Result<Date, DomainError> {
    date.checked_add(Duration::days(days))
        .ok_or(DomainError::DateArithmeticOverflow)
}

const fn next_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::December => (year + 1, Month::January),
        other => (year, other.next()),
    }
}

const fn previous_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::January => (year - 1, Month::December),
        other => (year, other.previous()),
    }
}
