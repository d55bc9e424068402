// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Resolution of a shift's scheduled wall-clock time into an instant.
//!
//! Shifts are entered as a calendar day plus a time of day, in the local
//! time of the properties being serviced. Every time-window rule measures
//! against the resulting UTC instant.

use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use time::{Date, Duration, Month, OffsetDateTime, Time};

use crate::error::DomainError;
use crate::types::Shift;

/// Parses an IANA timezone name.
///
/// # Errors
///
/// Returns `DomainError::InvalidTimezone` if the name is unknown.
pub fn parse_timezone(name: &str) -> Result<Tz, DomainError> {
    name.parse()
        .map_err(|_| DomainError::InvalidTimezone(name.to_string()))
}

/// Combines a date and time of day in `tz` into a UTC instant.
///
/// # Arguments
///
/// * `date` - The local calendar day
/// * `time_of_day` - The local wall-clock time
/// * `tz` - The timezone the wall-clock time is expressed in
///
/// # Errors
///
/// Returns an error if the local time is ambiguous or skipped (DST), or
/// if the result cannot be represented.
pub fn resolve_local_instant(
    date: Date,
    time_of_day: Time,
    tz: Tz,
) -> Result<OffsetDateTime, DomainError> {
    let naive_date: NaiveDate = NaiveDate::from_ymd_opt(
        date.year(),
        u32::from(u8::from(date.month())),
        u32::from(date.day()),
    )
    .ok_or_else(|| DomainError::DateArithmeticOverflow {
        operation: format!("converting date {date}"),
    })?;

    let naive_time: NaiveTime = NaiveTime::from_hms_opt(
        u32::from(time_of_day.hour()),
        u32::from(time_of_day.minute()),
        u32::from(time_of_day.second()),
    )
    .ok_or_else(|| DomainError::DateArithmeticOverflow {
        operation: format!("converting time {time_of_day}"),
    })?;

    let local = tz
        .from_local_datetime(&naive_date.and_time(naive_time))
        .single()
        .ok_or(DomainError::AmbiguousLocalTime {
            date,
            time: time_of_day,
        })?;

    OffsetDateTime::from_unix_timestamp(local.timestamp()).map_err(|e| {
        DomainError::DateArithmeticOverflow {
            operation: format!("building instant for {date} {time_of_day}: {e}"),
        }
    })
}

/// The calendar day `instant` falls on in `tz`.
///
/// # Errors
///
/// Returns an error if the instant cannot be represented in `tz`.
pub fn local_date(instant: OffsetDateTime, tz: Tz) -> Result<Date, DomainError> {
    let overflow = || DomainError::DateArithmeticOverflow {
        operation: format!("finding the local day of {instant}"),
    };
    let local = tz
        .timestamp_opt(instant.unix_timestamp(), 0)
        .single()
        .ok_or_else(overflow)?;
    let naive: NaiveDate = local.date_naive();
    let month: Month = u8::try_from(naive.month())
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or_else(overflow)?;
    let day: u8 = u8::try_from(naive.day()).map_err(|_| overflow())?;
    Date::from_calendar_date(naive.year(), month, day).map_err(|_| overflow())
}

/// Returns the instant the shift is scheduled to begin.
///
/// # Errors
///
/// See [`resolve_local_instant`].
pub fn scheduled_instant(shift: &Shift, tz: Tz) -> Result<OffsetDateTime, DomainError> {
    resolve_local_instant(shift.scheduled_date, shift.scheduled_start_time, tz)
}

/// Time remaining until `instant`, negative once it has passed.
#[must_use]
pub fn time_until(instant: OffsetDateTime, now: OffsetDateTime) -> Duration {
    instant - now
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn test_utc_instant_matches_wall_clock() {
        let tz: Tz = parse_timezone("UTC").unwrap();
        let instant = resolve_local_instant(date!(2026 - 03 - 10), time!(11:00), tz).unwrap();
        assert_eq!(instant, datetime!(2026-03-10 11:00 UTC));
    }

    #[test]
    fn test_zoned_instant_is_converted_to_utc() {
        let tz: Tz = parse_timezone("Europe/Zagreb").unwrap();
        // CET is UTC+1 in winter
        let instant = resolve_local_instant(date!(2026 - 01 - 15), time!(10:00), tz).unwrap();
        assert_eq!(instant, datetime!(2026-01-15 09:00 UTC));
    }

    #[test]
    fn test_skipped_local_time_is_rejected() {
        let tz: Tz = parse_timezone("Europe/Zagreb").unwrap();
        // Clocks jump from 02:00 to 03:00 on the last Sunday of March
        let result = resolve_local_instant(date!(2026 - 03 - 29), time!(02:30), tz);
        assert!(matches!(result, Err(DomainError::AmbiguousLocalTime { .. })));
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        assert!(matches!(
            parse_timezone("Mars/Olympus"),
            Err(DomainError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_local_date_follows_the_zone() {
        let tz: Tz = parse_timezone("Europe/Zagreb").unwrap();
        let late_evening = datetime!(2026-03-09 23:30 UTC);
        assert_eq!(local_date(late_evening, tz).unwrap(), date!(2026 - 03 - 10));
        assert_eq!(local_date(late_evening, Tz::UTC).unwrap(), date!(2026 - 03 - 09));
    }

    #[test]
    fn test_time_until_is_negative_after_start() {
        let start = datetime!(2026-03-10 11:00 UTC);
        let now = datetime!(2026-03-10 12:30 UTC);
        assert_eq!(time_until(start, now), Duration::minutes(-90));
    }
}
