// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Text encodings for temporal columns.
//!
//! Dates are `YYYY-MM-DD` and times of day `HH:MM`, so equality and
//! ordering on the text columns match the calendar. Instants are RFC 3339
//! normalized to UTC for the same reason.

use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time, UtcOffset};

use crate::error::PersistenceError;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");

pub fn encode_date(date: Date) -> Result<String, PersistenceError> {
    Ok(date.format(DATE_FORMAT)?)
}

pub fn decode_date(value: &str) -> Result<Date, PersistenceError> {
    Ok(Date::parse(value, DATE_FORMAT)?)
}

pub fn encode_time(time: Time) -> Result<String, PersistenceError> {
    Ok(time.format(TIME_FORMAT)?)
}

pub fn decode_time(value: &str) -> Result<Time, PersistenceError> {
    Ok(Time::parse(value, TIME_FORMAT)?)
}

pub fn encode_instant(instant: OffsetDateTime) -> Result<String, PersistenceError> {
    Ok(instant.to_offset(UtcOffset::UTC).format(&Rfc3339)?)
}

/// Encodes an instant keeping its offset.
pub fn encode_instant_with_offset(instant: OffsetDateTime) -> Result<String, PersistenceError> {
    Ok(instant.format(&Rfc3339)?)
}

pub fn decode_instant(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    Ok(OffsetDateTime::parse(value, &Rfc3339)?)
}

pub fn encode_optional_instant(
    instant: Option<OffsetDateTime>,
) -> Result<Option<String>, PersistenceError> {
    instant.map(encode_instant).transpose()
}

pub fn decode_optional_instant(
    value: Option<&str>,
) -> Result<Option<OffsetDateTime>, PersistenceError> {
    value.map(decode_instant).transpose()
}

/// Converts a domain enum parse failure into a persistence error.
pub fn corrupt<E: std::fmt::Display>(column: &str) -> impl FnOnce(E) -> PersistenceError + '_ {
    move |e| PersistenceError::SerializationError(format!("{column}: {e}"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use time::macros::{date, datetime, time};

    use super::*;

    #[test]
    fn test_instants_are_stored_in_utc() {
        let encoded: String = encode_instant(datetime!(2024-01-10 23:30 -2)).unwrap();
        assert_eq!(encoded, "2024-01-11T01:30:00Z");
        assert_eq!(
            decode_instant(&encoded).unwrap(),
            datetime!(2024-01-11 01:30 UTC)
        );
    }

    #[test]
    fn test_dates_and_times_sort_as_text() {
        assert_eq!(encode_date(date!(2026 - 03 - 09)).unwrap(), "2026-03-09");
        assert_eq!(encode_time(time!(7:05)).unwrap(), "07:05");
        assert_eq!(decode_time("07:05").unwrap(), time!(7:05));
    }
}
