// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::macros::format_description;
use time::{Date, Month, Time};

use crate::error::DomainError;

/// Maximum characters of user text quoted inside a notification.
pub const NOTIFICATION_EXCERPT_CHARS: usize = 100;

/// Validates that a guest count is at least one.
///
/// # Errors
///
/// Returns `DomainError::InvalidGuestCount` if the count is below one or
/// does not fit.
pub fn validate_guest_count(count: i64) -> Result<u32, DomainError> {
    if count < 1 {
        return Err(DomainError::InvalidGuestCount(count));
    }
    u32::try_from(count).map_err(|_| DomainError::InvalidGuestCount(count))
}

/// Validates that `end` is strictly after `start`.
///
/// # Errors
///
/// Returns `DomainError::InvalidTimeRange` otherwise.
pub fn validate_time_range(start: Time, end: Time) -> Result<(), DomainError> {
    if end <= start {
        return Err(DomainError::InvalidTimeRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(())
}

/// Converts a 1-based month number.
///
/// # Errors
///
/// Returns `DomainError::InvalidMonth` outside 1..=12.
pub fn validate_month(month: u8) -> Result<Month, DomainError> {
    Month::try_from(month).map_err(|_| DomainError::InvalidMonth(month))
}

/// Trims free text and rejects it when nothing is left.
///
/// # Errors
///
/// Returns `DomainError::EmptyText` for blank input.
pub fn normalize_text(field: &'static str, text: &str) -> Result<String, DomainError> {
    let trimmed: &str = text.trim();
    if trimmed.is_empty() {
        return Err(DomainError::EmptyText { field });
    }
    Ok(trimmed.to_string())
}

/// Shortens text for quoting in a notification message.
#[must_use]
pub fn excerpt(text: &str) -> String {
    if text.chars().count() <= NOTIFICATION_EXCERPT_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(NOTIFICATION_EXCERPT_CHARS).collect();
    short.push_str("...");
    short
}

/// Parses a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the string is not a valid date.
pub fn parse_date(value: &str) -> Result<Date, DomainError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|e| {
        DomainError::DateParseError {
            date_string: value.to_string(),
            error: e.to_string(),
        }
    })
}

/// Parses an `HH:MM` time of day.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the string is not a valid time.
pub fn parse_time_of_day(value: &str) -> Result<Time, DomainError> {
    Time::parse(value, format_description!("[hour]:[minute]")).map_err(|e| {
        DomainError::DateParseError {
            date_string: value.to_string(),
            error: e.to_string(),
        }
    })
}
