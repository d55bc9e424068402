// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::{Date, OffsetDateTime, Time};

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The actor's role or ownership does not permit touching this field or action.
    Forbidden {
        /// The field or action that was attempted.
        field: String,
        /// Why the attempt is not permitted.
        reason: String,
    },
    /// Guest count must be at least one.
    InvalidGuestCount(i64),
    /// An end time is not after its start time.
    InvalidTimeRange {
        /// The start value, formatted.
        start: String,
        /// The end value, formatted.
        end: String,
    },
    /// Month must be between 1 and 12.
    InvalidMonth(u8),
    /// Year is outside the supported range.
    InvalidYear(i32),
    /// Failed to parse a date or time from a string.
    DateParseError {
        /// The invalid input string.
        date_string: String,
        /// The parsing error message.
        error: String,
    },
    /// A required text field is empty after trimming.
    EmptyText {
        /// The field name.
        field: &'static str,
    },
    /// Role string is not recognized.
    InvalidRole(String),
    /// Shift status string is not recognized.
    InvalidShiftStatus(String),
    /// Notification type string is not recognized.
    InvalidNotificationType(String),
    /// Problem kind string is not recognized.
    InvalidProblemKind(String),
    /// Time-change status string is not recognized.
    InvalidTimeChangeStatus(String),
    /// Timezone name is not a known IANA zone.
    InvalidTimezone(String),
    /// A local wall-clock time does not map to exactly one instant.
    AmbiguousLocalTime {
        /// The scheduled date.
        date: Date,
        /// The scheduled time.
        time: Time,
    },
    /// Date arithmetic overflowed.
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
    /// The operator already has a started, unfinished shift.
    ConflictingActiveShift {
        /// The operator.
        operator_id: i64,
    },
    /// Actual start precedes the scheduled instant.
    StartBeforeScheduled {
        /// The scheduled instant.
        scheduled: OffsetDateTime,
        /// The attempted start.
        attempted: OffsetDateTime,
    },
    /// Actual end is set too close to actual start, or without one.
    MinimumDurationNotMet {
        /// The required minimum, in minutes.
        required_minutes: i64,
        /// The measured duration in minutes, if a start exists.
        actual_minutes: Option<i64>,
    },
    /// The shift's scheduled instant has already passed.
    ShiftAlreadyStarted,
    /// The operator already holds the daily maximum of shifts.
    OperatorDailyLimitExceeded {
        /// The operator.
        operator_id: i64,
        /// The date in question.
        date: Date,
        /// The configured limit.
        limit: u32,
    },
    /// The apartment already has a non-cancelled shift on that date.
    ApartmentAlreadyBooked {
        /// The apartment.
        apartment_id: i64,
        /// The date in question.
        date: Date,
    },
    /// Shift does not exist.
    ShiftNotFound(i64),
    /// Apartment does not exist.
    ApartmentNotFound(i64),
    /// User does not exist.
    UserNotFound(i64),
    /// Notification does not exist.
    NotificationNotFound(i64),
    /// A time-change request must change at least one field.
    NoChangesRequested,
    /// A live time-change request already exists for the shift.
    TimeChangeRequestAlreadyOpen {
        /// The shift.
        shift_id: i64,
    },
    /// The shift has no live time-change request.
    NoOpenTimeChangeRequest {
        /// The shift.
        shift_id: i64,
    },
    /// The party has already given its answer on this request.
    TimeChangeAlreadyDecided {
        /// The existing decision.
        decision: String,
    },
    /// Requests may no longer be opened this close to the shift.
    RequestWindowClosed {
        /// The cutoff before start, in minutes.
        cutoff_minutes: i64,
    },
    /// Unavailability status string is not recognized.
    InvalidUnavailabilityStatus(String),
    /// Comment does not exist on the shift.
    CommentNotFound {
        /// The shift.
        shift_id: i64,
        /// The comment.
        comment_id: i64,
    },
    /// Unavailability request does not exist.
    UnavailabilityRequestNotFound(i64),
    /// An unavailability request must name at least one day.
    NoDatesRequested,
    /// Unavailability may only be requested for today or later.
    PastDateRequested {
        /// The offending day.
        date: Date,
    },
    /// The unavailability request has already been reviewed.
    UnavailabilityAlreadyReviewed {
        /// The existing decision.
        decision: String,
    },
    /// The requested status transition is not allowed.
    InvalidStatusTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
        /// Why the transition is not allowed.
        reason: String,
    },
}

impl std::fmt::Display for DomainError {
    #[allow(clippy::too_many_lines)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden { field, reason } => write!(f, "Forbidden to change '{field}': {reason}"),
            Self::InvalidGuestCount(count) => {
                write!(f, "Invalid guest count: {count}. Must be at least 1")
            }
            Self::InvalidTimeRange { start, end } => {
                write!(f, "End {end} must be after start {start}")
            }
            Self::InvalidMonth(month) => {
                write!(f, "Invalid month: {month}. Must be between 1 and 12")
            }
            Self::InvalidYear(year) => write!(f, "Invalid year: {year}"),
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse '{date_string}': {error}")
            }
            Self::EmptyText { field } => write!(f, "Field '{field}' must not be empty"),
            Self::InvalidRole(msg) => write!(f, "Invalid role: {msg}"),
            Self::InvalidShiftStatus(msg) => write!(f, "Invalid shift status: {msg}"),
            Self::InvalidNotificationType(msg) => write!(f, "Invalid notification type: {msg}"),
            Self::InvalidProblemKind(msg) => {
                write!(f, "Invalid problem type: {msg}. Must be 'issue' or 'forgotten_item'")
            }
            Self::InvalidTimeChangeStatus(msg) => write!(f, "Invalid time change status: {msg}"),
            Self::InvalidTimezone(tz) => write!(f, "Invalid timezone: {tz}"),
            Self::AmbiguousLocalTime { date, time } => {
                write!(
                    f,
                    "Local time {date} {time} is ambiguous or does not exist in the configured timezone"
                )
            }
            Self::DateArithmeticOverflow { operation } => {
                write!(f, "Date arithmetic overflow while {operation}")
            }
            Self::ConflictingActiveShift { operator_id } => {
                write!(
                    f,
                    "Operator {operator_id} already has an active shift. Finish it before starting another"
                )
            }
            Self::StartBeforeScheduled {
                scheduled,
                attempted,
            } => {
                write!(
                    f,
                    "Cannot start at {attempted}: shift is scheduled to start at {scheduled}"
                )
            }
            Self::MinimumDurationNotMet {
                required_minutes,
                actual_minutes,
            } => match actual_minutes {
                Some(actual) => write!(
                    f,
                    "Shift must last at least {required_minutes} minutes, but lasted {actual}"
                ),
                None => write!(f, "Cannot finish a shift that has not been started"),
            },
            Self::ShiftAlreadyStarted => {
                write!(f, "Cannot edit shift. The shift has already started")
            }
            Self::OperatorDailyLimitExceeded {
                operator_id,
                date,
                limit,
            } => {
                write!(
                    f,
                    "Operator {operator_id} already has {limit} shifts on {date}"
                )
            }
            Self::ApartmentAlreadyBooked { apartment_id, date } => {
                write!(
                    f,
                    "Apartment {apartment_id} already has a cleaning shift on {date}"
                )
            }
            Self::ShiftNotFound(id) => write!(f, "Shift {id} not found"),
            Self::ApartmentNotFound(id) => write!(f, "Apartment {id} not found"),
            Self::UserNotFound(id) => write!(f, "User {id} not found"),
            Self::NotificationNotFound(id) => write!(f, "Notification {id} not found"),
            Self::NoChangesRequested => {
                write!(f, "At least one field must differ from the current shift")
            }
            Self::TimeChangeRequestAlreadyOpen { shift_id } => {
                write!(f, "Shift {shift_id} already has a pending time change request")
            }
            Self::NoOpenTimeChangeRequest { shift_id } => {
                write!(f, "Shift {shift_id} has no pending time change request")
            }
            Self::TimeChangeAlreadyDecided { decision } => {
                write!(f, "Time change request was already {decision}")
            }
            Self::RequestWindowClosed { cutoff_minutes } => {
                write!(
                    f,
                    "Time change requests close {cutoff_minutes} minutes before the shift starts"
                )
            }
            Self::InvalidUnavailabilityStatus(msg) => {
                write!(f, "Invalid unavailability status: {msg}")
            }
            Self::CommentNotFound {
                shift_id,
                comment_id,
            } => write!(f, "Comment {comment_id} not found on shift {shift_id}"),
            Self::UnavailabilityRequestNotFound(id) => {
                write!(f, "Unavailability request {id} not found")
            }
            Self::NoDatesRequested => write!(f, "At least one date is required"),
            Self::PastDateRequested { date } => {
                write!(f, "Cannot request unavailability for past date {date}")
            }
            Self::UnavailabilityAlreadyReviewed { decision } => {
                write!(f, "Unavailability request was already {decision}")
            }
            Self::InvalidStatusTransition { from, to, reason } => {
                write!(f, "Cannot transition from '{from}' to '{to}': {reason}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
