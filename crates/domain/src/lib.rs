// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod booking;
mod error;
mod notification;
mod schedule;
mod time_change;
mod types;
mod unavailability;
mod validation;

#[cfg(test)]
mod tests;

pub use booking::{Booking, BookingKey, Reconciliation, StoredSchedule, booking_key, reconcile};
pub use error::DomainError;
pub use notification::{DedupKey, Notification, NotificationType};
pub use schedule::{
    local_date, parse_timezone, resolve_local_instant, scheduled_instant, time_until,
};
pub use time_change::{Resolution, TimeChangeDraft, TimeChangeRequest, TimeChangeStatus};

// Re-export public types
pub use types::{
    Apartment, ConfirmedSeen, InstructionPhoto, ProblemKind, Role, Shift, ShiftComment,
    ShiftField, ShiftPatch, ShiftProblem, ShiftStatus, User,
};
pub use unavailability::{UnavailabilityRequest, UnavailabilityStatus};
pub use validation::{
    NOTIFICATION_EXCERPT_CHARS, excerpt, normalize_text, parse_date, parse_time_of_day,
    validate_guest_count, validate_month, validate_time_range,
};
