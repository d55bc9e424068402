// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Guest bookings, monthly cleaning schedules and booking reconciliation.
//!
//! An owner submits the full list of bookings for one apartment and one
//! month. The submission replaces whatever was stored before. The
//! reconciler compares the two sets under a normalized key to find the
//! bookings that are genuinely new, which in turn drive notifications.

use std::collections::HashSet;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::error::DomainError;

/// A guest stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Booking {
    pub check_in: OffsetDateTime,
    pub check_out: OffsetDateTime,
    pub guest_count: u32,
}

impl Booking {
    /// Creates a new `Booking`.
    #[must_use]
    pub const fn new(check_in: OffsetDateTime, check_out: OffsetDateTime, guest_count: u32) -> Self {
        Self {
            check_in,
            check_out,
            guest_count,
        }
    }

    /// True when the booking is worth storing at all.
    ///
    /// Bookings with no guests or with a checkout not after check-in are
    /// dropped from a submission before reconciliation.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.guest_count >= 1 && self.check_out > self.check_in
    }

    /// Occupancy for editing purposes: check-in day up to, but excluding,
    /// the checkout day, which stays free for a back-to-back arrival.
    #[must_use]
    pub fn covers_for_editing(&self, day: Date) -> bool {
        match (utc_day(self.check_in), utc_day(self.check_out)) {
            (Ok(check_in), Ok(check_out)) => check_in <= day && day < check_out,
            _ => false,
        }
    }

    /// Occupancy for display purposes: the checkout day is included and
    /// rendered as a distinct departure marker.
    #[must_use]
    pub fn covers_for_display(&self, day: Date) -> bool {
        match (utc_day(self.check_in), utc_day(self.check_out)) {
            (Ok(check_in), Ok(check_out)) => check_in <= day && day <= check_out,
            _ => false,
        }
    }

    /// True if `day` is this booking's checkout day.
    #[must_use]
    pub fn is_checkout_day(&self, day: Date) -> bool {
        utc_day(self.check_out).is_ok_and(|check_out| check_out == day)
    }
}

/// Normalized identity of a booking: UTC check-in day, UTC checkout day
/// and guest count. Time of day is deliberately discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookingKey {
    pub check_in_day: Date,
    pub check_out_day: Date,
    pub guest_count: u32,
}

impl std::fmt::Display for BookingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.check_in_day, self.check_out_day, self.guest_count
        )
    }
}

/// Truncates an instant to its UTC calendar day.
fn utc_day(instant: OffsetDateTime) -> Result<Date, DomainError> {
    instant
        .checked_to_offset(UtcOffset::UTC)
        .map(OffsetDateTime::date)
        .ok_or_else(|| DomainError::DateArithmeticOverflow {
            operation: format!("normalizing {instant} to UTC"),
        })
}

/// Computes the normalized key of a booking.
///
/// # Errors
///
/// Returns an error if either instant cannot be represented in UTC.
pub fn booking_key(booking: &Booking) -> Result<BookingKey, DomainError> {
    Ok(BookingKey {
        check_in_day: utc_day(booking.check_in)?,
        check_out_day: utc_day(booking.check_out)?,
        guest_count: booking.guest_count,
    })
}

/// What should happen to the stored schedule after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredSchedule {
    /// Replace the stored bookings with exactly these.
    Replace(Vec<Booking>),
    /// The submission was empty; remove the schedule entirely.
    Delete,
}

/// Result of reconciling a submission against the stored bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub stored: StoredSchedule,
    pub newly_added: Vec<Booking>,
}

/// Reconciles a submitted booking list against the existing one.
///
/// The submission is authoritative: it is stored verbatim, and an empty
/// submission deletes the schedule. A submitted booking is new when its
/// key is absent from the existing keys. A booking whose key cannot be
/// computed is treated as new, favouring a duplicate notification over a
/// lost one.
///
/// # Arguments
///
/// * `existing` - The bookings currently stored (empty when none)
/// * `submitted` - The bookings being submitted
#[must_use]
pub fn reconcile(existing: &[Booking], submitted: &[Booking]) -> Reconciliation {
    let existing_keys: HashSet<BookingKey> = existing
        .iter()
        .filter_map(|booking| booking_key(booking).ok())
        .collect();

    let newly_added: Vec<Booking> = submitted
        .iter()
        .filter(|booking| !booking_key(booking).is_ok_and(|key| existing_keys.contains(&key)))
        .copied()
        .collect();

    let stored: StoredSchedule = if submitted.is_empty() {
        StoredSchedule::Delete
    } else {
        StoredSchedule::Replace(submitted.to_vec())
    };

    Reconciliation {
        stored,
        newly_added,
    }
}
