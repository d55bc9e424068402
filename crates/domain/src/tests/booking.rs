// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::OffsetDateTime;
use time::macros::{date, datetime};

use crate::{Booking, BookingKey, StoredSchedule, booking_key, reconcile};

fn stay(check_in: OffsetDateTime, check_out: OffsetDateTime, guests: u32) -> Booking {
    Booking::new(check_in, check_out, guests)
}

#[test]
fn test_reconcile_same_set_adds_nothing() {
    let existing: Vec<Booking> = vec![
        stay(datetime!(2024-01-10 14:00 UTC), datetime!(2024-01-12 10:00 UTC), 2),
        stay(datetime!(2024-01-15 14:00 UTC), datetime!(2024-01-18 10:00 UTC), 3),
    ];

    let result = reconcile(&existing, &existing);

    assert!(result.newly_added.is_empty());
    assert_eq!(result.stored, StoredSchedule::Replace(existing));
}

#[test]
fn test_reconcile_reports_only_the_new_booking() {
    let existing: Vec<Booking> = vec![stay(
        datetime!(2024-01-10 00:00 UTC),
        datetime!(2024-01-12 00:00 UTC),
        2,
    )];
    let added: Booking = stay(
        datetime!(2024-01-20 00:00 UTC),
        datetime!(2024-01-22 00:00 UTC),
        4,
    );
    let submitted: Vec<Booking> = vec![existing[0], added];

    let result = reconcile(&existing, &submitted);

    assert_eq!(result.newly_added, vec![added]);
    assert_eq!(result.stored, StoredSchedule::Replace(submitted));
}

#[test]
fn test_reconcile_empty_submission_deletes_schedule() {
    let existing: Vec<Booking> = vec![stay(
        datetime!(2024-01-10 00:00 UTC),
        datetime!(2024-01-12 00:00 UTC),
        2,
    )];

    let result = reconcile(&existing, &[]);

    assert_eq!(result.stored, StoredSchedule::Delete);
    assert!(result.newly_added.is_empty());
}

#[test]
fn test_reconcile_ignores_time_of_day() {
    let existing: Vec<Booking> = vec![stay(
        datetime!(2024-01-10 09:00 UTC),
        datetime!(2024-01-12 09:00 UTC),
        2,
    )];
    let submitted: Vec<Booking> = vec![stay(
        datetime!(2024-01-10 16:30 UTC),
        datetime!(2024-01-12 11:00 UTC),
        2,
    )];

    assert!(reconcile(&existing, &submitted).newly_added.is_empty());
}

#[test]
fn test_reconcile_guest_count_change_is_new() {
    let existing: Vec<Booking> = vec![stay(
        datetime!(2024-01-10 00:00 UTC),
        datetime!(2024-01-12 00:00 UTC),
        2,
    )];
    let submitted: Vec<Booking> = vec![stay(
        datetime!(2024-01-10 00:00 UTC),
        datetime!(2024-01-12 00:00 UTC),
        5,
    )];

    assert_eq!(reconcile(&existing, &submitted).newly_added, submitted);
}

#[test]
fn test_booking_key_normalizes_to_utc_day() {
    // 23:30 at UTC-2 is already the next day in UTC
    let booking: Booking = stay(
        datetime!(2024-01-10 23:30 -2),
        datetime!(2024-01-12 08:00 -2),
        2,
    );

    let key: BookingKey = booking_key(&booking).unwrap();

    assert_eq!(key.check_in_day, date!(2024 - 01 - 11));
    assert_eq!(key.check_out_day, date!(2024 - 01 - 12));
    assert_eq!(key.to_string(), "2024-01-11|2024-01-12|2");
}

#[test]
fn test_editing_occupancy_excludes_checkout_day() {
    let booking: Booking = stay(
        datetime!(2024-01-10 14:00 UTC),
        datetime!(2024-01-12 10:00 UTC),
        2,
    );

    assert!(booking.covers_for_editing(date!(2024 - 01 - 10)));
    assert!(booking.covers_for_editing(date!(2024 - 01 - 11)));
    assert!(!booking.covers_for_editing(date!(2024 - 01 - 12)));
    assert!(!booking.covers_for_editing(date!(2024 - 01 - 09)));
}

#[test]
fn test_display_occupancy_includes_checkout_day() {
    let booking: Booking = stay(
        datetime!(2024-01-10 14:00 UTC),
        datetime!(2024-01-12 10:00 UTC),
        2,
    );

    assert!(booking.covers_for_display(date!(2024 - 01 - 12)));
    assert!(booking.is_checkout_day(date!(2024 - 01 - 12)));
    assert!(!booking.is_checkout_day(date!(2024 - 01 - 11)));
    assert!(!booking.covers_for_display(date!(2024 - 01 - 13)));
}

#[test]
fn test_malformed_bookings_are_detected() {
    let inverted: Booking = stay(
        datetime!(2024-01-12 00:00 UTC),
        datetime!(2024-01-10 00:00 UTC),
        2,
    );
    let empty: Booking = stay(
        datetime!(2024-01-10 00:00 UTC),
        datetime!(2024-01-12 00:00 UTC),
        0,
    );

    assert!(!inverted.is_well_formed());
    assert!(!empty.is_well_formed());
}

#[test]
fn test_reconcile_keeps_booking_without_a_key_as_new() {
    // 23:00 at UTC-5 on the last representable day is past year 9999 in UTC
    let unkeyable: Booking = stay(
        datetime!(9999-12-31 23:00 -5),
        datetime!(9999-12-31 23:30 -5),
        2,
    );
    let existing: Vec<Booking> = vec![unkeyable];
    let submitted: Vec<Booking> = vec![unkeyable];

    assert!(booking_key(&unkeyable).is_err());

    let result = reconcile(&existing, &submitted);

    assert_eq!(result.newly_added, vec![unkeyable]);
    assert_eq!(result.stored, StoredSchedule::Replace(submitted));
}
