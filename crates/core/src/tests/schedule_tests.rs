// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::macros::datetime;
use time::{Month, OffsetDateTime};
use turnover_domain::{Apartment, Booking, DomainError, NotificationType, Role, StoredSchedule};

use crate::tests::helpers::{
    ADMIN_IDS, admin, create_test_apartment, create_test_cause, operator, owner,
};
use crate::{
    CoreError, ScheduleContext, ScheduleOutcome, ScheduleSubmission, ShiftActor, submit_schedule,
};

const NOW: OffsetDateTime = datetime!(2024-01-05 10:00 UTC);

fn first_booking() -> Booking {
    Booking::new(
        datetime!(2024-01-10 00:00 UTC),
        datetime!(2024-01-12 00:00 UTC),
        2,
    )
}

fn second_booking() -> Booking {
    Booking::new(
        datetime!(2024-01-20 00:00 UTC),
        datetime!(2024-01-22 00:00 UTC),
        4,
    )
}

fn submit(
    existing: &[Booking],
    bookings: Vec<Booking>,
    actor: ShiftActor,
    notify_admin: bool,
) -> Result<ScheduleOutcome, CoreError> {
    let apartment: Apartment = create_test_apartment();
    submit_schedule(
        &ScheduleContext {
            apartment: &apartment,
            existing,
            admin_ids: &ADMIN_IDS,
            now: NOW,
        },
        ScheduleSubmission {
            year: 2024,
            month: 1,
            bookings,
            notify_admin,
        },
        actor,
        create_test_cause(),
    )
}

#[test]
fn test_new_booking_notifies_admins_once_with_key() {
    let outcome: ScheduleOutcome = submit(
        &[first_booking()],
        vec![first_booking(), second_booking()],
        owner(),
        true,
    )
    .unwrap();

    assert_eq!(outcome.newly_added, vec![second_booking()]);
    assert_eq!(outcome.notifications.len(), ADMIN_IDS.len());
    let intent = &outcome.notifications[0];
    assert_eq!(
        intent.notification_type,
        NotificationType::CalendarUpdatedNewDays
    );
    let key = intent.dedup_key.unwrap();
    assert_eq!(key.apartment_id, 5);
    assert_eq!(key.year, 2024);
    assert_eq!(key.month, Month::January);
    assert_eq!(key.user_id, intent.user_id);
}

#[test]
fn test_resubmission_without_changes_notifies_nobody() {
    let outcome: ScheduleOutcome =
        submit(&[first_booking()], vec![first_booking()], owner(), true).unwrap();

    assert!(outcome.newly_added.is_empty());
    assert!(outcome.notifications.is_empty());
    assert_eq!(outcome.stored, StoredSchedule::Replace(vec![first_booking()]));
}

#[test]
fn test_removed_booking_sends_plain_update() {
    let outcome: ScheduleOutcome = submit(
        &[first_booking(), second_booking()],
        vec![first_booking()],
        owner(),
        true,
    )
    .unwrap();

    assert_eq!(
        outcome.notifications[0].notification_type,
        NotificationType::CalendarUpdated
    );
}

#[test]
fn test_empty_submission_deletes_schedule() {
    let outcome: ScheduleOutcome = submit(&[first_booking()], Vec::new(), owner(), false).unwrap();

    assert_eq!(outcome.stored, StoredSchedule::Delete);
    assert!(outcome.audit_event.after.is_absent());
}

#[test]
fn test_malformed_bookings_are_dropped() {
    let inverted: Booking = Booking::new(
        datetime!(2024-01-12 00:00 UTC),
        datetime!(2024-01-10 00:00 UTC),
        2,
    );
    let outcome: ScheduleOutcome = submit(&[], vec![inverted], owner(), true).unwrap();

    assert_eq!(outcome.stored, StoredSchedule::Delete);
    assert!(outcome.notifications.is_empty());
}

#[test]
fn test_admin_submission_does_not_notify_admins() {
    let outcome: ScheduleOutcome = submit(&[], vec![second_booking()], admin(), true).unwrap();
    assert_eq!(outcome.newly_added.len(), 1);
    assert!(outcome.notifications.is_empty());
}

#[test]
fn test_operator_cannot_submit() {
    let result = submit(&[], vec![first_booking()], operator(), false);
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(DomainError::Forbidden { .. }))
    ));
}

#[test]
fn test_owner_of_other_apartment_cannot_submit() {
    let result = submit(
        &[],
        vec![first_booking()],
        ShiftActor::new(99, Role::Owner),
        false,
    );
    assert!(result.is_err());
}
