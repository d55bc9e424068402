// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::Month;
use time::macros::datetime;
use turnover::{ScheduleContext, ScheduleOutcome, ScheduleSubmission, ShiftActor, submit_schedule};
use turnover_audit::AuditEvent;
use turnover_domain::{Booking, Role};

use super::{Fixture, NOW, create_fixture, create_test_cause};

fn create_test_booking() -> Booking {
    Booking::new(
        datetime!(2026-03-12 15:00 +1),
        datetime!(2026-03-15 10:00 +1),
        2,
    )
}

fn submit(fixture: &mut Fixture, bookings: Vec<Booking>) -> (ScheduleOutcome, i64) {
    let apartment_id: i64 = fixture.apartment.apartment_id;
    let existing: Vec<Booking> = fixture
        .persistence
        .get_schedule(apartment_id, 2026, Month::March)
        .unwrap();
    let admin_ids: Vec<i64> = fixture.persistence.list_admin_ids().unwrap();
    let outcome: ScheduleOutcome = submit_schedule(
        &ScheduleContext {
            apartment: &fixture.apartment,
            existing: &existing,
            admin_ids: &admin_ids,
            now: NOW,
        },
        ScheduleSubmission {
            year: 2026,
            month: 3,
            bookings,
            notify_admin: true,
        },
        ShiftActor::new(fixture.owner_id, Role::Owner),
        create_test_cause(),
    )
    .unwrap();
    let event_id: i64 = fixture
        .persistence
        .persist_schedule(apartment_id, &outcome, NOW)
        .unwrap();
    (outcome, event_id)
}

#[test]
fn test_missing_schedule_reads_as_empty() {
    let mut fixture: Fixture = create_fixture();
    let bookings: Vec<Booking> = fixture
        .persistence
        .get_schedule(fixture.apartment.apartment_id, 2026, Month::March)
        .unwrap();
    assert!(bookings.is_empty());
}

#[test]
fn test_bookings_keep_their_submitted_offset() {
    let mut fixture: Fixture = create_fixture();
    let booking: Booking = create_test_booking();
    let _ = submit(&mut fixture, vec![booking]);

    let stored: Vec<Booking> = fixture
        .persistence
        .get_schedule(fixture.apartment.apartment_id, 2026, Month::March)
        .unwrap();

    assert_eq!(stored, vec![booking]);
    assert_eq!(stored[0].check_in.offset(), booking.check_in.offset());
}

#[test]
fn test_resubmission_adds_nothing_new() {
    let mut fixture: Fixture = create_fixture();
    let (first, _) = submit(&mut fixture, vec![create_test_booking()]);
    let (second, _) = submit(&mut fixture, vec![create_test_booking()]);

    assert_eq!(first.newly_added.len(), 1);
    assert_eq!(first.notifications.len(), 1);
    assert_eq!(first.notifications[0].user_id, fixture.admin_id);
    assert!(second.newly_added.is_empty());
    assert!(second.notifications.is_empty());
}

#[test]
fn test_empty_submission_deletes_schedule() {
    let mut fixture: Fixture = create_fixture();
    let _ = submit(&mut fixture, vec![create_test_booking()]);
    let (outcome, _) = submit(&mut fixture, Vec::new());

    let stored: Vec<Booking> = fixture
        .persistence
        .get_schedule(fixture.apartment.apartment_id, 2026, Month::March)
        .unwrap();
    assert!(stored.is_empty());
    assert!(outcome.audit_event.after.is_absent());
}

#[test]
fn test_schedules_are_per_month_and_apartment() {
    let mut fixture: Fixture = create_fixture();
    let booking: Booking = create_test_booking();
    fixture
        .persistence
        .replace_schedule(fixture.apartment.apartment_id, 2026, Month::April, &[booking], NOW)
        .unwrap();

    assert!(fixture
        .persistence
        .get_schedule(fixture.apartment.apartment_id, 2026, Month::March)
        .unwrap()
        .is_empty());
    assert!(fixture
        .persistence
        .get_schedule(fixture.second_apartment.apartment_id, 2026, Month::April)
        .unwrap()
        .is_empty());

    fixture
        .persistence
        .delete_schedule(fixture.apartment.apartment_id, 2026, Month::April)
        .unwrap();
    assert!(fixture
        .persistence
        .get_schedule(fixture.apartment.apartment_id, 2026, Month::April)
        .unwrap()
        .is_empty());
}

#[test]
fn test_schedule_submission_is_audited() {
    let mut fixture: Fixture = create_fixture();
    let (_, event_id) = submit(&mut fixture, vec![create_test_booking()]);

    let event: AuditEvent = fixture.persistence.get_audit_event(event_id).unwrap();

    assert_eq!(event.action.name, "SubmitSchedule");
    assert_eq!(event.apartment_id, fixture.apartment.apartment_id);
    assert_eq!(event.shift_id, None);
    assert!(event.before.is_absent());
    assert_eq!(event.after.data, "bookings=1");
}
