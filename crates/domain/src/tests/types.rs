// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::str::FromStr;
use time::macros::{date, datetime, time};

use crate::{
    DomainError, NotificationType, ProblemKind, Role, Shift, ShiftField, ShiftPatch, ShiftStatus,
};

fn create_test_shift() -> Shift {
    Shift::new(
        1,
        10,
        100,
        date!(2026 - 03 - 10),
        time!(11:00),
        None,
        2,
        Some(String::from("key under mat")),
    )
}

#[test]
fn test_new_shift_is_scheduled() {
    let shift: Shift = create_test_shift();
    assert_eq!(shift.status, ShiftStatus::Scheduled);
    assert_eq!(shift.shift_id, None);
    assert!(!shift.confirmed_seen.confirmed);
    assert!(!shift.is_active());
}

#[test]
fn test_shift_is_active_between_start_and_end() {
    let mut shift: Shift = create_test_shift();
    shift.actual_start_time = Some(datetime!(2026-03-10 11:05 UTC));
    assert!(shift.is_active());
    shift.actual_end_time = Some(datetime!(2026-03-10 12:30 UTC));
    assert!(!shift.is_active());
}

#[test]
fn test_role_parsing_is_case_insensitive() {
    assert_eq!(Role::from_str("Admin").unwrap(), Role::Admin);
    assert_eq!(Role::from_str("operator").unwrap(), Role::Operator);
    assert!(matches!(
        Role::from_str("cleaner"),
        Err(DomainError::InvalidRole(_))
    ));
}

#[test]
fn test_status_strings_round_trip() {
    for status in [
        ShiftStatus::Scheduled,
        ShiftStatus::InProgress,
        ShiftStatus::Completed,
        ShiftStatus::Cancelled,
    ] {
        assert_eq!(ShiftStatus::from_str(status.as_str()).unwrap(), status);
    }
}

#[test]
fn test_unknown_notification_type_is_rejected() {
    assert_eq!(
        NotificationType::from_str("calendar_updated_new_days").unwrap(),
        NotificationType::CalendarUpdatedNewDays
    );
    assert!(NotificationType::from_str("shift_exploded").is_err());
}

#[test]
fn test_problem_kind_parsing() {
    assert_eq!(
        ProblemKind::from_str("forgotten_item").unwrap(),
        ProblemKind::ForgottenItem
    );
    assert!(ProblemKind::from_str("broken").is_err());
}

#[test]
fn test_effective_patch_drops_unchanged_values() {
    let shift: Shift = create_test_shift();
    let patch: ShiftPatch = ShiftPatch {
        apartment_id: Some(1),
        scheduled_start_time: Some(time!(11:00)),
        guest_count: Some(4),
        notes: Some(String::from("key under mat")),
        ..ShiftPatch::default()
    };

    let effective: ShiftPatch = patch.effective_against(&shift);

    assert_eq!(effective.fields(), vec![ShiftField::GuestCount]);
    assert!(!effective.changes_schedule());
}

#[test]
fn test_apply_patch_writes_present_fields() {
    let mut shift: Shift = create_test_shift();
    let patch: ShiftPatch = ShiftPatch {
        operator_id: Some(11),
        scheduled_end_time: Some(time!(15:00)),
        ..ShiftPatch::default()
    };

    shift.apply_patch(&patch);

    assert_eq!(shift.operator_id, 11);
    assert_eq!(shift.scheduled_end_time, Some(time!(15:00)));
    assert_eq!(shift.scheduled_start_time, time!(11:00));
    assert!(patch.changes_operator());
    assert!(patch.changes_schedule());
}
