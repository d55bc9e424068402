// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod initialization_tests;
mod schedule_tests;
mod unavailability_tests;

use time::macros::{datetime, time};
use time::{Date, OffsetDateTime};
use turnover::{ShiftChange, TransitionResult, shift_snapshot};
use turnover_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use turnover_domain::{Apartment, Role, Shift, ShiftStatus};

use crate::{PersistedTransition, PersistenceError, SqlitePersistence};

pub const NOW: OffsetDateTime = datetime!(2026-03-01 09:00 UTC);

/// A database seeded with one user per role and two apartments.
pub struct Fixture {
    pub persistence: SqlitePersistence,
    pub admin_id: i64,
    pub owner_id: i64,
    pub operator_id: i64,
    pub other_operator_id: i64,
    pub apartment: Apartment,
    pub second_apartment: Apartment,
}

pub fn create_fixture() -> Fixture {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let admin_id: i64 = persistence
        .create_user(Role::Admin, "Ada Admin", "ada@example.com", NOW)
        .unwrap();
    let owner_id: i64 = persistence
        .create_user(Role::Owner, "Olga Owner", "olga@example.com", NOW)
        .unwrap();
    let operator_id: i64 = persistence
        .create_user(Role::Operator, "Otto Operator", "otto@example.com", NOW)
        .unwrap();
    let other_operator_id: i64 = persistence
        .create_user(Role::Operator, "Bea Busy", "bea@example.com", NOW)
        .unwrap();

    let apartment_id: i64 = persistence.create_apartment("Seaside 2B", owner_id).unwrap();
    let second_id: i64 = persistence.create_apartment("Harbour 7", owner_id).unwrap();
    let apartment: Apartment = persistence.get_apartment(apartment_id).unwrap().unwrap();
    let second_apartment: Apartment = persistence.get_apartment(second_id).unwrap().unwrap();

    Fixture {
        persistence,
        admin_id,
        owner_id,
        operator_id,
        other_operator_id,
        apartment,
        second_apartment,
    }
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("test-cause"), String::from("Test operation"))
}

pub fn create_test_shift(apartment_id: i64, operator_id: i64, created_by: i64, date: Date) -> Shift {
    Shift::new(
        apartment_id,
        operator_id,
        created_by,
        date,
        time!(11:00),
        Some(time!(14:00)),
        2,
        None,
    )
}

/// A transition result as the core would produce it for `change`.
pub fn transition(shift: Shift, change: ShiftChange, before: StateSnapshot) -> TransitionResult {
    let audit_event: AuditEvent = AuditEvent::new(
        shift.apartment_id,
        shift.shift_id,
        Actor::new(1, String::from("admin")),
        create_test_cause(),
        Action::new(format!("{change:?}"), None),
        before,
        shift_snapshot(&shift),
    );
    TransitionResult {
        shift,
        change,
        time_change: None,
        audit_event,
        notifications: Vec::new(),
    }
}

pub fn insert_shift(
    persistence: &mut SqlitePersistence,
    shift: Shift,
) -> Result<PersistedTransition, PersistenceError> {
    persistence.persist_transition(
        &transition(shift, ShiftChange::Created, StateSnapshot::absent()),
        NOW,
    )
}

pub fn save_shift(
    persistence: &mut SqlitePersistence,
    shift: Shift,
) -> Result<PersistedTransition, PersistenceError> {
    let before: StateSnapshot = shift_snapshot(&shift);
    persistence.persist_transition(&transition(shift, ShiftChange::Updated, before), NOW)
}

pub fn cancel_shift(persistence: &mut SqlitePersistence, shift_id: i64) {
    let mut shift: Shift = persistence.get_shift(shift_id).unwrap().unwrap();
    shift.status = ShiftStatus::Cancelled;
    save_shift(persistence, shift).unwrap();
}
