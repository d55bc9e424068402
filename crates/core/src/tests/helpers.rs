// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::macros::{date, datetime, time};
use time::{Duration, OffsetDateTime};
use turnover_audit::Cause;
use turnover_domain::{Apartment, Role, Shift};

use crate::{ShiftActor, ShiftConflicts, ShiftContext};

pub const ADMIN_ID: i64 = 1;
pub const OWNER_ID: i64 = 2;
pub const OPERATOR_ID: i64 = 3;
pub const OTHER_OPERATOR_ID: i64 = 4;
pub const ADMIN_IDS: [i64; 1] = [ADMIN_ID];

/// Scheduled start of the test shift: 2026-03-10 11:00 UTC.
pub const SHIFT_START: OffsetDateTime = datetime!(2026-03-10 11:00 UTC);

pub fn admin() -> ShiftActor {
    ShiftActor::new(ADMIN_ID, Role::Admin)
}

pub fn owner() -> ShiftActor {
    ShiftActor::new(OWNER_ID, Role::Owner)
}

pub fn operator() -> ShiftActor {
    ShiftActor::new(OPERATOR_ID, Role::Operator)
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Test request"))
}

pub fn create_test_apartment() -> Apartment {
    Apartment::new(5, String::from("Seaside 2B"), OWNER_ID)
}

pub fn create_test_shift() -> Shift {
    Shift::new(
        5,
        OPERATOR_ID,
        ADMIN_ID,
        date!(2026 - 03 - 10),
        time!(11:00),
        Some(time!(14:00)),
        2,
        None,
    )
    .with_id(42)
}

/// An instant `hours` before the test shift starts.
pub fn hours_before_start(hours: i64) -> OffsetDateTime {
    SHIFT_START - Duration::hours(hours)
}

pub fn context<'a>(
    shift: Option<&'a Shift>,
    apartment: &'a Apartment,
    conflicts: ShiftConflicts,
    now: OffsetDateTime,
) -> ShiftContext<'a> {
    ShiftContext {
        shift,
        apartment,
        conflicts,
        admin_ids: &ADMIN_IDS,
        now,
    }
}
