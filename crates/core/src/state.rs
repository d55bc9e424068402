// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::{Date, OffsetDateTime};
use turnover_audit::{Actor, AuditEvent, StateSnapshot};
use turnover_domain::{
    Apartment, InstructionPhoto, Role, Shift, ShiftComment, ShiftPatch, ShiftProblem,
    TimeChangeRequest,
};

use crate::notify::NotificationIntent;

/// The identity a decision is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftActor {
    pub user_id: i64,
    pub role: Role,
}

impl ShiftActor {
    /// Creates a new `ShiftActor`.
    #[must_use]
    pub const fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    /// The audit form of this actor.
    #[must_use]
    pub fn to_audit_actor(self) -> Actor {
        Actor::new(self.user_id, self.role.as_str().to_string())
    }
}

/// Existing bookings that collide with a shift's target slot.
///
/// Counts exclude the shift being edited and every cancelled shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShiftConflicts {
    /// Another shift holds the target apartment on the target date.
    pub apartment_taken: bool,
    /// Shifts the target operator already holds on the target date.
    pub operator_count: u32,
    /// The target operator has a started, unfinished shift elsewhere.
    pub operator_active: bool,
}

/// The apartment, operator and date a shift would occupy once a patch is
/// applied. This is what conflicts must be looked up against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftTargets {
    pub apartment_id: i64,
    pub operator_id: i64,
    pub date: Date,
}

impl ShiftTargets {
    /// Targets of `shift` after applying `patch`.
    #[must_use]
    pub fn after(shift: &Shift, patch: &ShiftPatch) -> Self {
        Self {
            apartment_id: patch.apartment_id.unwrap_or(shift.apartment_id),
            operator_id: patch.operator_id.unwrap_or(shift.operator_id),
            date: patch.scheduled_date.unwrap_or(shift.scheduled_date),
        }
    }

    /// Targets of a time-change request, falling back to the shift.
    #[must_use]
    pub fn of_request(shift: &Shift, request: &TimeChangeRequest) -> Self {
        Self::after(shift, &request.draft.to_patch())
    }
}

/// Everything a transition reads besides the command itself.
#[derive(Debug, Clone, Copy)]
pub struct ShiftContext<'a> {
    /// The shift being acted on; `None` only when creating one.
    pub shift: Option<&'a Shift>,
    /// The apartment the shift belongs to (or will belong to).
    pub apartment: &'a Apartment,
    pub conflicts: ShiftConflicts,
    /// Users holding the admin role, for fan-out notifications.
    pub admin_ids: &'a [i64],
    pub now: OffsetDateTime,
}

/// What kind of write the caller has to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftChange {
    Created,
    Updated,
    Deleted,
    CommentAdded(ShiftComment),
    /// The id of the removed comment.
    CommentDeleted(i64),
    ProblemReported(ShiftProblem),
    PhotoAdded(InstructionPhoto),
}

/// The result of a successful transition.
///
/// Transitions are atomic: they either succeed completely or fail without
/// side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The shift after the transition.
    pub shift: Shift,
    pub change: ShiftChange,
    /// The request created or answered by this transition, open or closed.
    pub time_change: Option<TimeChangeRequest>,
    pub audit_event: AuditEvent,
    pub notifications: Vec<NotificationIntent>,
}

/// Compact textual view of a shift for audit snapshots.
#[must_use]
pub fn shift_snapshot(shift: &Shift) -> StateSnapshot {
    StateSnapshot::new(format!(
        "apartment={},operator={},date={},start={},end={},status={},guests={},started={},finished={}",
        shift.apartment_id,
        shift.operator_id,
        shift.scheduled_date,
        shift.scheduled_start_time,
        shift
            .scheduled_end_time
            .map_or_else(|| String::from("-"), |t| t.to_string()),
        shift.status,
        shift.guest_count,
        shift.actual_start_time.is_some(),
        shift.actual_end_time.is_some(),
    ))
}
